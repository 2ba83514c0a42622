//! Search operations for the Planner.
//!
//! Every search caches the records it returns and, for planning items that
//! belong to an event, the linked events that are not cached yet.

use async_trait::async_trait;
use log::{debug, info};

use super::Planner;
use crate::{
    backend::SearchEndpoint,
    error::{PlanningError, Result},
    fetch::fetch_by_ids,
    list::{
        ActiveFilter, ListRequest, ListState,
        merge::{merge, set_groups},
        refetch::{PageSource, RefetchCoordinator, RefetchOutcome},
    },
    models::{DateGroup, ItemType, Planning, Record},
    params::{CombinedSearch, EventIds, PlanningSearch},
    query::{QueryPlan, combined, events, planning},
};

impl Planner {
    /// Runs a fresh combined search, replacing the list view.
    pub async fn search(&self, search: CombinedSearch) -> Result<Vec<DateGroup>> {
        self.replace_list(ListRequest::Combined(search)).await
    }

    /// Runs a fresh planning search, replacing the list view.
    pub async fn search_planning(&self, search: PlanningSearch) -> Result<Vec<DateGroup>> {
        self.replace_list(ListRequest::Planning(search)).await
    }

    /// Fetches the page after the last one loaded and merges it into the list.
    pub async fn load_more(&self) -> Result<Vec<DateGroup>> {
        let Some(last_request) = self.list_state().last_request else {
            return Err(PlanningError::invalid_input("list")
                .with_reason("no search has been run yet"));
        };

        let next = last_request.with_page(last_request.page().saturating_add(1));
        let items = self.fetch_page(&next).await?;
        info!("Loaded page {} with {} record(s)", next.page(), items.len());

        let groups = {
            let mut state = self.lock_state();
            state.groups = merge(&state.groups, &items, &self.config.time_zone, next.order());
            state.last_request = Some(next);
            state.groups.clone()
        };
        self.persist_state().await?;
        Ok(groups)
    }

    /// Reloads every page of the current list.
    ///
    /// Resolves with [`RefetchOutcome::Aborted`] and leaves the list alone if
    /// the active filter changed while refetching.
    pub async fn refetch(&self) -> Result<RefetchOutcome> {
        let Some(last_request) = self.list_state().last_request else {
            debug!("Nothing to refetch");
            return Ok(RefetchOutcome::Completed(Vec::new()));
        };

        let outcome =
            RefetchCoordinator::new(self, last_request, self.config.time_zone.clone())
                .refetch_all()
                .await?;

        if let RefetchOutcome::Completed(groups) = &outcome {
            self.lock_state().groups = groups.clone();
            self.persist_state().await?;
        }
        Ok(outcome)
    }

    /// Switches the list the user is looking at.
    pub async fn set_active_filter(&self, filter: ActiveFilter) -> Result<()> {
        self.lock_state().active_filter = filter;
        self.persist_state().await
    }

    /// Loads the planning items of the given events, in any state.
    pub async fn load_planning_by_event_ids(
        &self,
        event_ids: Vec<String>,
    ) -> Result<Vec<Planning>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.query_planning(&PlanningSearch::for_events(event_ids)).await?;
        self.remember(records.clone()).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match record {
                Record::Planning(planning) => Some(planning),
                Record::Event(_) => None,
            })
            .collect())
    }

    /// Queries planning items, splitting long event ID lists into batches.
    pub async fn query_planning(&self, search: &PlanningSearch) -> Result<Vec<Record>> {
        let context = self.query_context();
        match planning::build(search, &context) {
            QueryPlan::Search(request) => {
                self.backend.search(SearchEndpoint::Planning, &request).await
            }
            QueryPlan::MustChunk => {
                let ids: &[String] = match &search.event_ids {
                    Some(EventIds::Many(ids)) => ids.as_slice(),
                    _ => &[],
                };
                fetch_by_ids(ids, context.chunk_size, |batch| {
                    let search = PlanningSearch {
                        event_ids: Some(EventIds::Many(batch)),
                        ..search.clone()
                    };
                    let plan = planning::build(&search, &context);
                    async move {
                        match plan {
                            QueryPlan::Search(request) => {
                                self.backend.search(SearchEndpoint::Planning, &request).await
                            }
                            QueryPlan::MustChunk => Err(PlanningError::Configuration {
                                message: "event ID batch exceeds the chunk size".to_string(),
                            }),
                        }
                    }
                })
                .await
            }
        }
    }

    async fn replace_list(&self, request: ListRequest) -> Result<Vec<DateGroup>> {
        let items = self.fetch_page(&request).await?;
        info!(
            "Search on the {} list returned {} record(s)",
            request.filter(),
            items.len()
        );

        let groups = set_groups(&items, &self.config.time_zone, request.order());
        *self.lock_state() = ListState {
            active_filter: request.filter(),
            groups: groups.clone(),
            last_request: Some(request),
        };
        self.persist_state().await?;
        Ok(groups)
    }

    /// Fetches events referenced by planning items that are not cached yet.
    async fn fetch_linked_events(&self, records: &[Record]) -> Result<()> {
        let linked: Vec<String> = records
            .iter()
            .filter_map(Record::as_planning)
            .filter_map(|planning| planning.event_item.clone())
            .collect();
        if linked.is_empty() {
            return Ok(());
        }

        let missing = self
            .with_database(move |db| db.missing_ids(ItemType::Events, &linked))
            .await?;
        if missing.is_empty() {
            return Ok(());
        }

        debug!("Fetching {} linked event(s)", missing.len());
        let linked_events = fetch_by_ids(&missing, self.config.chunk_size, |batch| async move {
            self.backend
                .search(SearchEndpoint::Events, &events::by_ids(&batch))
                .await
        })
        .await?;
        self.store_records(linked_events).await
    }

    /// Caches records along with their linked events.
    pub(crate) async fn remember(&self, records: Vec<Record>) -> Result<()> {
        self.fetch_linked_events(&records).await?;
        self.store_records(records).await
    }

    async fn store_records(&self, records: Vec<Record>) -> Result<()> {
        let written = self
            .with_database(move |db| db.upsert_records(&records))
            .await?;
        debug!("Cached {written} record(s)");
        Ok(())
    }
}

#[async_trait]
impl PageSource for Planner {
    async fn fetch_page(&self, request: &ListRequest) -> Result<Vec<Record>> {
        let items = match request {
            ListRequest::Combined(search) => {
                let request = combined::build(search, &self.query_context());
                self.backend.search(SearchEndpoint::Combined, &request).await?
            }
            ListRequest::Planning(search) => self.query_planning(search).await?,
        };
        self.remember(items.clone()).await?;
        Ok(items)
    }

    fn active_filter(&self) -> ActiveFilter {
        self.lock_state().active_filter
    }
}
