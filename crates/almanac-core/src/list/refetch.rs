//! Rebuilding a list after a mutation.
//!
//! A refetch replays the last request for pages `1..=last_page`, strictly one
//! after another, merging every page into an accumulator. The page count is
//! the one recorded when the list was last loaded; if the underlying data
//! shrank in the meantime the final page may come back empty, and if it grew
//! the tail beyond that page is not fetched.

use async_trait::async_trait;
use jiff::tz::TimeZone;
use log::{debug, info};

use super::merge::merge;
use super::{ActiveFilter, ListRequest};
use crate::error::Result;
use crate::models::{DateGroup, Record};

/// Supplies pages to a [`RefetchCoordinator`].
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the records of the page named in `request`.
    async fn fetch_page(&self, request: &ListRequest) -> Result<Vec<Record>>;

    /// The list filter currently in effect.
    fn active_filter(&self) -> ActiveFilter;
}

/// How a refetch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RefetchOutcome {
    Completed(Vec<DateGroup>),
    /// The active filter changed while refetching; nothing should be applied
    Aborted,
}

impl RefetchOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, RefetchOutcome::Aborted)
    }

    /// The refetched groups; empty when aborted.
    pub fn into_groups(self) -> Vec<DateGroup> {
        match self {
            RefetchOutcome::Completed(groups) => groups,
            RefetchOutcome::Aborted => Vec::new(),
        }
    }
}

/// Refetches every loaded page of one list, once.
pub struct RefetchCoordinator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    request: ListRequest,
    time_zone: TimeZone,
}

impl<'a, S: PageSource + ?Sized> RefetchCoordinator<'a, S> {
    /// `request` is the list's last request; its page is the last page loaded.
    pub fn new(source: &'a S, request: ListRequest, time_zone: TimeZone) -> Self {
        Self {
            source,
            request,
            time_zone,
        }
    }

    /// Runs the refetch. Consumes the coordinator so it cannot be re-entered.
    pub async fn refetch_all(self) -> Result<RefetchOutcome> {
        let filter = self.request.filter();
        let last_page = self.request.page().max(1);
        let order = self.request.order();

        let mut groups: Vec<DateGroup> = Vec::new();
        let mut next_page = 1;
        loop {
            if self.context_changed(filter) {
                return Ok(RefetchOutcome::Aborted);
            }

            let page_request = self.request.with_page(next_page);
            let items = self.source.fetch_page(&page_request).await?;
            debug!("Refetched page {next_page} of {last_page}: {} record(s)", items.len());
            groups = merge(&groups, &items, &self.time_zone, order);

            next_page += 1;
            if last_page < next_page {
                break;
            }
        }

        if self.context_changed(filter) {
            return Ok(RefetchOutcome::Aborted);
        }
        Ok(RefetchOutcome::Completed(groups))
    }

    fn context_changed(&self, filter: ActiveFilter) -> bool {
        let active = self.source.active_filter();
        if active != filter {
            info!("Refetch of the {filter} list aborted: the {active} list is now active");
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::PlanningError;
    use crate::params::{CombinedSearch, PlanningSearch};
    use crate::test_support::{event_on, planning_on};

    struct ScriptedPages {
        pages: Vec<Vec<Record>>,
        requested: Mutex<Vec<u32>>,
        filter: Mutex<ActiveFilter>,
        switch_after: Option<usize>,
    }

    impl ScriptedPages {
        fn new(pages: Vec<Vec<Record>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
                filter: Mutex::new(ActiveFilter::Combined),
                switch_after: None,
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedPages {
        async fn fetch_page(&self, request: &ListRequest) -> Result<Vec<Record>> {
            let page = request.page();
            let count = {
                let mut requested = self.requested.lock().unwrap();
                requested.push(page);
                requested.len()
            };
            if self.switch_after == Some(count) {
                *self.filter.lock().unwrap() = ActiveFilter::Planning;
            }
            let index = usize::try_from(page).unwrap() - 1;
            self.pages.get(index).cloned().ok_or(PlanningError::Backend {
                status: Some(404),
                message: format!("no page {page}"),
            })
        }

        fn active_filter(&self) -> ActiveFilter {
            *self.filter.lock().unwrap()
        }
    }

    fn combined_at_page(page: u32) -> ListRequest {
        ListRequest::Combined(CombinedSearch {
            page,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_refetches_each_loaded_page_in_order() {
        let source = ScriptedPages::new(vec![
            vec![
                event_on("e1", "2024-01-01T09:00:00Z"),
                planning_on("p1", "2024-01-01T10:00:00Z"),
            ],
            vec![
                planning_on("p1", "2024-01-01T10:00:00Z"),
                planning_on("p2", "2024-01-02T10:00:00Z"),
            ],
            vec![
                event_on("e2", "2024-01-03T09:00:00Z"),
                event_on("e1", "2024-01-01T09:00:00Z"),
            ],
        ]);

        let outcome = RefetchCoordinator::new(&source, combined_at_page(3), TimeZone::UTC)
            .refetch_all()
            .await
            .unwrap();

        assert_eq!(source.requested(), vec![1, 2, 3]);
        let groups = outcome.into_groups();
        let ids: Vec<Vec<&str>> = groups
            .iter()
            .map(|group| group.items.iter().filter_map(Record::id).collect())
            .collect();
        assert_eq!(ids, vec![vec!["e1", "p1"], vec!["p2"], vec!["e2"]]);
    }

    #[tokio::test]
    async fn test_first_page_list_fetches_once() {
        let source = ScriptedPages::new(vec![vec![event_on("e1", "2024-01-01T09:00:00Z")]]);
        let outcome = RefetchCoordinator::new(&source, combined_at_page(1), TimeZone::UTC)
            .refetch_all()
            .await
            .unwrap();

        assert_eq!(source.requested(), vec![1]);
        assert_eq!(outcome.into_groups().len(), 1);
    }

    #[tokio::test]
    async fn test_aborts_without_fetching_when_filter_differs() {
        let source = ScriptedPages::new(vec![vec![]]);
        let request = ListRequest::Planning(PlanningSearch::default());

        let outcome = RefetchCoordinator::new(&source, request, TimeZone::UTC)
            .refetch_all()
            .await
            .unwrap();

        assert!(outcome.is_aborted());
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_aborts_when_filter_changes_mid_refetch() {
        let mut source = ScriptedPages::new(vec![
            vec![event_on("e1", "2024-01-01T09:00:00Z")],
            vec![event_on("e2", "2024-01-02T09:00:00Z")],
            vec![event_on("e3", "2024-01-03T09:00:00Z")],
        ]);
        source.switch_after = Some(2);

        let outcome = RefetchCoordinator::new(&source, combined_at_page(3), TimeZone::UTC)
            .refetch_all()
            .await
            .unwrap();

        assert_eq!(outcome, RefetchOutcome::Aborted);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_page_failure_propagates() {
        let source = ScriptedPages::new(vec![vec![event_on("e1", "2024-01-01T09:00:00Z")]]);
        let result = RefetchCoordinator::new(&source, combined_at_page(2), TimeZone::UTC)
            .refetch_all()
            .await;

        assert!(matches!(result, Err(PlanningError::Backend { status: Some(404), .. })));
    }
}
