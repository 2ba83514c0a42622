//! Planning item operations for the Planner.

use futures::future::{join, join_all};
use log::{debug, info, warn};
use serde_json::{Value, json};

use super::Planner;
use crate::{
    error::{PlanningError, Result},
    list::merge::{remove_record, upsert_record},
    models::{
        AgendaRef, Coverage, GroupOrder, ItemType, Planning, PlanningHistory, Record, RecordKey,
        strip_reserved_fields,
    },
    reconcile::{ReconciliationPlan, reconcile},
};

impl Planner {
    /// Returns a planning item, from the cache unless `force` is set or the
    /// item was never cached.
    ///
    /// An item the backend no longer knows is evicted from the cache and the
    /// list before [`PlanningError::NotFound`] is returned.
    pub async fn fetch_planning_by_id(&self, id: &str, force: bool) -> Result<Planning> {
        if !force {
            let cache_id = id.to_string();
            let cached = self
                .with_database(move |db| db.get_planning(&cache_id))
                .await?;
            if let Some(planning) = cached {
                debug!("Planning item {id} served from cache");
                return Ok(planning);
            }
        }

        let planning = match self.backend.get_planning(id).await {
            Ok(planning) => planning,
            Err(e @ PlanningError::NotFound { .. }) => {
                self.forget_planning(id).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.remember(vec![Record::Planning(planning.clone())]).await?;
        Ok(planning)
    }

    /// Saves a planning item together with its coverages.
    ///
    /// `original` is the version the edit started from; when absent it is
    /// looked up (cache first) for items that already exist. An original
    /// without an ID means the item does not exist yet.
    ///
    /// For an existing item, coverage writes all settle before the item
    /// itself is written, and if any of them fails the item is not written
    /// and [`PlanningError::Reconciliation`] is returned. A new item is
    /// created and cached first, then its coverages are saved against it; a
    /// failure there names the created item in the error.
    pub async fn save_planning(
        &self,
        item: Planning,
        original: Option<Planning>,
    ) -> Result<Planning> {
        let original = match (original, item.id.as_deref()) {
            (Some(original), _) => Some(original),
            (None, Some(id)) => Some(self.fetch_planning_by_id(id, false).await?),
            (None, None) => None,
        };
        let payload = planning_payload(&item)?;

        let saved = match original.filter(|original| original.id.is_some()) {
            None => self.create_planning(&item, &payload).await?,
            Some(original) => {
                let plan = reconcile(&item.coverages, &original, &original.coverages);
                let saved_coverages = self.apply_coverage_plan(&plan).await?;
                let saved = self.backend.save_planning(Some(&original), &payload).await?;
                info!(
                    "Updated planning item {} ({} coverage write(s))",
                    saved.id.as_deref().unwrap_or_default(),
                    plan.len()
                );
                let saved = Planning {
                    coverages: current_coverages(&item, &plan, saved_coverages),
                    ..saved
                };
                with_read_fields(saved, &original)
            }
        };

        self.record_saved(&saved).await?;
        Ok(saved)
    }

    /// Saves a planning item, placing a new one in the agenda `agenda_id`.
    ///
    /// Existing items are saved as they are. A new item needs an agenda,
    /// and that agenda must be enabled.
    pub async fn save_planning_in_agenda(
        &self,
        mut item: Planning,
        agenda_id: Option<&str>,
    ) -> Result<Planning> {
        if item.id.is_some() {
            return self.save_planning(item, None).await;
        }

        let Some(agenda_id) = agenda_id else {
            return Err(PlanningError::invalid_input("agenda")
                .with_reason("No Agenda is currently selected."));
        };
        let agenda = self.backend.get_agenda(agenda_id).await?;
        if agenda.is_enabled != Some(true) {
            return Err(PlanningError::invalid_input("agenda")
                .with_reason("Cannot create a new planning item in a disabled Agenda."));
        }

        item.agendas = vec![AgendaRef::Embedded(agenda)];
        self.save_planning(item, None).await
    }

    async fn create_planning(&self, item: &Planning, payload: &Value) -> Result<Planning> {
        let created = self.backend.save_planning(None, payload).await?;
        info!(
            "Created planning item {}",
            created.id.as_deref().unwrap_or_default()
        );
        self.record_saved(&created).await?;

        let plan = reconcile(&item.coverages, &created, &[]);
        let coverages = self
            .apply_coverage_plan(&plan)
            .await
            .map_err(|e| match e {
                PlanningError::Reconciliation {
                    failed,
                    total,
                    source,
                    ..
                } => PlanningError::Reconciliation {
                    failed,
                    total,
                    planning_id: created.id.clone(),
                    source,
                },
                other => other,
            })?;
        Ok(Planning {
            coverages,
            ..created
        })
    }

    /// Runs every coverage write of `plan` concurrently and waits for all of
    /// them to settle. Returns the saved coverages in plan order.
    pub async fn apply_coverage_plan(&self, plan: &ReconciliationPlan) -> Result<Vec<Coverage>> {
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let saves = join_all(plan.to_save.iter().map(|c| self.backend.save_coverage(c)));
        let deletes = join_all(plan.to_delete.iter().map(|c| self.backend.delete_coverage(c)));
        let (saved, deleted) = join(saves, deletes).await;

        let mut failed = 0;
        let mut first_error = None;
        let mut coverages = Vec::with_capacity(saved.len());
        let outcomes = saved
            .into_iter()
            .map(|result| result.map(Some))
            .chain(deleted.into_iter().map(|result| result.map(|()| None)));
        for outcome in outcomes {
            match outcome {
                Ok(Some(coverage)) => coverages.push(coverage),
                Ok(None) => {}
                Err(e) => {
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(source) = first_error {
            warn!("{failed} of {} coverage operation(s) failed", plan.len());
            return Err(PlanningError::Reconciliation {
                failed,
                total: plan.len(),
                planning_id: None,
                source: Box::new(source),
            });
        }
        Ok(coverages)
    }

    /// Fetches a coverage and refreshes it in its cached parent, if any.
    pub async fn fetch_coverage_by_id(&self, id: &str) -> Result<Coverage> {
        let coverage = self.backend.get_coverage(id).await?;

        let Some(parent_id) = coverage.planning_item.clone() else {
            return Ok(coverage);
        };
        let cached = self
            .with_database(move |db| db.get_planning(&parent_id))
            .await?;
        if let Some(mut parent) = cached {
            match parent.coverages.iter_mut().find(|c| c.id == coverage.id) {
                Some(existing) => *existing = coverage.clone(),
                None => parent.coverages.push(coverage.clone()),
            }
            self.record_saved(&parent).await?;
        }
        Ok(coverage)
    }

    /// Returns the recorded actions on a planning item, oldest first.
    pub async fn fetch_planning_history(&self, id: &str) -> Result<Vec<PlanningHistory>> {
        let history = self.backend.planning_history(id).await?;
        debug!("Planning item {id} has {} history entries", history.len());
        Ok(history)
    }

    /// Spikes a planning item.
    pub async fn spike_planning(&self, id: &str) -> Result<Planning> {
        let current = self.fetch_planning_by_id(id, false).await?;
        let spiked = self.backend.spike_planning(&current).await?;
        info!("Spiked planning item {id}");
        self.record_saved(&spiked).await?;
        Ok(spiked)
    }

    /// Restores a spiked planning item.
    pub async fn unspike_planning(&self, id: &str) -> Result<Planning> {
        let current = self.fetch_planning_by_id(id, false).await?;
        let restored = self.backend.unspike_planning(&current).await?;
        info!("Unspiked planning item {id}");
        self.record_saved(&restored).await?;
        Ok(restored)
    }

    /// Takes the edit lock on a planning item.
    pub async fn lock_planning(&self, id: &str) -> Result<Planning> {
        let current = self.fetch_planning_by_id(id, false).await?;
        let locked = self.backend.lock_planning(&current).await?;
        info!("Locked planning item {id}");
        self.record_saved(&locked).await?;
        Ok(locked)
    }

    /// Releases the edit lock on a planning item.
    pub async fn unlock_planning(&self, id: &str) -> Result<Planning> {
        let current = self.fetch_planning_by_id(id, false).await?;
        let unlocked = self.backend.unlock_planning(&current).await?;
        info!("Unlocked planning item {id}");
        self.record_saved(&unlocked).await?;
        Ok(unlocked)
    }

    /// Caches a saved item and replaces its stale copy in the list, or
    /// drops it from the list when it no longer matches the list's search.
    async fn record_saved(&self, saved: &Planning) -> Result<()> {
        let record = Record::Planning(saved.clone());
        self.remember(vec![record.clone()]).await?;
        {
            let mut state = self.lock_state();
            let (order, listed) = match &state.last_request {
                Some(request) => (request.order(), request.admits(&record)),
                None => (GroupOrder::Ascending, true),
            };
            state.groups = match record.key() {
                Some(key) if !listed => {
                    debug!("Planning item {} left the list", key.id);
                    remove_record(&state.groups, &key)
                }
                _ => upsert_record(&state.groups, &record, &self.config.time_zone, order),
            };
        }
        self.persist_state().await
    }

    async fn forget_planning(&self, id: &str) -> Result<()> {
        let cache_id = id.to_string();
        let evicted = self
            .with_database(move |db| db.delete_record(ItemType::Planning, &cache_id))
            .await?;
        if evicted {
            debug!("Evicted planning item {id} from the cache");
        }
        {
            let mut state = self.lock_state();
            let key = RecordKey {
                item_type: ItemType::Planning,
                id: id.to_string(),
            };
            state.groups = remove_record(&state.groups, &key);
        }
        self.persist_state().await
    }
}

/// Carries the server-owned fields of `original` that a write answer does
/// not repeat over to `saved`.
fn with_read_fields(mut saved: Planning, original: &Planning) -> Planning {
    if saved.planning_date.is_none() {
        saved.planning_date = original.planning_date;
    }
    if saved.original_creator.is_none() {
        saved.original_creator = original.original_creator.clone();
    }
    for (key, value) in &original.extra {
        if key.starts_with('_') {
            saved
                .extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
    saved
}

/// Top-level fields of `item` as the backend accepts them on write.
fn planning_payload(item: &Planning) -> Result<Value> {
    let mut payload = strip_reserved_fields(serde_json::to_value(item)?);
    if let Value::Object(fields) = &mut payload {
        fields.remove("coverages");
        fields.remove("original_creator");
        if !item.agendas.is_empty() {
            let ids: Vec<&str> = item.agendas.iter().map(AgendaRef::id).collect();
            fields.insert("agendas".to_string(), json!(ids));
        }
    }
    Ok(payload)
}

/// The item's coverages after a save: written ones replaced by the
/// backend's answer, unchanged ones as edited.
fn current_coverages(
    item: &Planning,
    plan: &ReconciliationPlan,
    saved: Vec<Coverage>,
) -> Vec<Coverage> {
    let mut written = plan.to_save.iter().zip(saved).peekable();
    item.coverages
        .iter()
        .map(|coverage| {
            let matches_next = written.peek().is_some_and(|(sent, _)| {
                sent.id == coverage.id && sent.planning == coverage.planning
            });
            match written.next_if(|_| matches_next) {
                Some((_, saved)) => saved,
                None => coverage.clone(),
            }
        })
        .collect()
}
