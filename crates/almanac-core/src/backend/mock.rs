//! In-process backend for tests.
//!
//! Holds an index of records in memory, answers searches from it and records
//! every call. Coverage writes are recorded when they settle, after any
//! configured latency, so tests can assert on the order in which coverage and
//! parent writes complete.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Backend, SearchEndpoint};
use crate::error::{PlanningError, Result};
use crate::models::{Agenda, Coverage, ItemType, Planning, PlanningHistory, Record, WorkflowState};
use crate::query::SearchRequest;

/// A recorded call to the mock backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Search {
        endpoint: SearchEndpoint,
        request: SearchRequest,
    },
    GetPlanning(String),
    SavePlanning {
        id: Option<String>,
        payload: Value,
    },
    SaveCoverage(Coverage),
    DeleteCoverage(Coverage),
    Spike(String),
    Unspike(String),
    GetCoverage(String),
    History(String),
    Lock(String),
    Unlock(String),
    GetAgenda(String),
}

impl MockCall {
    pub fn is_coverage_write(&self) -> bool {
        matches!(self, MockCall::SaveCoverage(_) | MockCall::DeleteCoverage(_))
    }
}

/// Mock implementation of [`Backend`].
pub struct MockBackend {
    records: Mutex<Vec<Record>>,
    agendas: Mutex<Vec<Agenda>>,
    history: Mutex<Vec<PlanningHistory>>,
    calls: Mutex<Vec<MockCall>>,
    search_error: Mutex<Option<PlanningError>>,
    save_error: Mutex<Option<PlanningError>>,
    failing_coverages: Mutex<HashSet<String>>,
    coverage_latency: Mutex<Duration>,
    next_id: AtomicU64,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            agendas: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            search_error: Mutex::new(None),
            save_error: Mutex::new(None),
            failing_coverages: Mutex::new(HashSet::new()),
            coverage_latency: Mutex::new(Duration::ZERO),
            next_id: AtomicU64::new(1),
        }
    }

    /// Pre-populate the index.
    pub fn with_records(self, records: impl IntoIterator<Item = Record>) -> Self {
        match self.records.lock() {
            Ok(mut guard) => guard.extend(records),
            Err(poisoned) => poisoned.into_inner().extend(records),
        }
        self
    }

    /// Register agendas answered by `get_agenda`.
    pub fn with_agendas(self, agendas: impl IntoIterator<Item = Agenda>) -> Self {
        match self.agendas.lock() {
            Ok(mut guard) => guard.extend(agendas),
            Err(poisoned) => poisoned.into_inner().extend(agendas),
        }
        self
    }

    /// Pre-populate the planning history.
    pub fn with_history(self, entries: impl IntoIterator<Item = PlanningHistory>) -> Self {
        match self.history.lock() {
            Ok(mut guard) => guard.extend(entries),
            Err(poisoned) => poisoned.into_inner().extend(entries),
        }
        self
    }

    /// Remove a planning item from the index, as if deleted elsewhere.
    pub fn remove_planning(&self, id: &str) {
        self.with_index(|records| {
            records.retain(|record| {
                !matches!(record, Record::Planning(p) if p.id.as_deref() == Some(id))
            });
        });
    }

    /// Configure the next search to fail.
    pub fn with_search_error(self, err: PlanningError) -> Self {
        match self.search_error.lock() {
            Ok(mut e) => *e = Some(err),
            Err(poisoned) => *poisoned.into_inner() = Some(err),
        }
        self
    }

    /// Configure the next planning save to fail.
    pub fn with_save_error(self, err: PlanningError) -> Self {
        match self.save_error.lock() {
            Ok(mut e) => *e = Some(err),
            Err(poisoned) => *poisoned.into_inner() = Some(err),
        }
        self
    }

    /// Reject writes of coverages with this slugline.
    pub fn with_failing_coverage(self, slugline: &str) -> Self {
        match self.failing_coverages.lock() {
            Ok(mut set) => {
                set.insert(slugline.to_string());
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(slugline.to_string());
            }
        }
        self
    }

    /// Delay every successful coverage write by `latency`.
    pub fn with_coverage_latency(self, latency: Duration) -> Self {
        match self.coverage_latency.lock() {
            Ok(mut guard) => *guard = latency,
            Err(poisoned) => *poisoned.into_inner() = latency,
        }
        self
    }

    /// Return all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        match self.calls.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Return the number of recorded calls.
    pub fn call_count(&self) -> usize {
        match self.calls.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Return the recorded searches.
    pub fn searches(&self) -> Vec<(SearchEndpoint, SearchRequest)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Search { endpoint, request } => Some((endpoint, request)),
                _ => None,
            })
            .collect()
    }

    /// Snapshot of a planning item as stored in the index.
    pub fn stored_planning(&self, id: &str) -> Option<Planning> {
        self.with_index(|records| find_planning(records, id).cloned())
    }

    fn record(&self, call: MockCall) {
        match self.calls.lock() {
            Ok(mut guard) => guard.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }
    }

    fn take_error(lock: &Mutex<Option<PlanningError>>) -> Option<PlanningError> {
        match lock.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    fn with_index<T>(&self, f: impl FnOnce(&mut Vec<Record>) -> T) -> T {
        match self.records.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn latency(&self) -> Duration {
        match self.coverage_latency.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn rejects(&self, coverage: &Coverage) -> bool {
        let Some(slugline) = coverage.planning.slugline.as_deref() else {
            return false;
        };
        match self.failing_coverages.lock() {
            Ok(set) => set.contains(slugline),
            Err(poisoned) => poisoned.into_inner().contains(slugline),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn next_etag(&self) -> String {
        self.next_id("etag")
    }

    fn set_lock(&self, planning: &Planning, user: Option<&str>) -> Result<Planning> {
        let id = planning.id.clone().ok_or_else(|| {
            PlanningError::invalid_input("planning").with_reason("unsaved item")
        })?;
        let etag = self.next_etag();
        self.with_index(|records| {
            let stored = find_planning_mut(records, &id).ok_or_else(|| not_found(&id))?;
            stored.lock_user = user.map(str::to_string);
            stored.lock_action = user.map(|_| "edit".to_string());
            stored.lock_session = user.map(|_| "mock-session".to_string());
            stored.lock_time = user.map(|_| jiff::Timestamp::now());
            stored.etag = Some(etag);
            Ok(stored.clone())
        })
    }

    fn set_state(&self, planning: &Planning, state: WorkflowState) -> Result<Planning> {
        let id = planning.id.clone().ok_or_else(|| {
            PlanningError::invalid_input("planning").with_reason("unsaved item")
        })?;
        let etag = self.next_etag();
        self.with_index(|records| {
            let stored = find_planning_mut(records, &id).ok_or_else(|| not_found(&id))?;
            stored.state = state;
            stored.etag = Some(etag);
            Ok(stored.clone())
        })
    }
}

fn not_found(id: &str) -> PlanningError {
    PlanningError::Backend {
        status: Some(404),
        message: format!("planning item {id} not found"),
    }
}

fn find_planning<'a>(records: &'a [Record], id: &str) -> Option<&'a Planning> {
    records
        .iter()
        .filter_map(Record::as_planning)
        .find(|planning| planning.id.as_deref() == Some(id))
}

fn find_planning_mut<'a>(records: &'a mut [Record], id: &str) -> Option<&'a mut Planning> {
    records.iter_mut().find_map(|record| match record {
        Record::Planning(planning) if planning.id.as_deref() == Some(id) => Some(planning),
        _ => None,
    })
}

/// Values of a `term`/`terms` clause on `field` among the query's `must`.
fn must_values(request: &SearchRequest, field: &str) -> Option<Vec<String>> {
    let must = request.source.query["bool"]["must"].as_array()?;
    must.iter().find_map(|clause| {
        if let Some(values) = clause["terms"][field].as_array() {
            return Some(
                values
                    .iter()
                    .filter_map(|value| value.as_str().map(str::to_string))
                    .collect(),
            );
        }
        clause["term"][field].as_str().map(|value| vec![value.to_string()])
    })
}

fn matches_endpoint(record: &Record, endpoint: SearchEndpoint) -> bool {
    match endpoint {
        SearchEndpoint::Planning => record.item_type() == ItemType::Planning,
        SearchEndpoint::Events => record.item_type() == ItemType::Events,
        SearchEndpoint::Combined => true,
    }
}

fn page_window(request: &SearchRequest) -> (usize, usize) {
    let to_usize = |value: u32| usize::try_from(value).unwrap_or(usize::MAX);
    match (request.source.from, request.source.size) {
        (Some(from), Some(size)) => (to_usize(from), to_usize(size)),
        _ => {
            let size = to_usize(request.max_results.unwrap_or(25));
            let page = to_usize(request.page.unwrap_or(1).max(1));
            ((page - 1).saturating_mul(size), size)
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn search(
        &self,
        endpoint: SearchEndpoint,
        request: &SearchRequest,
    ) -> Result<Vec<Record>> {
        self.record(MockCall::Search {
            endpoint,
            request: request.clone(),
        });
        if let Some(err) = Self::take_error(&self.search_error) {
            return Err(err);
        }

        let event_items = must_values(request, "event_item");
        let ids = must_values(request, "_id");
        let (skip, take) = page_window(request);

        Ok(self.with_index(|records| {
            records
                .iter()
                .filter(|record| matches_endpoint(record, endpoint))
                .filter(|record| match &event_items {
                    Some(wanted) => record
                        .as_planning()
                        .and_then(|planning| planning.event_item.as_ref())
                        .is_some_and(|event| wanted.contains(event)),
                    None => true,
                })
                .filter(|record| match &ids {
                    Some(wanted) => record.id().is_some_and(|id| wanted.iter().any(|w| w == id)),
                    None => true,
                })
                .skip(skip)
                .take(take)
                .cloned()
                .collect()
        }))
    }

    async fn get_planning(&self, id: &str) -> Result<Planning> {
        self.record(MockCall::GetPlanning(id.to_string()));
        self.stored_planning(id).ok_or_else(|| PlanningError::NotFound {
            kind: "Planning item".to_string(),
            id: id.to_string(),
        })
    }

    async fn save_planning(
        &self,
        existing: Option<&Planning>,
        payload: &Value,
    ) -> Result<Planning> {
        let existing_id = existing.and_then(|item| item.id.clone());
        self.record(MockCall::SavePlanning {
            id: existing_id.clone(),
            payload: payload.clone(),
        });
        if let Some(err) = Self::take_error(&self.save_error) {
            return Err(err);
        }

        let mut saved: Planning = serde_json::from_value(payload.clone())?;
        saved.id = Some(existing_id.unwrap_or_else(|| self.next_id("planning")));
        saved.etag = Some(self.next_etag());

        let id = saved.id.clone().unwrap_or_default();
        self.with_index(|records| {
            match find_planning_mut(records, &id) {
                Some(stored) => {
                    saved.coverages = std::mem::take(&mut stored.coverages);
                    saved.original_creator = stored.original_creator.take();
                    *stored = saved.clone();
                }
                None => records.push(Record::Planning(saved.clone())),
            }
        });
        Ok(saved)
    }

    async fn save_coverage(&self, coverage: &Coverage) -> Result<Coverage> {
        if self.rejects(coverage) {
            self.record(MockCall::SaveCoverage(coverage.clone()));
            return Err(PlanningError::Backend {
                status: Some(400),
                message: "coverage rejected".to_string(),
            });
        }
        tokio::time::sleep(self.latency()).await;

        let mut saved = coverage.clone();
        if saved.id.is_none() {
            saved.id = Some(self.next_id("coverage"));
        }
        saved.etag = Some(self.next_etag());

        self.with_index(|records| {
            let parent = saved
                .planning_item
                .as_deref()
                .and_then(|parent_id| find_planning_mut(records, parent_id));
            if let Some(parent) = parent {
                match parent.coverages.iter_mut().find(|c| c.id == saved.id) {
                    Some(stored) => *stored = saved.clone(),
                    None => parent.coverages.push(saved.clone()),
                }
            }
        });
        self.record(MockCall::SaveCoverage(coverage.clone()));
        Ok(saved)
    }

    async fn delete_coverage(&self, coverage: &Coverage) -> Result<()> {
        if self.rejects(coverage) {
            self.record(MockCall::DeleteCoverage(coverage.clone()));
            return Err(PlanningError::Backend {
                status: Some(400),
                message: "coverage rejected".to_string(),
            });
        }
        tokio::time::sleep(self.latency()).await;

        self.with_index(|records| {
            for record in records.iter_mut() {
                if let Record::Planning(planning) = record {
                    planning.coverages.retain(|c| c.id != coverage.id);
                }
            }
        });
        self.record(MockCall::DeleteCoverage(coverage.clone()));
        Ok(())
    }

    async fn spike_planning(&self, planning: &Planning) -> Result<Planning> {
        self.record(MockCall::Spike(planning.id.clone().unwrap_or_default()));
        self.set_state(planning, WorkflowState::Spiked)
    }

    async fn unspike_planning(&self, planning: &Planning) -> Result<Planning> {
        self.record(MockCall::Unspike(planning.id.clone().unwrap_or_default()));
        self.set_state(planning, WorkflowState::Active)
    }

    async fn get_coverage(&self, id: &str) -> Result<Coverage> {
        self.record(MockCall::GetCoverage(id.to_string()));
        self.with_index(|records| {
            records
                .iter()
                .filter_map(Record::as_planning)
                .flat_map(|planning| planning.coverages.iter())
                .find(|coverage| coverage.id.as_deref() == Some(id))
                .cloned()
        })
        .ok_or_else(|| PlanningError::NotFound {
            kind: "Coverage".to_string(),
            id: id.to_string(),
        })
    }

    async fn planning_history(&self, planning_id: &str) -> Result<Vec<PlanningHistory>> {
        self.record(MockCall::History(planning_id.to_string()));
        let mut entries: Vec<PlanningHistory> = match self.history.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        entries.retain(|entry| entry.planning_id == planning_id);
        entries.sort_by_key(|entry| entry.created);
        Ok(entries)
    }

    async fn lock_planning(&self, planning: &Planning) -> Result<Planning> {
        self.record(MockCall::Lock(planning.id.clone().unwrap_or_default()));
        self.set_lock(planning, Some("mock-user"))
    }

    async fn unlock_planning(&self, planning: &Planning) -> Result<Planning> {
        self.record(MockCall::Unlock(planning.id.clone().unwrap_or_default()));
        self.set_lock(planning, None)
    }

    async fn get_agenda(&self, id: &str) -> Result<Agenda> {
        self.record(MockCall::GetAgenda(id.to_string()));
        let agendas = match self.agendas.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        agendas
            .into_iter()
            .find(|agenda| agenda.id == id)
            .ok_or_else(|| PlanningError::NotFound {
                kind: "Agenda".to_string(),
                id: id.to_string(),
            })
    }
}
