//! Workflow and spike-state enumerations.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workflow state carried by every event and planning item.
///
/// States this crate does not know about are kept verbatim in `Other`, so a
/// single unusual document never fails a whole search page and is written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowState {
    #[default]
    Active,
    Draft,
    Ingested,
    Scheduled,
    Killed,
    Cancelled,
    Rescheduled,
    Postponed,
    /// Soft-deleted; hidden from default searches
    Spiked,
    Published,
    Other(String),
}

impl WorkflowState {
    pub fn as_str(&self) -> &str {
        match self {
            WorkflowState::Active => "active",
            WorkflowState::Draft => "draft",
            WorkflowState::Ingested => "ingested",
            WorkflowState::Scheduled => "scheduled",
            WorkflowState::Killed => "killed",
            WorkflowState::Cancelled => "cancelled",
            WorkflowState::Rescheduled => "rescheduled",
            WorkflowState::Postponed => "postponed",
            WorkflowState::Spiked => "spiked",
            WorkflowState::Published => "published",
            WorkflowState::Other(state) => state,
        }
    }

    pub fn is_spiked(&self) -> bool {
        *self == WorkflowState::Spiked
    }
}

impl From<String> for WorkflowState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "active" => WorkflowState::Active,
            "draft" => WorkflowState::Draft,
            "ingested" => WorkflowState::Ingested,
            "scheduled" => WorkflowState::Scheduled,
            "killed" => WorkflowState::Killed,
            "cancelled" => WorkflowState::Cancelled,
            "rescheduled" => WorkflowState::Rescheduled,
            "postponed" => WorkflowState::Postponed,
            "spiked" => WorkflowState::Spiked,
            "published" => WorkflowState::Published,
            _ => WorkflowState::Other(state),
        }
    }
}

impl From<&str> for WorkflowState {
    fn from(state: &str) -> Self {
        WorkflowState::from(state.to_string())
    }
}

impl From<WorkflowState> for String {
    fn from(state: WorkflowState) -> Self {
        match state {
            WorkflowState::Other(state) => state,
            known => known.as_str().to_string(),
        }
    }
}

/// Spike filter applied to searches.
///
/// `Active` is the default and excludes spiked items; `All` applies no state
/// clause at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpikeState {
    All,
    #[default]
    Active,
    Spiked,
}

impl SpikeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpikeState::All => "all",
            SpikeState::Active => "active",
            SpikeState::Spiked => "spiked",
        }
    }
    /// Whether an item in `state` passes this filter.
    pub fn admits(&self, state: &WorkflowState) -> bool {
        match self {
            SpikeState::All => true,
            SpikeState::Active => !state.is_spiked(),
            SpikeState::Spiked => state.is_spiked(),
        }
    }
}

impl FromStr for SpikeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(SpikeState::All),
            "active" | "not_spiked" => Ok(SpikeState::Active),
            "spiked" => Ok(SpikeState::Spiked),
            _ => Err(format!("Invalid spike state: {s}")),
        }
    }
}
