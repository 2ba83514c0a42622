//! Planning history entries.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One recorded action on a planning item, as kept by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlanningHistory {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub planning_id: String,

    /// What happened, e.g. `create`, `update`, `spiked`
    #[serde(default)]
    pub operation: String,

    /// ID of the user who acted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(rename = "_created", default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,

    /// The fields changed by the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
