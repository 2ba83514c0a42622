//! Date-grouped view of records.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::Record;

/// All records scheduled on one calendar day, in schedule order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateGroup {
    pub date: Date,
    pub items: Vec<Record>,
}

impl DateGroup {
    pub fn new(date: Date) -> Self {
        Self {
            date,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ordering of records inside a group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupOrder {
    #[default]
    Ascending,
    /// Used for past-looking planning lists
    Descending,
}
