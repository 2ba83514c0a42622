//! Collection wrapper types for displaying lists of records.

use std::fmt;

use super::datetime::DayHeading;
use crate::models::{DateGroup, Planning, PlanningHistory};

/// Newtype wrapper for displaying the date-grouped list.
///
/// # Examples
///
/// ```rust
/// use almanac_core::{display::Groups, models::DateGroup};
/// use jiff::civil::date;
///
/// let groups = vec![DateGroup::new(date(2024, 1, 1))];
/// let output = Groups(&groups).to_string();
/// assert!(output.contains("## Monday, 1 January 2024"));
/// ```
pub struct Groups<'a>(pub &'a [DateGroup]);

impl Groups<'_> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of records across every group.
    pub fn record_count(&self) -> usize {
        self.0.iter().map(DateGroup::len).sum()
    }
}

impl fmt::Display for Groups<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No items found.");
        }
        for group in self.0 {
            writeln!(f, "## {}", DayHeading(&group.date))?;
            writeln!(f)?;
            for record in &group.items {
                write!(f, "{record}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying planning items in full, one after another.
pub struct PlanningItems(pub Vec<Planning>);

impl PlanningItems {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Planning> {
        self.0.iter()
    }
}

impl IntoIterator for PlanningItems {
    type Item = Planning;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for PlanningItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No planning items found.");
        }
        for (index, planning) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{planning}")?;
        }
        Ok(())
    }
}

/// Newtype wrapper for the history of one planning item.
pub struct History(pub Vec<PlanningHistory>);

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No history recorded.");
        }
        for entry in &self.0 {
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
