//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use super::collections::Groups;
use crate::list::refetch::RefetchOutcome;
use crate::models::Planning;

/// Outcome of saving a planning item.
pub struct SaveResult {
    pub planning: Planning,
    /// Whether the save created the item
    pub created: bool,
}

impl SaveResult {
    pub fn new(planning: Planning, created: bool) -> Self {
        Self { planning, created }
    }
}

impl fmt::Display for SaveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.planning.id.as_deref().unwrap_or_default();
        if self.created {
            writeln!(f, "Created planning item with ID: {id}")?;
        } else {
            writeln!(f, "Saved planning item {id}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.planning)
    }
}

/// Outcome of spiking or unspiking a planning item.
pub struct SpikeResult {
    pub planning: Planning,
    pub spiked: bool,
}

impl fmt::Display for SpikeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.spiked { "Spiked" } else { "Unspiked" };
        writeln!(
            f,
            "{verb} planning item {}",
            self.planning.id.as_deref().unwrap_or_default()
        )
    }
}

/// Result of taking or releasing an edit lock.
pub struct LockResult {
    pub planning: Planning,
    pub locked: bool,
}

impl fmt::Display for LockResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.planning.id.as_deref().unwrap_or_default();
        if !self.locked {
            return writeln!(f, "Unlocked planning item {id}");
        }
        match &self.planning.lock_user {
            Some(user) => writeln!(f, "Locked planning item {id} for {user}"),
            None => writeln!(f, "Locked planning item {id}"),
        }
    }
}

impl fmt::Display for RefetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefetchOutcome::Completed(groups) => write!(f, "{}", Groups(groups)),
            RefetchOutcome::Aborted => {
                writeln!(f, "Refetch aborted: another list became active.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_result_headline() {
        let planning = Planning {
            id: Some("p1".to_string()),
            slugline: Some("budget".to_string()),
            ..Default::default()
        };
        let created = SaveResult::new(planning.clone(), true).to_string();
        assert!(created.starts_with("Created planning item with ID: p1\n\n# budget"));

        let updated = SaveResult::new(planning, false).to_string();
        assert!(updated.starts_with("Saved planning item p1"));
    }

    #[test]
    fn test_lock_result_names_the_holder() {
        let planning = Planning {
            id: Some("p1".to_string()),
            lock_user: Some("u1".to_string()),
            ..Default::default()
        };
        let locked = LockResult {
            planning: planning.clone(),
            locked: true,
        };
        assert_eq!(locked.to_string(), "Locked planning item p1 for u1\n");

        let unlocked = LockResult {
            planning,
            locked: false,
        };
        assert_eq!(unlocked.to_string(), "Unlocked planning item p1\n");
    }

    #[test]
    fn test_refetch_outcome_display() {
        assert!(RefetchOutcome::Aborted.to_string().contains("aborted"));
        assert_eq!(
            RefetchOutcome::Completed(Vec::new()).to_string(),
            "No items found.\n"
        );
    }
}
