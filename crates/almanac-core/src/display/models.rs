//! Display implementations for domain models.
//!
//! Full views (`Planning`, `Event`) render as markdown sections for the
//! terminal renderer; a [`Record`] renders as the single list line used in
//! date groups.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{
    Coverage, Event, Planning, PlanningHistory, QCode, Record, SpikeState, WorkflowState,
};

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SpikeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for QCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => f.write_str(&self.qcode),
        }
    }
}

fn join_qcodes(qcodes: &[QCode]) -> String {
    qcodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Planning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self
            .slugline
            .as_deref()
            .or(self.headline.as_deref())
            .unwrap_or("(no slugline)");
        match &self.id {
            Some(id) => writeln!(f, "# {title} (ID: {id})")?,
            None => writeln!(f, "# {title} (unsaved)")?,
        }
        writeln!(f)?;

        writeln!(f, "- State: {}", self.state)?;
        if let Some(user) = &self.lock_user {
            let action = self.lock_action.as_deref().unwrap_or("edit");
            writeln!(f, "- Locked by: {user} ({action})")?;
        }
        if let Some(event) = &self.event_item {
            writeln!(f, "- Event: {event}")?;
        }
        if !self.agendas.is_empty() {
            let agendas: Vec<&str> = self.agendas.iter().map(|agenda| agenda.id()).collect();
            writeln!(f, "- Agendas: {}", agendas.join(", "))?;
        }
        if !self.anpa_category.is_empty() {
            writeln!(f, "- Categories: {}", join_qcodes(&self.anpa_category))?;
        }
        if let Some(date) = &self.planning_date {
            writeln!(f, "- Planning date: {}", LocalDateTime::system(date))?;
        }

        if let Some(description) = &self.description_text {
            writeln!(f)?;
            writeln!(f, "{description}")?;
        }

        if self.coverages.is_empty() {
            writeln!(f, "\nNo coverages planned.")?;
        } else {
            writeln!(f, "\n## Coverages")?;
            writeln!(f)?;
            for coverage in &self.coverages {
                write!(f, "{coverage}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let genre = self
            .planning
            .genre
            .as_ref()
            .map_or_else(|| "Coverage".to_string(), ToString::to_string);
        write!(f, "- **{genre}**")?;
        if let Some(slugline) = &self.planning.slugline {
            write!(f, " {slugline}")?;
        }
        match &self.planning.scheduled {
            Some(scheduled) => write!(f, ", due {}", LocalDateTime::system(scheduled))?,
            None => write!(f, ", not scheduled")?,
        }
        if let Some(status) = &self.news_coverage_status {
            write!(f, " [{status}]")?;
        }
        if let Some(id) = &self.id {
            write!(f, " (ID: {id})")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for PlanningHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.created {
            Some(created) => write!(f, "- {}", LocalDateTime::system(created))?,
            None => write!(f, "- (undated)")?,
        }
        write!(f, " **{}**", self.operation)?;
        if let Some(user) = &self.user_id {
            write!(f, " by {user}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.name.as_deref().or(self.slugline.as_deref()).unwrap_or("(unnamed)");
        writeln!(f, "# {title} (ID: {})", self.id)?;
        writeln!(f)?;
        writeln!(f, "- State: {}", self.state)?;
        if let Some(dates) = &self.dates {
            writeln!(
                f,
                "- When: {} to {}",
                LocalDateTime::system(&dates.start),
                LocalDateTime::system(&dates.end)
            )?;
        }
        if !self.calendars.is_empty() {
            writeln!(f, "- Calendars: {}", join_qcodes(&self.calendars))?;
        }
        if let Some(definition) = &self.definition_short {
            writeln!(f)?;
            writeln!(f, "{definition}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Record::Event(event) => event.name.as_deref().or(event.slugline.as_deref()),
            Record::Planning(planning) => {
                planning.slugline.as_deref().or(planning.headline.as_deref())
            }
        };
        write!(f, "- [{}] {}", self.item_type(), label.unwrap_or("(untitled)"))?;
        if let Some(id) = self.id() {
            write!(f, " (ID: {id})")?;
        }
        if let Record::Planning(planning) = self {
            if !planning.coverages.is_empty() {
                write!(f, ", {} coverage(s)", planning.coverages.len())?;
            }
            if planning.state.is_spiked() {
                write!(f, " *spiked*")?;
            }
        }
        writeln!(f)
    }
}
