//! Persistence of the list view.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, params};

use crate::{
    error::{DatabaseResultExt, PlanningError, Result},
    list::{ActiveFilter, ListState},
};

const SELECT_STATE_SQL: &str =
    "SELECT active_filter, last_request, groups FROM list_state WHERE singleton = 1";
const UPSERT_STATE_SQL: &str = "INSERT INTO list_state (singleton, active_filter, last_request, groups, updated_at) \
     VALUES (1, ?1, ?2, ?3, ?4) \
     ON CONFLICT (singleton) DO UPDATE SET active_filter = excluded.active_filter, \
     last_request = excluded.last_request, groups = excluded.groups, updated_at = excluded.updated_at";

impl super::Database {
    /// Loads the saved list view, or an empty one if none was saved yet.
    pub fn load_list_state(&self) -> Result<ListState> {
        let row: Option<(String, Option<String>, String)> = self
            .connection
            .query_row(SELECT_STATE_SQL, [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .optional()
            .db_context("Failed to query list state")?;

        let Some((active_filter, last_request, groups)) = row else {
            return Ok(ListState::default());
        };

        let active_filter = active_filter
            .parse::<ActiveFilter>()
            .map_err(|reason| PlanningError::invalid_input("active_filter").with_reason(reason))?;
        Ok(ListState {
            active_filter,
            groups: serde_json::from_str(&groups)?,
            last_request: last_request
                .map(|request| serde_json::from_str(&request))
                .transpose()?,
        })
    }

    /// Replaces the saved list view.
    pub fn save_list_state(&self, state: &ListState) -> Result<()> {
        let last_request = state
            .last_request
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let groups = serde_json::to_string(&state.groups)?;

        self.connection
            .execute(
                UPSERT_STATE_SQL,
                params![
                    state.active_filter.as_str(),
                    last_request,
                    groups,
                    Timestamp::now().to_string()
                ],
            )
            .db_context("Failed to save list state")?;
        Ok(())
    }
}
