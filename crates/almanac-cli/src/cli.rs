//! Command handlers.
//!
//! Each handler runs one planner operation and renders its result as
//! markdown through the [`TerminalRenderer`].

use std::io::Read;
use std::path::Path;

use almanac_core::{
    ActiveFilter, Planner,
    display::{Groups, History, LockResult, PlanningItems, SaveResult, SpikeResult},
    models::Planning,
};
use anyhow::{Context, Result};
use log::debug;

use crate::args::{EventsArgs, PlanningArgs, SaveArgs, SearchArgs, ShowArgs};
use crate::renderer::TerminalRenderer;

pub struct Cli {
    planner: Planner,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(planner: Planner, renderer: TerminalRenderer) -> Self {
        Self { planner, renderer }
    }

    pub async fn search(&self, args: SearchArgs) -> Result<()> {
        let search = args.into_search(self.planner.config().page_size);
        let groups = self
            .planner
            .search(search)
            .await
            .context("Failed to search events and planning items")?;
        self.renderer.render(&Groups(&groups).to_string())
    }

    pub async fn search_planning(&self, args: PlanningArgs) -> Result<()> {
        let search = args.into_search(self.planner.config().page_size);
        let groups = self
            .planner
            .search_planning(search)
            .await
            .context("Failed to search planning items")?;
        self.renderer.render(&Groups(&groups).to_string())
    }

    pub async fn load_more(&self) -> Result<()> {
        let groups = self
            .planner
            .load_more()
            .await
            .context("Failed to load the next page")?;
        self.renderer.render(&Groups(&groups).to_string())
    }

    pub async fn refetch(&self) -> Result<()> {
        let outcome = self
            .planner
            .refetch()
            .await
            .context("Failed to refetch the list")?;
        self.renderer.render(&outcome.to_string())
    }

    pub fn list(&self) -> Result<()> {
        let state = self.planner.list_state();
        let mut output = format!("# {} list\n\n", capitalize(state.active_filter.as_str()));
        if let Some(request) = &state.last_request {
            if request.filter() == state.active_filter {
                output.push_str(&format!("Pages loaded: {}\n\n", request.page()));
            }
        }
        output.push_str(&Groups(&state.groups).to_string());
        self.renderer.render(&output)
    }

    pub async fn set_filter(&self, filter: ActiveFilter) -> Result<()> {
        self.planner
            .set_active_filter(filter)
            .await
            .context("Failed to switch the active list")?;
        self.renderer.render(&format!("Active list: {filter}\n"))
    }

    pub async fn show(&self, args: ShowArgs) -> Result<()> {
        let planning = self
            .planner
            .fetch_planning_by_id(&args.id, args.force)
            .await
            .with_context(|| format!("Failed to fetch planning item {}", args.id))?;
        self.renderer.render(&planning.to_string())
    }

    pub async fn event_planning(&self, args: EventsArgs) -> Result<()> {
        let items = self
            .planner
            .load_planning_by_event_ids(args.ids)
            .await
            .context("Failed to load planning items for events")?;
        self.renderer.render(&PlanningItems(items).to_string())
    }

    pub async fn save(&self, args: SaveArgs) -> Result<()> {
        let item = read_planning(&args.file)?;
        let created = item.is_new();
        debug!("Saving {} planning item", if created { "new" } else { "existing" });

        let saved = self
            .planner
            .save_planning_in_agenda(item, args.agenda.as_deref())
            .await
            .context("Failed to save planning item")?;
        self.renderer.render(&SaveResult::new(saved, created).to_string())
    }

    pub async fn spike(&self, id: &str) -> Result<()> {
        let planning = self
            .planner
            .spike_planning(id)
            .await
            .with_context(|| format!("Failed to spike planning item {id}"))?;
        self.renderer.render(&SpikeResult { planning, spiked: true }.to_string())
    }

    pub async fn unspike(&self, id: &str) -> Result<()> {
        let planning = self
            .planner
            .unspike_planning(id)
            .await
            .with_context(|| format!("Failed to unspike planning item {id}"))?;
        self.renderer.render(&SpikeResult { planning, spiked: false }.to_string())
    }

    pub async fn coverage(&self, id: &str) -> Result<()> {
        let coverage = self
            .planner
            .fetch_coverage_by_id(id)
            .await
            .with_context(|| format!("Failed to fetch coverage {id}"))?;
        self.renderer.render(&coverage.to_string())
    }

    pub async fn history(&self, id: &str) -> Result<()> {
        let history = self
            .planner
            .fetch_planning_history(id)
            .await
            .with_context(|| format!("Failed to fetch history of planning item {id}"))?;
        self.renderer
            .render(&format!("# History of {id}\n\n{}", History(history)))
    }

    pub async fn lock(&self, id: &str) -> Result<()> {
        let planning = self
            .planner
            .lock_planning(id)
            .await
            .with_context(|| format!("Failed to lock planning item {id}"))?;
        self.renderer.render(&LockResult { planning, locked: true }.to_string())
    }

    pub async fn unlock(&self, id: &str) -> Result<()> {
        let planning = self
            .planner
            .unlock_planning(id)
            .await
            .with_context(|| format!("Failed to unlock planning item {id}"))?;
        self.renderer.render(&LockResult { planning, locked: false }.to_string())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reads a planning item from a JSON file, or from stdin for `-`.
fn read_planning(path: &Path) -> Result<Planning> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read planning item from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid planning item in {}", path.display()))
}
