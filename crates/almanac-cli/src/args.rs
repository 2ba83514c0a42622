//! Command-line arguments.
//!
//! The clap structures stay in the CLI crate; each converts into the core
//! parameter type it stands for, so the core params carry no clap derives.
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Planner
//! ```

use std::path::PathBuf;

use almanac_core::{
    ActiveFilter, AdvancedSearch, CombinedSearch, PlanningSearch, models::SpikeState,
};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

/// Command-line client for a newsroom planning backend
///
/// Almanac searches events and planning items, keeps the resulting list
/// grouped by day in a local cache and saves planning items together with
/// their coverages.
#[derive(Parser)]
#[command(version, about, name = "almanac")]
pub struct Args {
    /// Path to the SQLite cache file. Defaults to
    /// $XDG_DATA_HOME/almanac/almanac.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Base URL of the planning API. Falls back to $ALMANAC_BACKEND_URL
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Value of the Authorization header. Falls back to $ALMANAC_TOKEN
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// IANA time zone used for "today" and for grouping by day. Defaults to
    /// the system zone
    #[arg(long, global = true)]
    pub time_zone: Option<String>,

    /// Largest number of IDs sent in a single lookup request
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Records per page for new searches
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search events and ad-hoc planning items together
    #[command(alias = "s")]
    Search(SearchArgs),
    /// Search planning items
    #[command(alias = "p")]
    Planning(PlanningArgs),
    /// Load the next page of the current list
    #[command(alias = "m")]
    More,
    /// Reload every loaded page of the current list
    #[command(alias = "r")]
    Refetch,
    /// Show the current list from the cache
    #[command(aliases = ["l", "ls"])]
    List,
    /// Switch the active list
    Filter(FilterArgs),
    /// Show a planning item
    Show(ShowArgs),
    /// Show the planning items of one or more events
    #[command(alias = "e")]
    Events(EventsArgs),
    /// Create or update a planning item from a JSON document
    Save(SaveArgs),
    /// Spike a planning item
    Spike(IdArgs),
    /// Restore a spiked planning item
    Unspike(IdArgs),
    /// Show a coverage
    Coverage(CoverageArgs),
    /// Show the history of a planning item
    History(IdArgs),
    /// Take the edit lock on a planning item
    Lock(IdArgs),
    /// Release the edit lock on a planning item
    Unlock(IdArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SpikeStateArg {
    All,
    Active,
    Spiked,
}

impl From<SpikeStateArg> for SpikeState {
    fn from(val: SpikeStateArg) -> Self {
        match val {
            SpikeStateArg::All => SpikeState::All,
            SpikeStateArg::Active => SpikeState::Active,
            SpikeStateArg::Spiked => SpikeState::Spiked,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    Combined,
    Planning,
}

impl From<FilterArg> for ActiveFilter {
    fn from(val: FilterArg) -> Self {
        match val {
            FilterArg::Combined => ActiveFilter::Combined,
            FilterArg::Planning => ActiveFilter::Planning,
        }
    }
}

/// Metadata criteria shared by both searches.
#[derive(ClapArgs)]
pub struct AdvancedArgs {
    /// Category qcodes, comma-separated
    #[arg(long = "category", value_delimiter = ',')]
    pub anpa_category: Vec<String>,
    /// Subject qcodes, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub subject: Vec<String>,
    /// Slugline text, also matched against coverage sluglines
    #[arg(long)]
    pub slugline: Option<String>,
    #[arg(long)]
    pub pubstatus: Option<String>,
}

impl From<AdvancedArgs> for AdvancedSearch {
    fn from(val: AdvancedArgs) -> Self {
        AdvancedSearch {
            anpa_category: val.anpa_category,
            subject: val.subject,
            slugline: val.slugline,
            pubstatus: val.pubstatus,
        }
    }
}

#[derive(ClapArgs)]
pub struct SearchArgs {
    /// Free text to search for
    pub fulltext: Option<String>,
    /// Which items to include by spike state
    #[arg(long, value_enum, default_value = "active")]
    pub state: SpikeStateArg,
    #[command(flatten)]
    pub advanced: AdvancedArgs,
}

impl SearchArgs {
    pub fn into_search(self, max_results: u32) -> CombinedSearch {
        CombinedSearch {
            fulltext: self.fulltext,
            spike_state: self.state.into(),
            advanced_search: self.advanced.into(),
            page: 1,
            max_results,
        }
    }
}

#[derive(ClapArgs)]
pub struct PlanningArgs {
    /// Free text to search for, in the item or any of its coverages
    pub fulltext: Option<String>,
    /// Which items to include by spike state
    #[arg(long, value_enum)]
    pub state: Option<SpikeStateArg>,
    /// Agenda IDs, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub agenda: Vec<String>,
    /// Only items without any agenda; ignored when --agenda is given
    #[arg(long)]
    pub no_agenda: bool,
    /// Items with coverages from today on, instead of before today
    #[arg(long)]
    pub future: bool,
    #[command(flatten)]
    pub advanced: AdvancedArgs,
}

impl PlanningArgs {
    pub fn into_search(self, max_results: u32) -> PlanningSearch {
        PlanningSearch {
            event_ids: None,
            state: self.state.map(Into::into),
            agendas: (!self.agenda.is_empty()).then_some(self.agenda),
            no_agenda_assigned: self.no_agenda,
            fulltext: self.fulltext,
            only_future: self.future,
            advanced_search: self.advanced.into(),
            page: 1,
            max_results,
        }
    }
}

#[derive(ClapArgs)]
pub struct FilterArgs {
    #[arg(value_enum)]
    pub filter: FilterArg,
}

#[derive(ClapArgs)]
pub struct ShowArgs {
    /// ID of the planning item
    pub id: String,
    /// Fetch from the backend even if the item is cached
    #[arg(long)]
    pub force: bool,
}

#[derive(ClapArgs)]
pub struct EventsArgs {
    /// Event IDs
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(ClapArgs)]
pub struct SaveArgs {
    /// JSON file holding the planning item, or `-` for stdin
    pub file: PathBuf,
    /// Agenda a new planning item is created in. Falls back to
    /// $ALMANAC_AGENDA
    #[arg(long)]
    pub agenda: Option<String>,
}

#[derive(ClapArgs)]
pub struct CoverageArgs {
    /// ID of the coverage
    pub id: String,
}

#[derive(ClapArgs)]
pub struct IdArgs {
    /// ID of the planning item
    pub id: String,
}
