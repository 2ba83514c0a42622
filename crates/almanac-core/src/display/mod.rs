//! Display formatting for the terminal.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! the wrappers here add context, such as the day headings of the list or
//! the headline of a save. Everything renders as markdown for the CLI's
//! terminal renderer.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Wrappers        │    │   Markdown      │
//! │ (Record, ...)   │───▶│ (Groups, ...)   │───▶│   (terminal)    │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`collections`]: [`Groups`], [`PlanningItems`] and [`History`]
//! - [`results`]: [`SaveResult`], [`SpikeResult`], [`LockResult`] and refetch outcomes
//! - [`datetime`]: timestamp and day formatting
//! - [`models`]: Display implementations for domain models

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;

pub use collections::{Groups, History, PlanningItems};
pub use datetime::{DayHeading, LocalDateTime};
pub use results::{LockResult, SaveResult, SpikeResult};
