//! Almanac CLI Application
//!
//! Command-line client for the almanac editorial planning core.

mod args;
mod cli;
mod renderer;

use std::env;

use almanac_core::PlannerBuilder;
use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use jiff::tz::TimeZone;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        backend_url,
        token,
        time_zone,
        chunk_size,
        page_size,
        no_color,
        command,
    } = Args::parse();

    let mut builder = PlannerBuilder::new()
        .with_database_path(database_file)
        .with_backend_url(backend_url.or_else(|| env::var("ALMANAC_BACKEND_URL").ok()))
        .with_token(token.or_else(|| env::var("ALMANAC_TOKEN").ok()));
    if let Some(chunk_size) = chunk_size {
        builder = builder.with_chunk_size(chunk_size);
    }
    if let Some(page_size) = page_size {
        builder = builder.with_page_size(page_size);
    }
    if let Some(name) = time_zone {
        let zone = TimeZone::get(&name).with_context(|| format!("Unknown time zone: {name}"))?;
        builder = builder.with_time_zone(zone);
    }

    let planner = builder.build().await.context("Failed to initialize planner")?;
    let cli = Cli::new(planner, TerminalRenderer::new(!no_color));

    info!("Almanac started");

    match command {
        Some(Search(args)) => cli.search(args).await,
        Some(Planning(args)) => cli.search_planning(args).await,
        Some(More) => cli.load_more().await,
        Some(Refetch) => cli.refetch().await,
        Some(List) | None => cli.list(),
        Some(Filter(args)) => cli.set_filter(args.filter.into()).await,
        Some(Show(args)) => cli.show(args).await,
        Some(Events(args)) => cli.event_planning(args).await,
        Some(Save(mut args)) => {
            args.agenda = args.agenda.or_else(|| env::var("ALMANAC_AGENDA").ok());
            cli.save(args).await
        }
        Some(Spike(args)) => cli.spike(&args.id).await,
        Some(Unspike(args)) => cli.unspike(&args.id).await,
        Some(Coverage(args)) => cli.coverage(&args.id).await,
        Some(History(args)) => cli.history(&args.id).await,
        Some(Lock(args)) => cli.lock(&args.id).await,
        Some(Unlock(args)) => cli.unlock(&args.id).await,
    }
}
