pub mod assemble;
pub mod cli;
pub mod clock;
pub mod config;
pub mod datetime;
pub mod error;
pub mod event;
pub mod feed;
pub mod interval;
pub mod packer;
pub mod projector;
pub mod render;
pub mod window;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use crate::assemble::{
  Layout,
  LayoutEngine,
  LayoutSettings,
  ViewLayout,
  ViewMode,
  ViewRequest
};
pub use crate::clock::{
  CalendarClock,
  NaiveCalendar
};
pub use crate::error::LayoutError;
pub use crate::event::{
  Event,
  EventId,
  RejectReason,
  Rejection
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli = cli::GlobalCli::parse_from(
    raw_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    view = cli.view.as_key(),
    "starting baylane"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;
  let settings = cfg
    .resolve()
    .context("invalid calendar configuration")?;
  debug!(?settings, "resolved settings");

  let clock = NaiveCalendar;
  let today = Utc::now()
    .with_timezone(&settings.timezone)
    .date_naive();
  let focus = assemble::shift_focus(
    &clock,
    datetime::parse_date_expr(
      &cli.date, today
    )?,
    cli.view,
    cli.shift
  )?;

  let request = ViewRequest::new(
    cli.view,
    focus,
    settings.start_hour,
    settings.end_hour,
    settings.week_start
  )?;
  let period = assemble::period_bounds(
    &clock,
    focus,
    cli.view,
    settings.week_start
  );
  info!(
    first = %period.first,
    last = %period.last,
    "laying out period"
  );

  let feed = feed::load_events(
    cli.input.as_deref(),
    &settings.timezone,
    settings.default_duration
  )?;

  let engine = LayoutEngine::with_clock(
    clock,
    settings.layout
  )?;
  let mut layout =
    engine.layout(&feed.events, &request);
  if !feed.rejected.is_empty() {
    let mut rejected = feed.rejected;
    rejected.append(&mut layout.rejected);
    layout.rejected = rejected;
  }

  let renderer =
    render::Renderer::new(&cli.color)?;
  renderer.print_layout(
    cli.format,
    &layout,
    &feed.events
  )
}
