use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{
  ArgAction,
  Parser
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::assemble::ViewMode;
use crate::render::OutputFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVal {
  pub key:   String,
  pub value: String
}

impl std::str::FromStr for KeyVal {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let (k, v) =
      s.split_once('=').ok_or_else(|| {
        anyhow!("expected KEY=VALUE, got: {s}")
      })?;
    Ok(Self {
      key:   k.trim().to_string(),
      value: v.trim().to_string()
    })
  }
}

#[derive(Parser, Debug, Clone)]
#[command(
  name = "baylane",
  version,
  about = "Baylane: lays out a workshop \
           calendar as day, week or month \
           geometry",
  disable_help_subcommand = true
)]
pub struct GlobalCli {
  #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
  pub verbose: u8,

  #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
  pub quiet: u8,

  #[arg(long = "config")]
  pub config: Option<PathBuf>,

  #[arg(
    long = "rc",
    value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
    action = ArgAction::Append
  )]
  pub rc_overrides: Vec<KeyVal>,

  /// day, week or month
  #[arg(
    value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<ViewMode>()),
    default_value = "week"
  )]
  pub view: ViewMode,

  /// today, tomorrow, yesterday, +Nd, -Nd or
  /// YYYY-MM-DD
  #[arg(long = "date", default_value = "today")]
  pub date: String,

  /// Periods to move from `--date`: days,
  /// weeks or months depending on the view.
  #[arg(
    long = "shift",
    default_value_t = 0,
    allow_hyphen_values = true
  )]
  pub shift: i64,

  /// JSON array of events; stdin when absent
  /// or `-`.
  #[arg(short = 'i', long = "input")]
  pub input: Option<PathBuf>,

  #[arg(
    long = "format",
    value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<OutputFormat>()),
    default_value = "table"
  )]
  pub format: OutputFormat,

  #[arg(long = "color", default_value = "on")]
  pub color: String
}

pub fn init_tracing(
  verbose: u8,
  quiet: u8
) -> anyhow::Result<()> {
  let default_level = if quiet >= 2 {
    "error"
  } else if quiet == 1 {
    "warn"
  } else if verbose >= 3 {
    "trace"
  } else if verbose == 2 {
    "debug"
  } else if verbose == 1 {
    "info"
  } else {
    "warn"
  };

  let env_filter =
    EnvFilter::try_from_default_env()
      .or_else(|_| {
        EnvFilter::try_new(default_level)
      })
      .map_err(|e| {
        anyhow!(
          "invalid RUST_LOG / log filter: \
           {e}"
        )
      })?;

  let init_result = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .with_target(true)
    .with_level(true)
    .with_ansi(std::io::stderr().is_terminal())
    .try_init();

  if let Err(err) = init_result {
    debug!(error = %err, "tracing subscriber already set, continuing");
  }

  Ok(())
}
