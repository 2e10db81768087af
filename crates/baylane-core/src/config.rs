use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Duration,
  Weekday
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::assemble::{
  LayoutSettings,
  MONTH_CELL_LIMIT
};
use crate::datetime::{
  DEFAULT_DISPLAY_TIMEZONE,
  parse_clock_time,
  parse_weekday_name,
  resolve_timezone
};
use crate::projector::{
  HOUR_HEIGHT,
  MIN_VISIBLE_HEIGHT
};

const CONFIG_ENV_VAR: &str =
  "BAYLANE_CONFIG";
const CONFIG_DIR_NAME: &str = "baylane";
const CONFIG_FILE_NAME: &str =
  "baylane.toml";

fn default_start_time() -> String {
  "08:00".to_string()
}

fn default_end_time() -> String {
  "20:00".to_string()
}

fn default_week_start() -> String {
  "monday".to_string()
}

fn default_duration_minutes() -> i64 {
  60
}

fn default_timezone() -> String {
  DEFAULT_DISPLAY_TIMEZONE.to_string()
}

fn default_hour_height() -> f64 {
  HOUR_HEIGHT
}

fn default_min_visible_height() -> f64 {
  MIN_VISIBLE_HEIGHT
}

fn default_month_cell_limit() -> usize {
  MONTH_CELL_LIMIT
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Config {
  #[serde(default)]
  pub calendar:     CalendarSection,
  #[serde(default)]
  pub layout:       LayoutSection,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct CalendarSection {
  #[serde(default = "default_start_time")]
  pub start_time:               String,
  #[serde(default = "default_end_time")]
  pub end_time:                 String,
  #[serde(default = "default_week_start")]
  pub week_start:               String,
  #[serde(
    default = "default_duration_minutes"
  )]
  pub default_duration_minutes: i64,
  #[serde(default = "default_timezone")]
  pub timezone:                 String
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct LayoutSection {
  #[serde(default = "default_hour_height")]
  pub hour_height:        f64,
  #[serde(
    default = "default_min_visible_height"
  )]
  pub min_visible_height: f64,
  #[serde(
    default = "default_month_cell_limit"
  )]
  pub month_cell_limit:   usize
}

impl Default for Config {
  fn default() -> Self {
    Self {
      calendar:     CalendarSection::default(),
      layout:       LayoutSection::default(),
      loaded_files: vec![]
    }
  }
}

impl Default for CalendarSection {
  fn default() -> Self {
    Self {
      start_time:               default_start_time(),
      end_time:                 default_end_time(),
      week_start:               default_week_start(),
      default_duration_minutes: default_duration_minutes(),
      timezone:                 default_timezone()
    }
  }
}

impl Default for LayoutSection {
  fn default() -> Self {
    Self {
      hour_height:        default_hour_height(),
      min_visible_height: default_min_visible_height(),
      month_cell_limit:   default_month_cell_limit()
    }
  }
}

/// Validated, typed view of [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSettings {
  pub start_hour:       u32,
  pub end_hour:         u32,
  pub week_start:       Weekday,
  pub default_duration: Duration,
  pub timezone:         Tz,
  pub layout:           LayoutSettings
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(config_override)?
    else {
      warn!(
        "no baylane config found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    Self::load_file(&path)
  }

  #[tracing::instrument]
  pub fn load_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;

    let mut cfg: Config =
      toml::from_str(&text).with_context(
        || {
          format!(
            "failed to parse {}",
            path.display()
          )
        }
      )?;
    cfg.loaded_files.push(path.to_path_buf());
    cfg.sanitize();
    Ok(cfg)
  }

  /// Applies `key=value` overrides such as
  /// `calendar.start_time=07:00`. An `rc.`
  /// prefix is accepted and ignored.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .trim();
      let value = v.trim();
      debug!(key = %key, value = %value, "applying override");

      match key {
        | "calendar.start_time" => {
          self.calendar.start_time =
            value.to_string();
        }
        | "calendar.end_time" => {
          self.calendar.end_time =
            value.to_string();
        }
        | "calendar.week_start" => {
          self.calendar.week_start =
            value.to_string();
        }
        | "calendar.default_duration_minutes" => {
          self
            .calendar
            .default_duration_minutes =
            parse_number(key, value)?;
        }
        | "calendar.timezone" => {
          self.calendar.timezone =
            value.to_string();
        }
        | "layout.hour_height" => {
          self.layout.hour_height =
            parse_number(key, value)?;
        }
        | "layout.min_visible_height" => {
          self
            .layout
            .min_visible_height =
            parse_number(key, value)?;
        }
        | "layout.month_cell_limit" => {
          self.layout.month_cell_limit =
            parse_number(key, value)?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: {other}"
          ));
        }
      }
    }

    self.sanitize();
    Ok(())
  }

  /// Blank strings fall back to defaults;
  /// everything else is left for
  /// [`Config::resolve`] to judge.
  fn sanitize(&mut self) {
    let calendar = &mut self.calendar;
    if calendar.start_time.trim().is_empty()
    {
      calendar.start_time =
        default_start_time();
    }
    if calendar.end_time.trim().is_empty() {
      calendar.end_time = default_end_time();
    }
    if calendar.week_start.trim().is_empty()
    {
      calendar.week_start =
        default_week_start();
    }
    if calendar.timezone.trim().is_empty() {
      calendar.timezone = default_timezone();
    }
  }

  /// Business hours use the hour component
  /// of the configured clock times.
  pub fn resolve(
    &self
  ) -> anyhow::Result<CalendarSettings> {
    let (start_hour, _) =
      parse_clock_time(&self.calendar.start_time)
        .ok_or_else(|| {
          anyhow!(
            "invalid calendar.start_time: {}",
            self.calendar.start_time
          )
        })?;
    let (end_hour, _) =
      parse_clock_time(&self.calendar.end_time)
        .ok_or_else(|| {
          anyhow!(
            "invalid calendar.end_time: {}",
            self.calendar.end_time
          )
        })?;
    if start_hour >= end_hour {
      return Err(anyhow!(
        "calendar.start_time ({}) must be \
         earlier than calendar.end_time ({})",
        self.calendar.start_time,
        self.calendar.end_time
      ));
    }

    let week_start = parse_weekday_name(
      &self.calendar.week_start
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid calendar.week_start: {}",
        self.calendar.week_start
      )
    })?;

    if self.calendar.default_duration_minutes
      <= 0
    {
      return Err(anyhow!(
        "calendar.default_duration_minutes \
         must be positive, got {}",
        self.calendar.default_duration_minutes
      ));
    }

    let timezone =
      resolve_timezone(&self.calendar.timezone)
        .context("invalid calendar.timezone")?;

    let layout = LayoutSettings {
      hour_height:        self.layout.hour_height,
      min_visible_height: self
        .layout
        .min_visible_height,
      month_cell_limit:   self
        .layout
        .month_cell_limit
    };
    layout.validate()?;

    Ok(CalendarSettings {
      start_hour,
      end_hour,
      week_start,
      default_duration: Duration::minutes(
        self.calendar.default_duration_minutes
      ),
      timezone,
      layout
    })
  }
}

fn parse_number<T>(
  key: &str,
  value: &str
) -> anyhow::Result<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display
{
  value.parse::<T>().map_err(|err| {
    anyhow!(
      "invalid value for {key}: {value} \
       ({err})"
    )
  })
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    if !path.exists() {
      return Err(anyhow!(
        "config file does not exist: {}",
        path.display()
      ));
    }
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      let path = expand_tilde(Path::new(
        trimmed
      ));
      if !path.exists() {
        return Err(anyhow!(
          "{CONFIG_ENV_VAR} points at a \
           missing file: {}",
          path.display()
        ));
      }
      return Ok(Some(path));
    }
  }

  let candidate = dirs::config_dir().map(
    |dir| {
      dir
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
    }
  );
  Ok(candidate.filter(|path| path.exists()))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_resolve_to_shop_hours() {
    let settings = Config::default()
      .resolve()
      .expect("defaults resolve");

    assert_eq!(settings.start_hour, 8);
    assert_eq!(settings.end_hour, 20);
    assert_eq!(settings.week_start, Weekday::Mon);
    assert_eq!(
      settings.default_duration,
      Duration::minutes(60)
    );
    assert_eq!(
      settings.layout,
      LayoutSettings::default()
    );
  }

  #[test]
  fn overrides_replace_values() {
    let mut cfg = Config::default();
    cfg
      .apply_overrides(vec![
        (
          "rc.calendar.start_time".to_string(),
          "07:30".to_string()
        ),
        (
          "calendar.week_start".to_string(),
          "Sunday".to_string()
        ),
        (
          "layout.hour_height".to_string(),
          "60".to_string()
        ),
      ])
      .expect("apply overrides");

    let settings =
      cfg.resolve().expect("resolve");
    assert_eq!(settings.start_hour, 7);
    assert_eq!(settings.week_start, Weekday::Sun);
    assert_eq!(settings.layout.hour_height, 60.0);
  }

  #[test]
  fn unknown_override_key_fails() {
    let mut cfg = Config::default();
    let err = cfg
      .apply_overrides(vec![(
        "calendar.colour".to_string(),
        "red".to_string()
      )])
      .expect_err("unknown key");
    assert!(
      err.to_string().contains("calendar.colour")
    );
  }

  #[test]
  fn inverted_hours_fail_fast() {
    let mut cfg = Config::default();
    cfg.calendar.start_time = "20:00".to_string();
    cfg.calendar.end_time = "08:00".to_string();
    assert!(cfg.resolve().is_err());
  }

  #[test]
  fn unknown_week_start_is_rejected() {
    let mut cfg = Config::default();
    cfg.calendar.week_start = "caturday".to_string();
    assert!(cfg.resolve().is_err());

    cfg.calendar.week_start = "saturday".to_string();
    assert_eq!(
      cfg.resolve().expect("saturday").week_start,
      Weekday::Sat
    );
  }

  #[test]
  fn blank_values_are_sanitised() {
    let mut cfg = Config::default();
    cfg
      .apply_overrides(vec![(
        "calendar.end_time".to_string(),
        "  ".to_string()
      )])
      .expect("apply blank");
    assert_eq!(cfg.calendar.end_time, "20:00");
  }
}
