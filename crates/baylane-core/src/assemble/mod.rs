mod day;
mod month;
mod week;

use std::str::FromStr;

use anyhow::anyhow;
use chrono::{
  NaiveDate,
  Weekday
};
use serde::Serialize;

pub use self::day::DayLayout;
pub use self::month::{
  MonthCell,
  MonthLayout,
  MonthRow
};
pub use self::week::{
  DayColumn,
  WeekLayout
};
use crate::clock::{
  CalendarClock,
  DayBounds,
  NaiveCalendar
};
use crate::error::LayoutError;
use crate::event::{
  Event,
  Rejection,
  ingest
};
use crate::interval::overlaps_day;
use crate::packer::ColumnRange;
use crate::projector::{
  HOUR_HEIGHT,
  MIN_VISIBLE_HEIGHT,
  TimeAxis
};
use crate::window::DisplayWindow;

pub const MONTH_CELL_LIMIT: usize = 3;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  Day,
  Week,
  Month
}

impl ViewMode {
  pub fn all() -> [Self; 3] {
    [Self::Day, Self::Week, Self::Month]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Day => "day",
      | Self::Week => "week",
      | Self::Month => "month"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | Self::Day => "Day",
      | Self::Week => "Week",
      | Self::Month => "Month"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key.trim() {
      | "day" => Some(Self::Day),
      | "week" => Some(Self::Week),
      | "month" => Some(Self::Month),
      | _ => None
    }
  }
}

impl FromStr for ViewMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::from_key(
      &s.to_ascii_lowercase()
    )
    .ok_or_else(|| {
      anyhow!(
        "unknown view mode: {s} \
         (expected day, week or month)"
      )
    })
  }
}

/// What to lay out, with the parameters
/// each mode needs.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ViewRequest {
  Day {
    window: DisplayWindow
  },
  Week {
    window:     DisplayWindow,
    week_start: Weekday
  },
  Month {
    anchor:     NaiveDate,
    week_start: Weekday
  }
}

impl ViewRequest {
  /// Builds a request from flat parameters.
  /// The window is validated for every mode
  /// so a bad hour range fails the same way
  /// regardless of which view is open.
  pub fn new(
    mode: ViewMode,
    date: NaiveDate,
    start_hour: u32,
    end_hour: u32,
    week_start: Weekday
  ) -> Result<Self, LayoutError> {
    let window = DisplayWindow::new(
      date, start_hour, end_hour
    )?;

    Ok(match mode {
      | ViewMode::Day => {
        Self::Day { window }
      }
      | ViewMode::Week => {
        Self::Week {
          window,
          week_start
        }
      }
      | ViewMode::Month => {
        Self::Month {
          anchor: date,
          week_start
        }
      }
    })
  }

  pub fn mode(&self) -> ViewMode {
    match self {
      | Self::Day { .. } => ViewMode::Day,
      | Self::Week { .. } => ViewMode::Week,
      | Self::Month { .. } => {
        ViewMode::Month
      }
    }
  }

  pub fn date(&self) -> NaiveDate {
    match self {
      | Self::Day { window }
      | Self::Week { window, .. } => {
        window.date()
      }
      | Self::Month { anchor, .. } => {
        *anchor
      }
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Serialize,
)]
pub struct LayoutSettings {
  pub hour_height:        f64,
  pub min_visible_height: f64,
  pub month_cell_limit:   usize
}

impl Default for LayoutSettings {
  fn default() -> Self {
    Self {
      hour_height:        HOUR_HEIGHT,
      min_visible_height: MIN_VISIBLE_HEIGHT,
      month_cell_limit:   MONTH_CELL_LIMIT
    }
  }
}

impl LayoutSettings {
  pub fn validate(
    &self
  ) -> Result<(), LayoutError> {
    if !self.hour_height.is_finite()
      || self.hour_height <= 0.0
    {
      return Err(
        LayoutError::InvalidSetting {
          name:  "hour_height",
          value: self
            .hour_height
            .to_string()
        }
      );
    }

    if !self
      .min_visible_height
      .is_finite()
      || self.min_visible_height < 0.0
    {
      return Err(
        LayoutError::InvalidSetting {
          name:  "min_visible_height",
          value: self
            .min_visible_height
            .to_string()
        }
      );
    }

    Ok(())
  }

  pub fn time_axis(&self) -> TimeAxis {
    TimeAxis::new(
      self.hour_height,
      self.min_visible_height
    )
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
  tag = "mode",
  rename_all = "lowercase"
)]
pub enum ViewLayout {
  Day(DayLayout),
  Week(WeekLayout),
  Month(MonthLayout)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
  pub view:     ViewLayout,
  pub rejected: Vec<Rejection>
}

/// Stateless projection from events and a
/// view request to layout instructions.
#[derive(Debug, Clone)]
pub struct LayoutEngine<C = NaiveCalendar> {
  clock:    C,
  settings: LayoutSettings
}

impl LayoutEngine<NaiveCalendar> {
  pub fn new(
    settings: LayoutSettings
  ) -> Result<Self, LayoutError> {
    Self::with_clock(
      NaiveCalendar,
      settings
    )
  }
}

impl<C: CalendarClock> LayoutEngine<C> {
  pub fn with_clock(
    clock: C,
    settings: LayoutSettings
  ) -> Result<Self, LayoutError> {
    settings.validate()?;
    Ok(Self { clock, settings })
  }

  pub fn clock(&self) -> &C {
    &self.clock
  }

  pub fn settings(
    &self
  ) -> &LayoutSettings {
    &self.settings
  }

  #[tracing::instrument(
    level = "debug",
    skip(self, events),
    fields(
      events = events.len(),
      mode = request.mode().as_key(),
      date = %request.date()
    )
  )]
  pub fn layout<P>(
    &self,
    events: &[Event<P>],
    request: &ViewRequest
  ) -> Layout {
    let ingested = ingest(events);
    let mut accepted = ingested.accepted;
    accepted.sort_by_key(|event| event.start);

    let axis = self.settings.time_axis();
    let view = match *request {
      | ViewRequest::Day { window } => {
        ViewLayout::Day(day::assemble(
          &self.clock,
          &axis,
          &accepted,
          &window
        ))
      }
      | ViewRequest::Week {
        window,
        week_start
      } => ViewLayout::Week(week::assemble(
        &self.clock,
        &axis,
        &accepted,
        &window,
        week_start
      )),
      | ViewRequest::Month {
        anchor,
        week_start
      } => {
        ViewLayout::Month(month::assemble(
          &self.clock,
          &accepted,
          anchor,
          week_start,
          self.settings.month_cell_limit
        ))
      }
    };

    tracing::debug!(
      rejected = ingested.rejected.len(),
      "layout computed"
    );

    Layout {
      view,
      rejected: ingested.rejected
    }
  }
}

/// First and last visible date of a view.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
pub struct Period {
  pub first: NaiveDate,
  pub last:  NaiveDate
}

pub fn period_bounds<C: CalendarClock>(
  clock: &C,
  focus: NaiveDate,
  mode: ViewMode,
  week_start: Weekday
) -> Period {
  match mode {
    | ViewMode::Day => {
      Period {
        first: focus,
        last:  focus
      }
    }
    | ViewMode::Week => {
      let first =
        clock.start_of_week(focus, week_start);
      Period {
        first,
        last: clock.add_days(first, 6)
      }
    }
    | ViewMode::Month => {
      let (first, cells) =
        month::grid_extent(
          clock, focus, week_start
        );
      Period {
        first,
        last: clock
          .add_days(first, cells as i64 - 1)
      }
    }
  }
}

/// Previous/next navigation: one day, seven
/// days or one calendar month per step.
pub fn shift_focus<C: CalendarClock>(
  clock: &C,
  current: NaiveDate,
  mode: ViewMode,
  step: i64
) -> Result<NaiveDate, LayoutError> {
  let shifted = match mode {
    | ViewMode::Day => {
      clock.checked_add_days(current, step)
    }
    | ViewMode::Week => {
      step.checked_mul(7).and_then(|days| {
        clock.checked_add_days(current, days)
      })
    }
    | ViewMode::Month => {
      clock.checked_add_months(current, step)
    }
  };

  shifted.ok_or(
    LayoutError::ShiftOutOfRange {
      date: current,
      unit: mode.as_key(),
      step
    }
  )
}

fn day_bounds_from<C: CalendarClock>(
  clock: &C,
  first: NaiveDate,
  count: usize
) -> Vec<DayBounds> {
  (0..count)
    .map(|offset| {
      clock.day_bounds(
        clock.add_days(first, offset as i64)
      )
    })
    .collect()
}

fn overlaps_any<P>(
  days: &[DayBounds],
  event: &Event<P>
) -> bool {
  days
    .iter()
    .any(|day| overlaps_day(event, *day))
}

/// Columns of `days` the event covers,
/// clipped to the visible run. Only call for
/// events that overlap at least one day.
fn column_range<P>(
  days: &[DayBounds],
  event: &Event<P>
) -> ColumnRange {
  let first = days
    .iter()
    .position(|day| overlaps_day(event, *day))
    .unwrap_or(0);
  let span = days[first..]
    .iter()
    .take_while(|day| {
      overlaps_day(event, **day)
    })
    .count();
  ColumnRange::new(first, span)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn view_mode_keys_roundtrip() {
    for mode in ViewMode::all() {
      assert_eq!(
        ViewMode::from_key(mode.as_key()),
        Some(mode)
      );
    }
    assert!("Week".parse::<ViewMode>().is_ok());
    assert!("year".parse::<ViewMode>().is_err());
  }

  #[test]
  fn request_rejects_bad_window_for_every_mode()
  {
    for mode in ViewMode::all() {
      let result = ViewRequest::new(
        mode,
        date(2025, 3, 15),
        20,
        8,
        Weekday::Mon
      );
      assert!(matches!(
        result,
        Err(LayoutError::InvalidWindow { .. })
      ));
    }
  }

  #[test]
  fn settings_validation() {
    let engine = LayoutEngine::new(
      LayoutSettings {
        hour_height: 0.0,
        ..LayoutSettings::default()
      }
    );
    assert!(matches!(
      engine,
      Err(LayoutError::InvalidSetting {
        name: "hour_height",
        ..
      })
    ));

    let engine = LayoutEngine::new(
      LayoutSettings {
        min_visible_height: -1.0,
        ..LayoutSettings::default()
      }
    );
    assert!(engine.is_err());
    assert!(
      LayoutEngine::new(
        LayoutSettings::default()
      )
      .is_ok()
    );
  }

  #[test]
  fn navigation_steps_by_mode() {
    let clock = NaiveCalendar;
    let focus = date(2025, 1, 31);
    assert_eq!(
      shift_focus(&clock, focus, ViewMode::Day, 1),
      Ok(date(2025, 2, 1))
    );
    assert_eq!(
      shift_focus(&clock, focus, ViewMode::Week, -1),
      Ok(date(2025, 1, 24))
    );
    assert_eq!(
      shift_focus(&clock, focus, ViewMode::Month, 1),
      Ok(date(2025, 2, 28))
    );
  }

  #[test]
  fn oversized_navigation_steps_are_errors() {
    let clock = NaiveCalendar;
    let focus = date(2025, 3, 15);

    assert_eq!(
      shift_focus(
        &clock,
        focus,
        ViewMode::Month,
        4_294_967_297
      ),
      Err(LayoutError::ShiftOutOfRange {
        date: focus,
        unit: "month",
        step: 4_294_967_297
      })
    );
    assert!(
      shift_focus(
        &clock,
        focus,
        ViewMode::Week,
        1_000_000_000_000_000
      )
      .is_err()
    );
    assert!(
      shift_focus(
        &clock,
        focus,
        ViewMode::Week,
        i64::MAX
      )
      .is_err()
    );
    assert!(
      shift_focus(
        &clock,
        focus,
        ViewMode::Day,
        i64::MIN
      )
      .is_err()
    );
  }

  #[test]
  fn period_bounds_cover_visible_dates() {
    let clock = NaiveCalendar;
    let focus = date(2025, 5, 14);

    assert_eq!(
      period_bounds(
        &clock,
        focus,
        ViewMode::Week,
        Weekday::Mon
      ),
      Period {
        first: date(2025, 5, 12),
        last:  date(2025, 5, 18)
      }
    );
    // May 2025: Thu 1st .. Sat 31st.
    assert_eq!(
      period_bounds(
        &clock,
        focus,
        ViewMode::Month,
        Weekday::Mon
      ),
      Period {
        first: date(2025, 4, 28),
        last:  date(2025, 6, 1)
      }
    );
  }

  #[test]
  fn column_range_clips_to_visible_days() {
    let clock = NaiveCalendar;
    let days =
      day_bounds_from(&clock, date(2025, 3, 10), 7);
    let event = Event::new(
      1,
      date(2025, 3, 8)
        .and_hms_opt(10, 0, 0)
        .expect("valid"),
      date(2025, 3, 12)
        .and_hms_opt(0, 0, 0)
        .expect("valid"),
      ()
    );

    assert!(overlaps_any(&days, &event));
    assert_eq!(
      column_range(&days, &event),
      ColumnRange::new(0, 2)
    );
  }
}
