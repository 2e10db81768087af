use chrono::NaiveDateTime;
use serde::Serialize;

use crate::clock::CalendarClock;
use crate::event::{
  Event,
  EventId
};
use crate::window::DisplayWindow;

pub const HOUR_HEIGHT: f64 = 48.0;
pub const MIN_VISIBLE_HEIGHT: f64 = 22.0;

/// Where a projected event sits relative to
/// the window hours. Anything but `Inside`
/// is a pinned sliver at the window edge.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HoursOverflow {
  Inside,
  BeforeHours,
  AfterHours
}

#[derive(
  Debug, Clone, Copy, PartialEq, Serialize,
)]
pub struct TimedLayout {
  pub event_id: EventId,
  pub top:      f64,
  pub height:   f64,
  pub overflow: HoursOverflow
}

/// Maps timestamps onto the vertical axis of
/// a day column, in abstract layout units.
#[derive(
  Debug, Clone, Copy, PartialEq, Serialize,
)]
pub struct TimeAxis {
  hour_height:        f64,
  min_visible_height: f64
}

impl Default for TimeAxis {
  fn default() -> Self {
    Self {
      hour_height:        HOUR_HEIGHT,
      min_visible_height: MIN_VISIBLE_HEIGHT
    }
  }
}

impl TimeAxis {
  pub fn new(
    hour_height: f64,
    min_visible_height: f64
  ) -> Self {
    Self {
      hour_height,
      min_visible_height
    }
  }

  pub fn hour_height(&self) -> f64 {
    self.hour_height
  }

  pub fn min_visible_height(&self) -> f64 {
    self.min_visible_height
  }

  pub fn window_height(
    &self,
    window: &DisplayWindow
  ) -> f64 {
    f64::from(window.hours())
      * self.hour_height
  }

  fn span(
    &self,
    from: NaiveDateTime,
    to: NaiveDateTime
  ) -> f64 {
    let minutes =
      (to - from).num_seconds() as f64
        / 60.0;
    minutes / 60.0 * self.hour_height
  }

  /// The caller has already checked that
  /// the event overlaps the window's day.
  pub fn project<C, P>(
    &self,
    clock: &C,
    event: &Event<P>,
    window: &DisplayWindow
  ) -> TimedLayout
  where
    C: CalendarClock
  {
    let floor = window.floor(clock);
    let ceiling = window.ceiling(clock);
    let effective_start =
      event.start.max(floor);
    let effective_end =
      event.end.min(ceiling);

    if effective_end <= effective_start {
      let (top, overflow) =
        if event.end <= floor {
          (0.0, HoursOverflow::BeforeHours)
        } else {
          (
            self.window_height(window),
            HoursOverflow::AfterHours
          )
        };
      tracing::trace!(
        id = %event.id,
        ?overflow,
        "event outside window hours; pinned"
      );
      return TimedLayout {
        event_id: event.id,
        top,
        height: self.min_visible_height,
        overflow
      };
    }

    let top =
      self.span(floor, effective_start);
    let raw_height = self.span(
      effective_start,
      effective_end
    );

    TimedLayout {
      event_id: event.id,
      top,
      height: raw_height
        .max(self.min_visible_height),
      overflow: HoursOverflow::Inside
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::clock::NaiveCalendar;

  fn at(
    hour: u32,
    minute: u32
  ) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 15)
      .and_then(|d| {
        d.and_hms_opt(hour, minute, 0)
      })
      .expect("valid timestamp")
  }

  fn window() -> DisplayWindow {
    DisplayWindow::new(
      NaiveDate::from_ymd_opt(2025, 3, 15)
        .expect("valid date"),
      8,
      20
    )
    .expect("valid window")
  }

  #[test]
  fn contained_event_is_not_clipped() {
    let event =
      Event::new(1, at(9, 0), at(11, 0), ());
    let layout = TimeAxis::default()
      .project(&NaiveCalendar, &event, &window());

    assert_eq!(layout.top, 48.0);
    assert_eq!(layout.height, 96.0);
    assert_eq!(
      layout.overflow,
      HoursOverflow::Inside
    );
  }

  #[test]
  fn early_start_is_clipped_and_raised_to_minimum()
  {
    let event =
      Event::new(2, at(7, 0), at(8, 15), ());
    let layout = TimeAxis::default()
      .project(&NaiveCalendar, &event, &window());

    assert_eq!(layout.top, 0.0);
    assert_eq!(layout.height, 22.0);
  }

  #[test]
  fn late_end_is_clipped_to_ceiling() {
    let event =
      Event::new(3, at(18, 30), at(22, 0), ());
    let layout = TimeAxis::default()
      .project(&NaiveCalendar, &event, &window());

    assert_eq!(layout.top, 10.5 * 48.0);
    assert_eq!(layout.height, 1.5 * 48.0);
  }

  #[test]
  fn events_outside_hours_are_pinned() {
    let axis = TimeAxis::default();
    let before =
      Event::new(4, at(6, 0), at(7, 0), ());
    let after =
      Event::new(5, at(21, 0), at(22, 0), ());

    let early = axis.project(
      &NaiveCalendar,
      &before,
      &window()
    );
    let late = axis.project(
      &NaiveCalendar,
      &after,
      &window()
    );

    assert_eq!(early.top, 0.0);
    assert_eq!(early.height, 22.0);
    assert_eq!(
      early.overflow,
      HoursOverflow::BeforeHours
    );
    assert_eq!(late.top, 12.0 * 48.0);
    assert_eq!(late.height, 22.0);
    assert_eq!(
      late.overflow,
      HoursOverflow::AfterHours
    );
  }

  #[test]
  fn ending_exactly_at_floor_counts_as_before() {
    let event =
      Event::new(6, at(7, 0), at(8, 0), ());
    let layout = TimeAxis::default()
      .project(&NaiveCalendar, &event, &window());
    assert_eq!(
      layout.overflow,
      HoursOverflow::BeforeHours
    );
  }

  #[test]
  fn custom_hour_height_scales_output() {
    let axis = TimeAxis::new(60.0, 20.0);
    let event =
      Event::new(7, at(10, 0), at(10, 30), ());
    let layout =
      axis.project(&NaiveCalendar, &event, &window());

    assert_eq!(layout.top, 120.0);
    assert_eq!(layout.height, 30.0);
  }
}
