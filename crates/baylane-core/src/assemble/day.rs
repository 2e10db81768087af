use chrono::NaiveDate;
use serde::Serialize;

use super::{
  column_range,
  overlaps_any
};
use crate::clock::CalendarClock;
use crate::event::Event;
use crate::interval::is_multi_day;
use crate::packer::{
  SpanLayout,
  pack
};
use crate::projector::{
  TimeAxis,
  TimedLayout
};
use crate::window::DisplayWindow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLayout {
  pub window:        DisplayWindow,
  pub timed:         Vec<TimedLayout>,
  pub all_day:       Vec<SpanLayout>,
  pub all_day_lanes: usize,
  pub grid_height:   f64
}

impl DayLayout {
  pub fn day(&self) -> NaiveDate {
    self.window.date()
  }
}

pub(super) fn assemble<C, P>(
  clock: &C,
  axis: &TimeAxis,
  events: &[&Event<P>],
  window: &DisplayWindow
) -> DayLayout
where
  C: CalendarClock
{
  let bounds =
    [clock.day_bounds(window.date())];

  let (spanning, single): (Vec<_>, Vec<_>) =
    events
      .iter()
      .copied()
      .filter(|event| {
        overlaps_any(&bounds, *event)
      })
      .partition(|event| {
        is_multi_day(clock, *event)
      });

  let all_day = pack(spanning, |event| {
    column_range(&bounds, event)
  });
  let timed = single
    .into_iter()
    .map(|event| {
      axis.project(clock, event, window)
    })
    .collect();

  DayLayout {
    window: *window,
    timed,
    all_day_lanes: lane_count(&all_day),
    all_day,
    grid_height: axis.window_height(window)
  }
}

pub(super) fn lane_count(
  layouts: &[SpanLayout]
) -> usize {
  layouts
    .iter()
    .map(|layout| layout.row + 1)
    .max()
    .unwrap_or(0)
}
