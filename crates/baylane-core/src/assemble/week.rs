use chrono::{
  NaiveDate,
  Weekday
};
use serde::Serialize;

use super::day::lane_count;
use super::{
  column_range,
  day_bounds_from,
  overlaps_any
};
use crate::clock::CalendarClock;
use crate::event::Event;
use crate::interval::{
  is_multi_day,
  overlaps_day
};
use crate::packer::{
  SpanLayout,
  pack
};
use crate::projector::{
  TimeAxis,
  TimedLayout
};
use crate::window::DisplayWindow;

const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayColumn {
  pub index: usize,
  pub date:  NaiveDate,
  pub timed: Vec<TimedLayout>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekLayout {
  pub week_start:    NaiveDate,
  pub columns:       Vec<DayColumn>,
  pub all_day:       Vec<SpanLayout>,
  pub all_day_lanes: usize,
  pub grid_height:   f64
}

impl WeekLayout {
  pub fn column(
    &self,
    index: usize
  ) -> Option<&DayColumn> {
    self.columns.get(index)
  }
}

pub(super) fn assemble<C, P>(
  clock: &C,
  axis: &TimeAxis,
  events: &[&Event<P>],
  window: &DisplayWindow,
  week_start: Weekday
) -> WeekLayout
where
  C: CalendarClock
{
  let first = clock
    .start_of_week(window.date(), week_start);
  let bounds = day_bounds_from(
    clock,
    first,
    DAYS_PER_WEEK
  );

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

  let columns = bounds
    .iter()
    .enumerate()
    .map(|(index, day)| {
      let date = clock.date_of(day.start);
      let column_window = window.on(date);
      let timed = single
        .iter()
        .copied()
        .filter(|event| {
          overlaps_day(*event, *day)
        })
        .map(|event| {
          axis.project(
            clock,
            event,
            &column_window
          )
        })
        .collect();
      DayColumn { index, date, timed }
    })
    .collect();

  WeekLayout {
    week_start: first,
    columns,
    all_day_lanes: lane_count(&all_day),
    all_day,
    grid_height: axis.window_height(window)
  }
}
