use chrono::{
  Datelike,
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
use crate::event::{
  Event,
  EventId
};
use crate::interval::{
  is_multi_day,
  overlaps_day
};
use crate::packer::{
  SpanLayout,
  pack
};

const DAYS_PER_WEEK: usize = 7;

/// One calendar day of the month grid.
/// `hidden` holds the events past the
/// display cap, so the overflow count is
/// `hidden.len()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthCell {
  pub index:    usize,
  pub date:     NaiveDate,
  pub in_month: bool,
  pub events:   Vec<EventId>,
  pub hidden:   Vec<EventId>
}

impl MonthCell {
  pub fn overflow(&self) -> usize {
    self.hidden.len()
  }
}

/// A week row of the grid. Spanning bars are
/// packed per row so they restart at the
/// left edge of each week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
  pub index:      usize,
  pub week_start: NaiveDate,
  pub spans:      Vec<SpanLayout>,
  pub lanes:      usize
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthLayout {
  pub year:       i32,
  pub month:      u32,
  pub grid_start: NaiveDate,
  pub cells:      Vec<MonthCell>,
  pub rows:       Vec<MonthRow>
}

impl MonthLayout {
  pub fn cell(
    &self,
    index: usize
  ) -> Option<&MonthCell> {
    self.cells.get(index)
  }

  pub fn cell_for(
    &self,
    date: NaiveDate
  ) -> Option<&MonthCell> {
    self
      .cells
      .iter()
      .find(|cell| cell.date == date)
  }
}

/// Grid start and cell count: from the start
/// of the week holding the 1st to the end of
/// the week holding the last day, rounded up
/// to whole weeks.
pub(super) fn grid_extent<C>(
  clock: &C,
  anchor: NaiveDate,
  week_start: Weekday
) -> (NaiveDate, usize)
where
  C: CalendarClock
{
  let first =
    clock.first_day_of_month(anchor);
  let last =
    clock.last_day_of_month(anchor);
  let grid_start =
    clock.start_of_week(first, week_start);
  let grid_end =
    clock.end_of_week(last, week_start);

  let total_days = (grid_end - grid_start)
    .num_days()
    .max(0) as usize
    + 1;
  let weeks =
    total_days.div_ceil(DAYS_PER_WEEK);
  (grid_start, weeks * DAYS_PER_WEEK)
}

pub(super) fn assemble<C, P>(
  clock: &C,
  events: &[&Event<P>],
  anchor: NaiveDate,
  week_start: Weekday,
  cell_limit: usize
) -> MonthLayout
where
  C: CalendarClock
{
  let (grid_start, cell_count) =
    grid_extent(clock, anchor, week_start);
  let bounds = day_bounds_from(
    clock, grid_start, cell_count
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

  let rows = bounds
    .chunks(DAYS_PER_WEEK)
    .enumerate()
    .map(|(index, week)| {
      let spans = pack(
        spanning.iter().copied().filter(
          |event| overlaps_any(week, *event)
        ),
        |event| column_range(week, event)
      );
      MonthRow {
        index,
        week_start: clock
          .date_of(week[0].start),
        lanes: lane_count(&spans),
        spans
      }
    })
    .collect();

  let cells = bounds
    .iter()
    .enumerate()
    .map(|(index, day)| {
      let date = clock.date_of(day.start);
      let mut listed: Vec<EventId> = single
        .iter()
        .filter(|event| {
          overlaps_day(**event, *day)
        })
        .map(|event| event.id)
        .collect();
      let hidden = if listed.len() > cell_limit
      {
        listed.split_off(cell_limit)
      } else {
        Vec::new()
      };
      MonthCell {
        index,
        date,
        in_month: date.month()
          == anchor.month()
          && date.year() == anchor.year(),
        events: listed,
        hidden
      }
    })
    .collect();

  MonthLayout {
    year: anchor.year(),
    month: anchor.month(),
    grid_start,
    cells,
    rows
  }
}
