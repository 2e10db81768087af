//! Property checks for the layout engine: packed rows never collide,
//! every visible event is placed exactly once, and repeated layouts
//! are identical.

use std::collections::HashMap;

use baylane_core::clock::CalendarClock;
use baylane_core::interval::overlaps_day;
use baylane_core::packer::SpanLayout;
use baylane_core::{
  Event,
  EventId,
  LayoutEngine,
  LayoutSettings,
  NaiveCalendar,
  ViewLayout,
  ViewMode,
  ViewRequest
};
use chrono::{
  Duration,
  NaiveDate,
  Weekday
};
use proptest::prelude::*;

const MINUTES_PER_DAY: i64 = 24 * 60;

fn focus() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 5, 14)
    .expect("valid date")
}

fn base() -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 4, 20)
    .expect("valid date")
}

/// `(start offset, duration)` in minutes from `base()`.
fn events_strategy()
-> impl Strategy<Value = Vec<Event>> {
  prop::collection::vec(
    (0..50 * MINUTES_PER_DAY, -120i64..6 * MINUTES_PER_DAY),
    0..40
  )
  .prop_map(|specs| {
    let origin = base()
      .and_hms_opt(0, 0, 0)
      .expect("midnight");
    specs
      .into_iter()
      .enumerate()
      .map(|(idx, (offset, duration))| {
        let start = origin + Duration::minutes(offset);
        Event::new(
          idx as u64 + 1,
          start,
          start + Duration::minutes(duration),
          ()
        )
      })
      .collect()
  })
}

fn week_start_strategy() -> impl Strategy<Value = Weekday> {
  prop::sample::select(vec![
    Weekday::Mon,
    Weekday::Sun,
    Weekday::Sat,
  ])
}

fn engine() -> LayoutEngine {
  LayoutEngine::new(LayoutSettings::default())
    .expect("default settings")
}

fn assert_rows_disjoint(spans: &[SpanLayout]) {
  for (i, a) in spans.iter().enumerate() {
    for b in spans.iter().skip(i + 1) {
      if a.row == b.row {
        assert!(
          !a.columns().overlaps(&b.columns()),
          "{a:?} and {b:?} share row {}",
          a.row
        );
      }
    }
  }
}

/// Ids of accepted events overlapping any of `days`.
fn visible_ids(
  events: &[Event],
  first: NaiveDate,
  days: i64
) -> Vec<EventId> {
  let clock = NaiveCalendar;
  let mut ids: Vec<EventId> = events
    .iter()
    .filter(|event| event.end > event.start)
    .filter(|event| {
      (0..days).any(|offset| {
        overlaps_day(
          *event,
          clock.day_bounds(clock.add_days(first, offset))
        )
      })
    })
    .map(|event| event.id)
    .collect();
  ids.sort();
  ids
}

fn placement_counts(
  ids: impl IntoIterator<Item = EventId>
) -> HashMap<EventId, usize> {
  let mut counts = HashMap::new();
  for id in ids {
    *counts.entry(id).or_insert(0) += 1;
  }
  counts
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(128))]

  #[test]
  fn week_places_every_visible_event_once(
    events in events_strategy(),
    week_start in week_start_strategy()
  ) {
    let request = ViewRequest::new(
      ViewMode::Week,
      focus(),
      8,
      20,
      week_start
    )
    .expect("valid request");
    let ViewLayout::Week(week) =
      engine().layout(&events, &request).view
    else {
      panic!("expected week layout");
    };

    assert_rows_disjoint(&week.all_day);

    let placed = placement_counts(
      week
        .all_day
        .iter()
        .map(|span| span.event_id)
        .chain(
          week
            .columns
            .iter()
            .flat_map(|column| column.timed.iter())
            .map(|timed| timed.event_id)
        )
    );
    let expected =
      visible_ids(&events, week.week_start, 7);

    prop_assert_eq!(placed.len(), expected.len());
    for id in expected {
      prop_assert_eq!(placed.get(&id).copied(), Some(1));
    }
  }

  #[test]
  fn day_places_every_visible_event_once(
    events in events_strategy(),
    offset in 0i64..14
  ) {
    let day = focus() + Duration::days(offset);
    let request = ViewRequest::new(
      ViewMode::Day,
      day,
      8,
      20,
      Weekday::Mon
    )
    .expect("valid request");
    let ViewLayout::Day(layout) =
      engine().layout(&events, &request).view
    else {
      panic!("expected day layout");
    };

    assert_rows_disjoint(&layout.all_day);
    prop_assert!(
      layout.all_day.iter().all(|span| span.column_span == 1)
    );
    prop_assert!(
      layout.timed.iter().all(|timed| timed.height >= 22.0)
    );

    let placed = placement_counts(
      layout
        .all_day
        .iter()
        .map(|span| span.event_id)
        .chain(layout.timed.iter().map(|timed| timed.event_id))
    );
    let expected = visible_ids(&events, day, 1);

    prop_assert_eq!(placed.len(), expected.len());
    for id in expected {
      prop_assert_eq!(placed.get(&id).copied(), Some(1));
    }
  }

  #[test]
  fn month_rows_never_collide_and_keep_every_event(
    events in events_strategy(),
    week_start in week_start_strategy()
  ) {
    let request = ViewRequest::new(
      ViewMode::Month,
      focus(),
      8,
      20,
      week_start
    )
    .expect("valid request");
    let ViewLayout::Month(month) =
      engine().layout(&events, &request).view
    else {
      panic!("expected month layout");
    };

    prop_assert_eq!(month.cells.len() % 7, 0);
    prop_assert_eq!(month.rows.len() * 7, month.cells.len());
    for row in &month.rows {
      assert_rows_disjoint(&row.spans);
    }
    for cell in &month.cells {
      prop_assert!(cell.events.len() <= 3);
    }

    let mut seen: Vec<EventId> = month
      .rows
      .iter()
      .flat_map(|row| row.spans.iter().map(|span| span.event_id))
      .chain(
        month
          .cells
          .iter()
          .flat_map(|cell| cell.events.iter().chain(cell.hidden.iter()))
          .copied()
      )
      .collect();
    seen.sort();
    seen.dedup();

    prop_assert_eq!(
      seen,
      visible_ids(&events, month.grid_start, month.cells.len() as i64)
    );
  }

  #[test]
  fn layouts_are_deterministic(
    events in events_strategy(),
    mode in prop::sample::select(ViewMode::all().to_vec())
  ) {
    let request = ViewRequest::new(
      mode,
      focus(),
      7,
      19,
      Weekday::Mon
    )
    .expect("valid request");
    let engine = engine();

    prop_assert_eq!(
      engine.layout(&events, &request),
      engine.layout(&events, &request)
    );
  }
}
