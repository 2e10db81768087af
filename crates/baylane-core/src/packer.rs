use serde::Serialize;

use crate::event::{
  Event,
  EventId
};

/// Contiguous run of visible day columns.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
pub struct ColumnRange {
  pub start_column: usize,
  pub column_span:  usize
}

impl ColumnRange {
  pub fn new(
    start_column: usize,
    column_span: usize
  ) -> Self {
    Self {
      start_column,
      column_span
    }
  }

  pub fn end_column(&self) -> usize {
    self.start_column + self.column_span
  }

  pub fn overlaps(
    &self,
    other: &ColumnRange
  ) -> bool {
    other.start_column < self.end_column()
      && self.start_column
        < other.end_column()
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
pub struct SpanLayout {
  pub event_id:     EventId,
  pub row:          usize,
  pub start_column: usize,
  pub column_span:  usize
}

impl SpanLayout {
  pub fn columns(&self) -> ColumnRange {
    ColumnRange::new(
      self.start_column,
      self.column_span
    )
  }
}

/// First-fit lane assignment. Rows are not
/// guaranteed minimal; the heuristic is kept
/// as is so row indices stay stable.
#[derive(Debug, Default)]
pub struct RowPacker {
  rows: Vec<Vec<ColumnRange>>
}

impl RowPacker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn row_count(&self) -> usize {
    self.rows.len()
  }

  /// Places `range` in the lowest row where
  /// it overlaps nothing, opening a new row
  /// when none fits.
  pub fn place(
    &mut self,
    range: ColumnRange
  ) -> usize {
    let free = self.rows.iter().position(
      |row| {
        row
          .iter()
          .all(|item| !item.overlaps(&range))
      }
    );

    match free {
      | Some(idx) => {
        self.rows[idx].push(range);
        idx
      }
      | None => {
        self.rows.push(vec![range]);
        self.rows.len() - 1
      }
    }
  }
}

/// Packs events in the order given. Callers
/// sort upstream.
pub fn pack<'a, P, I, F>(
  events: I,
  mut columns_of: F
) -> Vec<SpanLayout>
where
  P: 'a,
  I: IntoIterator<Item = &'a Event<P>>,
  F: FnMut(&Event<P>) -> ColumnRange
{
  let mut packer = RowPacker::new();
  let layouts: Vec<SpanLayout> = events
    .into_iter()
    .map(|event| {
      let range = columns_of(event);
      let row = packer.place(range);
      SpanLayout {
        event_id: event.id,
        row,
        start_column: range.start_column,
        column_span: range.column_span
      }
    })
    .collect();

  tracing::trace!(
    events = layouts.len(),
    rows = packer.row_count(),
    "packed spanning events"
  );
  layouts
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    NaiveDateTime
  };

  use super::*;

  fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
      .and_then(|d| d.and_hms_opt(9, 0, 0))
      .expect("valid timestamp")
  }

  fn placeholder(
    id: u64,
    columns: (usize, usize)
  ) -> (Event<(usize, usize)>, ColumnRange)
  {
    let event = Event::new(
      id,
      stamp(),
      stamp() + chrono::Duration::hours(1),
      columns
    );
    (event, ColumnRange::new(columns.0, columns.1))
  }

  #[test]
  fn overlap_is_exclusive_at_edges() {
    let monday_tuesday = ColumnRange::new(0, 2);
    let wednesday = ColumnRange::new(2, 1);
    let tuesday = ColumnRange::new(1, 1);

    assert!(!monday_tuesday.overlaps(&wednesday));
    assert!(monday_tuesday.overlaps(&tuesday));
    assert!(tuesday.overlaps(&monday_tuesday));
  }

  #[test]
  fn three_overlapping_bars_take_three_rows() {
    // Mon-Wed, Tue, Tue-Thu
    let events = vec![
      placeholder(1, (0, 3)).0,
      placeholder(2, (1, 1)).0,
      placeholder(3, (1, 3)).0,
    ];

    let layouts =
      pack(&events, |e| ColumnRange::new(e.payload.0, e.payload.1));

    let rows: Vec<usize> =
      layouts.iter().map(|l| l.row).collect();
    assert_eq!(rows, vec![0, 1, 2]);
  }

  #[test]
  fn first_fit_reuses_lowest_free_row() {
    let mut packer = RowPacker::new();
    assert_eq!(
      packer.place(ColumnRange::new(0, 2)),
      0
    );
    assert_eq!(
      packer.place(ColumnRange::new(1, 2)),
      1
    );
    assert_eq!(
      packer.place(ColumnRange::new(3, 2)),
      0
    );
    assert_eq!(
      packer.place(ColumnRange::new(2, 1)),
      0
    );
    assert_eq!(
      packer.place(ColumnRange::new(2, 1)),
      2
    );
    assert_eq!(packer.row_count(), 3);
  }

  #[test]
  fn greedy_is_not_optimal_and_stays_that_way() {
    // [0,1) [2,3) then [1,3) [0,2): optimal
    // colouring fits in 2 rows, first fit
    // needs 3.
    let mut packer = RowPacker::new();
    let rows: Vec<usize> = [
      ColumnRange::new(0, 1),
      ColumnRange::new(2, 1),
      ColumnRange::new(1, 2),
      ColumnRange::new(0, 2),
    ]
    .into_iter()
    .map(|range| packer.place(range))
    .collect();

    assert_eq!(rows, vec![0, 0, 1, 2]);
  }

  #[test]
  fn layouts_carry_columns() {
    let (event, range) = placeholder(9, (4, 3));
    let layouts =
      pack([&event], |_| range);
    assert_eq!(
      layouts,
      vec![SpanLayout {
        event_id:     EventId(9),
        row:          0,
        start_column: 4,
        column_span:  3
      }]
    );
  }
}
