use chrono::{
  Days,
  Duration,
  NaiveDate,
  NaiveDateTime
};
use serde::Serialize;

use crate::clock::CalendarClock;
use crate::error::LayoutError;

/// Widest reach of any view from its anchor
/// date: a month grid spans at most six
/// weeks around the month.
const LAYOUT_MARGIN_DAYS: u64 = 45;

/// Visible vertical axis of a day column:
/// `[start_hour, end_hour)` on `date`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
pub struct DisplayWindow {
  date:       NaiveDate,
  start_hour: u32,
  end_hour:   u32
}

impl DisplayWindow {
  pub fn new(
    date: NaiveDate,
    start_hour: u32,
    end_hour: u32
  ) -> Result<Self, LayoutError> {
    if start_hour >= end_hour
      || end_hour > 24
    {
      return Err(
        LayoutError::InvalidWindow {
          start_hour,
          end_hour
        }
      );
    }

    let margin = Days::new(LAYOUT_MARGIN_DAYS);
    if date.checked_sub_days(margin).is_none()
      || date.checked_add_days(margin).is_none()
    {
      return Err(LayoutError::DateOutOfRange {
        date
      });
    }

    Ok(Self {
      date,
      start_hour,
      end_hour
    })
  }

  pub fn date(&self) -> NaiveDate {
    self.date
  }

  pub fn start_hour(&self) -> u32 {
    self.start_hour
  }

  pub fn end_hour(&self) -> u32 {
    self.end_hour
  }

  pub fn hours(&self) -> u32 {
    self.end_hour - self.start_hour
  }

  /// Same hours, anchored on another day.
  #[must_use]
  pub fn on(
    &self,
    date: NaiveDate
  ) -> Self {
    Self { date, ..*self }
  }

  pub fn floor<C: CalendarClock>(
    &self,
    clock: &C
  ) -> NaiveDateTime {
    clock.start_of_day(self.date)
      + Duration::hours(i64::from(
        self.start_hour
      ))
  }

  /// `end_hour == 24` lands on the next
  /// day's midnight.
  pub fn ceiling<C: CalendarClock>(
    &self,
    clock: &C
  ) -> NaiveDateTime {
    clock.start_of_day(self.date)
      + Duration::hours(i64::from(
        self.end_hour
      ))
  }
}
