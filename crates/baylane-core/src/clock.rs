use chrono::{
  Datelike,
  Duration,
  Months,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Weekday
};

/// Calendar arithmetic the layout engine
/// needs. Everything is expressed in the
/// display's local calendar; implementations
/// decide what a "day" is.
pub trait CalendarClock {
  fn date_of(
    &self,
    instant: NaiveDateTime
  ) -> NaiveDate;

  fn start_of_day(
    &self,
    date: NaiveDate
  ) -> NaiveDateTime;

  /// `None` when the result falls outside
  /// the representable calendar.
  fn checked_add_days(
    &self,
    date: NaiveDate,
    days: i64
  ) -> Option<NaiveDate>;

  /// Moves by whole months, clamping the day
  /// to the length of the target month.
  fn checked_add_months(
    &self,
    date: NaiveDate,
    months: i64
  ) -> Option<NaiveDate>;

  fn start_of_week(
    &self,
    date: NaiveDate,
    week_start: Weekday
  ) -> NaiveDate;

  fn first_day_of_month(
    &self,
    date: NaiveDate
  ) -> NaiveDate;

  fn last_day_of_month(
    &self,
    date: NaiveDate
  ) -> NaiveDate;

  /// Saturates at the calendar limits.
  /// [`crate::window::DisplayWindow::new`]
  /// refuses dates near those limits, so
  /// layout arithmetic stays in range.
  fn add_days(
    &self,
    date: NaiveDate,
    days: i64
  ) -> NaiveDate {
    self
      .checked_add_days(date, days)
      .unwrap_or(if days < 0 {
        NaiveDate::MIN
      } else {
        NaiveDate::MAX
      })
  }

  fn end_of_week(
    &self,
    date: NaiveDate,
    week_start: Weekday
  ) -> NaiveDate {
    let start =
      self.start_of_week(date, week_start);
    self.add_days(start, 6)
  }

  /// Half-open `[start, end)` bounds of a
  /// calendar day.
  fn day_bounds(
    &self,
    date: NaiveDate
  ) -> DayBounds {
    DayBounds {
      start: self.start_of_day(date),
      end:   self.start_of_day(
        self.add_days(date, 1)
      )
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DayBounds {
  pub start: NaiveDateTime,
  pub end:   NaiveDateTime
}

/// Proleptic Gregorian calendar backed by
/// chrono's naive types.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub struct NaiveCalendar;

impl CalendarClock for NaiveCalendar {
  fn date_of(
    &self,
    instant: NaiveDateTime
  ) -> NaiveDate {
    instant.date()
  }

  fn start_of_day(
    &self,
    date: NaiveDate
  ) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
  }

  fn checked_add_days(
    &self,
    date: NaiveDate,
    days: i64
  ) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(
      |delta| date.checked_add_signed(delta)
    )
  }

  fn checked_add_months(
    &self,
    date: NaiveDate,
    months: i64
  ) -> Option<NaiveDate> {
    let span = Months::new(
      u32::try_from(months.unsigned_abs())
        .ok()?
    );
    if months < 0 {
      date.checked_sub_months(span)
    } else {
      date.checked_add_months(span)
    }
  }

  fn start_of_week(
    &self,
    date: NaiveDate,
    week_start: Weekday
  ) -> NaiveDate {
    let day_idx = date
      .weekday()
      .num_days_from_monday()
      as i64;
    let start_idx = week_start
      .num_days_from_monday()
      as i64;
    let diff =
      (7 + day_idx - start_idx) % 7;
    self.add_days(date, -diff)
  }

  fn first_day_of_month(
    &self,
    date: NaiveDate
  ) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
  }

  fn last_day_of_month(
    &self,
    date: NaiveDate
  ) -> NaiveDate {
    let (next_year, next_month) =
      if date.month() >= 12 {
        (date.year().saturating_add(1), 1)
      } else {
        (date.year(), date.month() + 1)
      };
    NaiveDate::from_ymd_opt(
      next_year, next_month, 1
    )
    .map(|first| self.add_days(first, -1))
    .unwrap_or(date)
  }
}
