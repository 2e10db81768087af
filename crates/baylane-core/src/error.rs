use chrono::NaiveDate;
use thiserror::Error;

/// Caller-side mistakes that abort a layout
/// computation. Data problems in individual
/// events never surface here; those are
/// reported through
/// [`crate::event::Rejection`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
  #[error(
    "invalid display window: start hour \
     {start_hour} must be below end hour \
     {end_hour} and both within 0..=24"
  )]
  InvalidWindow {
    start_hour: u32,
    end_hour:   u32
  },

  #[error(
    "date {date} is too close to the \
     calendar limits to lay out"
  )]
  DateOutOfRange {
    date: NaiveDate
  },

  #[error(
    "cannot move {step} {unit}(s) from \
     {date}: outside the calendar range"
  )]
  ShiftOutOfRange {
    date: NaiveDate,
    unit: &'static str,
    step: i64
  },

  #[error(
    "invalid layout setting {name}: \
     {value}"
  )]
  InvalidSetting {
    name:  &'static str,
    value: String
  }
}
