use crate::clock::{
  CalendarClock,
  DayBounds
};
use crate::event::Event;

/// True when the event's start and end fall
/// on different calendar dates. Elapsed
/// duration plays no part.
pub fn is_multi_day<C, P>(
  clock: &C,
  event: &Event<P>
) -> bool
where
  C: CalendarClock
{
  clock.date_of(event.start)
    != clock.date_of(event.end)
}

/// Half-open intersection of `[start, end)`
/// with the day's `[start, end)`. Touching
/// at a boundary is not an overlap.
pub fn overlaps_day<P>(
  event: &Event<P>,
  day: DayBounds
) -> bool {
  event.start < day.end
    && event.end > day.start
}
