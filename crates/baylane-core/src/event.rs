use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{
  Deserialize,
  Serialize
};
use tracing::warn;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A single materialised occurrence, with
/// `start`/`end` already in the display's
/// local calendar. `end` is exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<P = ()> {
  pub id:      EventId,
  pub start:   NaiveDateTime,
  pub end:     NaiveDateTime,
  pub payload: P
}

impl<P> Event<P> {
  pub fn new(
    id: u64,
    start: NaiveDateTime,
    end: NaiveDateTime,
    payload: P
  ) -> Self {
    Self {
      id: EventId(id),
      start,
      end,
      payload
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
  NonPositiveDuration,
  DuplicateId,
  Unparsable
}

impl RejectReason {
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::NonPositiveDuration => {
        "non_positive_duration"
      }
      | Self::DuplicateId => {
        "duplicate_id"
      }
      | Self::Unparsable => "unparsable"
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct Rejection {
  pub id:     EventId,
  pub reason: RejectReason
}

/// Events that passed validation, borrowed
/// from the caller in their original order.
#[derive(Debug)]
pub struct Ingested<'a, P> {
  pub accepted: Vec<&'a Event<P>>,
  pub rejected: Vec<Rejection>
}

/// Drops events that cannot be laid out
/// instead of failing the whole view. The
/// first event with a given id wins.
#[tracing::instrument(
  level = "debug",
  skip_all,
  fields(count = events.len())
)]
pub fn ingest<P>(
  events: &[Event<P>]
) -> Ingested<'_, P> {
  let mut accepted =
    Vec::with_capacity(events.len());
  let mut rejected = Vec::new();
  let mut seen = HashSet::new();

  for event in events {
    let reason = if event.end
      <= event.start
    {
      Some(
        RejectReason::NonPositiveDuration
      )
    } else if !seen.insert(event.id) {
      Some(RejectReason::DuplicateId)
    } else {
      None
    };

    match reason {
      | Some(reason) => {
        warn!(
          id = %event.id,
          start = %event.start,
          end = %event.end,
          reason = reason.as_key(),
          "rejecting event"
        );
        rejected.push(Rejection {
          id: event.id,
          reason
        });
      }
      | None => accepted.push(event)
    }
  }

  Ingested {
    accepted,
    rejected
  }
}
