use std::fs::File;
use std::io::{
  self,
  BufReader,
  Read
};
use std::path::Path;

use anyhow::Context;
use chrono::Duration;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{
  Map,
  Value
};
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::parse_instant;
use crate::event::{
  Event,
  EventId,
  RejectReason,
  Rejection
};

/// Everything in a record besides
/// `id`/`start`/`end`. The engine never
/// looks inside.
pub type Payload = Map<String, Value>;

#[derive(Debug, Deserialize)]
struct EventRecord {
  id:      u64,
  #[serde(alias = "startTime")]
  start:   String,
  #[serde(default, alias = "endTime")]
  end:     Option<String>,
  #[serde(flatten)]
  payload: Payload
}

#[derive(Debug, Default)]
pub struct Feed {
  pub events:   Vec<Event<Payload>>,
  pub rejected: Vec<Rejection>
}

/// Reads a JSON array of event records from
/// `path`, or from stdin when `path` is
/// `None` or `-`.
#[tracing::instrument(skip(tz))]
pub fn load_events(
  path: Option<&Path>,
  tz: &Tz,
  default_duration: Duration
) -> anyhow::Result<Feed> {
  match path {
    | Some(path)
      if path.as_os_str() != "-" =>
    {
      info!(input = %path.display(), "reading events");
      let file = File::open(path)
        .with_context(|| {
          format!(
            "failed to open {}",
            path.display()
          )
        })?;
      read_events(
        BufReader::new(file),
        tz,
        default_duration
      )
      .with_context(|| {
        format!(
          "failed to read events from {}",
          path.display()
        )
      })
    }
    | _ => {
      info!("reading events from stdin");
      read_events(
        io::stdin().lock(),
        tz,
        default_duration
      )
      .context(
        "failed to read events from stdin"
      )
    }
  }
}

pub fn read_events<R: Read>(
  reader: R,
  tz: &Tz,
  default_duration: Duration
) -> anyhow::Result<Feed> {
  let raw: Vec<Value> =
    serde_json::from_reader(reader)
      .context(
        "expected a JSON array of event \
         records"
      )?;
  debug!(records = raw.len(), "decoded feed");

  let mut feed = Feed::default();
  for value in raw {
    let fallback_id = value
      .get("id")
      .and_then(Value::as_u64)
      .map(EventId);

    match decode_record(
      value,
      tz,
      default_duration
    ) {
      | Ok(event) => feed.events.push(event),
      | Err(err) => {
        let Some(id) = fallback_id else {
          warn!(
            error = %format!("{err:#}"),
            "skipping record without a usable id"
          );
          continue;
        };
        warn!(
          id = %id,
          error = %format!("{err:#}"),
          "skipping unparsable record"
        );
        feed.rejected.push(Rejection {
          id,
          reason: RejectReason::Unparsable
        });
      }
    }
  }

  Ok(feed)
}

fn decode_record(
  value: Value,
  tz: &Tz,
  default_duration: Duration
) -> anyhow::Result<Event<Payload>> {
  let record: EventRecord =
    serde_json::from_value(value)
      .context("malformed event record")?;

  let start = parse_instant(&record.start, tz)
    .context("invalid start")?;
  let end = match record.end.as_deref() {
    | Some(raw) if !raw.trim().is_empty() => {
      parse_instant(raw, tz)
        .context("invalid end")?
    }
    | _ => start + default_duration
  };

  Ok(Event::new(
    record.id,
    start,
    end,
    record.payload
  ))
}
