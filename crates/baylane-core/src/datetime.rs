use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Duration,
  NaiveDate,
  NaiveDateTime,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

pub const DEFAULT_DISPLAY_TIMEZONE: &str =
  "UTC";

pub fn resolve_timezone(
  raw: &str
) -> anyhow::Result<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(anyhow!(
      "timezone id cannot be empty"
    ));
  }

  let tz = trimmed.parse::<Tz>().map_err(
    |err| {
      anyhow!(
        "invalid timezone id \
         {trimmed}: {err}"
      )
    }
  )?;
  tracing::debug!(
    timezone = %trimmed,
    "resolved display timezone"
  );
  Ok(tz)
}

/// Parses an event timestamp into the
/// display's local calendar. Naive forms are
/// taken as already local; offset forms are
/// converted into `tz` first.
#[tracing::instrument(
  level = "trace",
  skip(tz),
  fields(input = raw)
)]
pub fn parse_instant(
  raw: &str,
  tz: &Tz
) -> anyhow::Result<NaiveDateTime> {
  let token = raw.trim();

  for fmt in [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M"
  ] {
    if let Ok(ndt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(ndt);
    }
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(
      dt.with_timezone(tz).naive_local()
    );
  }

  Err(anyhow!(
    "unrecognized timestamp: {raw}"
  ))
  .with_context(|| {
    "supported formats: \
     YYYY-MM-DDTHH:MM[:SS], \
     YYYY-MM-DD HH:MM[:SS], RFC3339"
  })
}

/// Resolves the focus date of a view.
#[tracing::instrument(
  level = "debug",
  skip(today),
  fields(input = input)
)]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return shift_days(today, 1);
    }
    | "yesterday" => {
      return shift_days(today, -1);
    }
    | _ => {}
  }

  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)d$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile failure: \
       {e}"
    )
  })?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context("invalid relative number")?;
    let signed = match caps
      .name("sign")
      .map(|m| m.as_str())
    {
      | Some("-") => -num,
      | _ => num
    };
    return shift_days(today, signed);
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "unrecognized date expression: \
       {input} (supported: today, \
       tomorrow, yesterday, +Nd, -Nd, \
       YYYY-MM-DD)"
    )
  })
}

fn shift_days(
  date: NaiveDate,
  days: i64
) -> anyhow::Result<NaiveDate> {
  Duration::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    })
    .ok_or_else(|| {
      anyhow!(
        "date out of range: {date} \
         {days:+} days"
      )
    })
}

/// Business-hour clock value, `H:MM` or
/// `HH:MM` on a 24-hour clock. `24:00` is
/// accepted as the end of day.
pub fn parse_clock_time(
  token: &str
) -> Option<(u32, u32)> {
  let (hour, minute) =
    token.trim().split_once(':')?;
  let all_digits = |part: &str| {
    !part.is_empty()
      && part.bytes().all(|b| b.is_ascii_digit())
  };
  if !all_digits(hour)
    || hour.len() > 2
    || !all_digits(minute)
    || minute.len() != 2
  {
    return None;
  }

  let hour = hour.parse::<u32>().ok()?;
  let minute = minute.parse::<u32>().ok()?;
  match (hour, minute) {
    | (24, 0) => Some((24, 0)),
    | (0..=23, 0..=59) => Some((hour, minute)),
    | _ => None
  }
}

/// English weekday, full (`monday`) or
/// three-letter (`mon`), any case.
pub fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  token.trim().parse::<Weekday>().ok()
}
