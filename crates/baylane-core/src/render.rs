use std::collections::HashMap;
use std::io::{
  self,
  IsTerminal,
  Write
};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::assemble::{
  DayLayout,
  Layout,
  MonthLayout,
  ViewLayout,
  ViewMode,
  WeekLayout
};
use crate::event::{
  Event,
  EventId,
  Rejection
};
use crate::feed::Payload;
use crate::packer::SpanLayout;
use crate::projector::{
  HoursOverflow,
  TimedLayout
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum OutputFormat {
  Json,
  Table
}

impl std::str::FromStr for OutputFormat {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str()
    {
      | "json" => Ok(Self::Json),
      | "table" => Ok(Self::Table),
      | other => {
        Err(anyhow!(
          "unknown output format: {other}"
        ))
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct Renderer {
  color: bool
}

impl Renderer {
  pub fn new(
    color_setting: &str
  ) -> anyhow::Result<Self> {
    let color = match color_setting
      .to_ascii_lowercase()
      .as_str()
    {
      | "on" | "yes" | "true" | "1" => true,
      | "off" | "no" | "false" | "0" => {
        false
      }
      | other => {
        return Err(anyhow!(
          "invalid color setting: {other}"
        ));
      }
    };

    Ok(Self { color })
  }

  #[tracing::instrument(skip_all)]
  pub fn print_layout(
    &self,
    format: OutputFormat,
    layout: &Layout,
    events: &[Event<Payload>]
  ) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match format {
      | OutputFormat::Json => {
        serde_json::to_writer_pretty(
          &mut out, layout
        )?;
        writeln!(out)?;
      }
      | OutputFormat::Table => {
        self.write_layout(
          &mut out, layout, events
        )?;
      }
    }
    Ok(())
  }

  pub fn write_layout<W: Write>(
    &self,
    out: &mut W,
    layout: &Layout,
    events: &[Event<Payload>]
  ) -> anyhow::Result<()> {
    let titles = Titles::new(events);

    match &layout.view {
      | ViewLayout::Day(day) => {
        self.write_day(out, day, &titles)?
      }
      | ViewLayout::Week(week) => {
        self.write_week(out, week, &titles)?
      }
      | ViewLayout::Month(month) => {
        self.write_month(out, month, &titles)?
      }
    }

    self.write_rejected(out, &layout.rejected)
  }

  fn write_day<W: Write>(
    &self,
    out: &mut W,
    day: &DayLayout,
    titles: &Titles<'_>
  ) -> anyhow::Result<()> {
    writeln!(
      out,
      "{} {:02}:00-{:02}:00",
      self.paint(
        &day.day().format("%a %Y-%m-%d").to_string(),
        Tone::Heading
      ),
      day.window.start_hour(),
      day.window.end_hour()
    )?;

    write_spans(out, &day.all_day, titles)?;
    let rows = day
      .timed
      .iter()
      .map(|timed| timed_row(None, timed, titles))
      .collect();
    write_table(
      out,
      vec!["ID", "Title", "Top", "Height", "Note"],
      rows
    )
  }

  fn write_week<W: Write>(
    &self,
    out: &mut W,
    week: &WeekLayout,
    titles: &Titles<'_>
  ) -> anyhow::Result<()> {
    writeln!(
      out,
      "{}",
      self.paint(
        &format!(
          "{} of {}",
          ViewMode::Week.label(),
          week.week_start.format("%Y-%m-%d")
        ),
        Tone::Heading
      )
    )?;

    write_spans(out, &week.all_day, titles)?;
    let rows = week
      .columns
      .iter()
      .flat_map(|column| {
        column.timed.iter().map(move |timed| {
          timed_row(
            Some(
              column
                .date
                .format("%a %d")
                .to_string()
            ),
            timed,
            titles
          )
        })
      })
      .collect();
    write_table(
      out,
      vec![
        "Day", "ID", "Title", "Top", "Height",
        "Note",
      ],
      rows
    )
  }

  fn write_month<W: Write>(
    &self,
    out: &mut W,
    month: &MonthLayout,
    titles: &Titles<'_>
  ) -> anyhow::Result<()> {
    writeln!(
      out,
      "{}",
      self.paint(
        &format!(
          "{:04}-{:02} ({} cells from {})",
          month.year,
          month.month,
          month.cells.len(),
          month.grid_start.format("%Y-%m-%d")
        ),
        Tone::Heading
      )
    )?;

    let span_rows = month
      .rows
      .iter()
      .flat_map(|row| {
        row.spans.iter().map(move |span| {
          vec![
            row
              .week_start
              .format("%Y-%m-%d")
              .to_string(),
            span.event_id.to_string(),
            titles.get(span.event_id),
            span.row.to_string(),
            column_label(span),
          ]
        })
      })
      .collect();
    write_table(
      &mut *out,
      vec!["Week", "ID", "Title", "Lane", "Columns"],
      span_rows
    )?;
    writeln!(out)?;

    let cell_rows = month
      .cells
      .iter()
      .filter(|cell| {
        !cell.events.is_empty()
          || !cell.hidden.is_empty()
      })
      .map(|cell| {
        let listed = cell
          .events
          .iter()
          .map(|id| titles.get(*id))
          .collect::<Vec<_>>()
          .join(", ");
        let more = if cell.overflow() > 0 {
          format!("+{} more", cell.overflow())
        } else {
          String::new()
        };
        vec![
          cell.date.format("%Y-%m-%d").to_string(),
          listed,
          more,
        ]
      })
      .collect();
    write_table(
      out,
      vec!["Date", "Events", "More"],
      cell_rows
    )
  }

  fn write_rejected<W: Write>(
    &self,
    out: &mut W,
    rejected: &[Rejection]
  ) -> anyhow::Result<()> {
    if rejected.is_empty() {
      return Ok(());
    }

    writeln!(out)?;
    for rejection in rejected {
      writeln!(
        out,
        "{} {} ({})",
        self.paint("rejected", Tone::Alert),
        rejection.id,
        rejection.reason.as_key()
      )?;
    }
    Ok(())
  }

  fn paint(
    &self,
    text: &str,
    tone: Tone
  ) -> String {
    if self.color && io::stdout().is_terminal()
    {
      format!(
        "\x1b[{}m{text}\x1b[0m",
        tone.sgr()
      )
    } else {
      text.to_string()
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
  Heading,
  Alert
}

impl Tone {
  fn sgr(self) -> &'static str {
    match self {
      | Self::Heading => "1",
      | Self::Alert => "1;31"
    }
  }
}

struct Titles<'a> {
  by_id: HashMap<EventId, &'a Payload>
}

impl<'a> Titles<'a> {
  /// Picks the same record per id that
  /// [`crate::event::ingest`] keeps: the
  /// first one with a positive duration,
  /// falling back to the first one seen.
  fn new(events: &'a [Event<Payload>]) -> Self {
    let mut by_id = HashMap::new();
    let accepted = events
      .iter()
      .filter(|event| event.end > event.start);
    for event in accepted.chain(events) {
      by_id
        .entry(event.id)
        .or_insert(&event.payload);
    }
    Self { by_id }
  }

  fn get(&self, id: EventId) -> String {
    self
      .by_id
      .get(&id)
      .and_then(|payload| payload.get("title"))
      .and_then(|title| title.as_str())
      .filter(|title| !title.trim().is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| {
        format!("Appointment #{id}")
      })
  }
}

fn timed_row(
  day: Option<String>,
  timed: &TimedLayout,
  titles: &Titles<'_>
) -> Vec<String> {
  let note = match timed.overflow {
    | HoursOverflow::Inside => "",
    | HoursOverflow::BeforeHours => {
      "before hours"
    }
    | HoursOverflow::AfterHours => {
      "after hours"
    }
  };

  day
    .into_iter()
    .chain([
      timed.event_id.to_string(),
      titles.get(timed.event_id),
      format!("{:.1}", timed.top),
      format!("{:.1}", timed.height),
      note.to_string(),
    ])
    .collect()
}

fn column_label(span: &SpanLayout) -> String {
  let last = span.start_column
    + span.column_span.saturating_sub(1);
  if span.column_span <= 1 {
    span.start_column.to_string()
  } else {
    format!("{}-{}", span.start_column, last)
  }
}

fn write_spans<W: Write>(
  out: &mut W,
  spans: &[SpanLayout],
  titles: &Titles<'_>
) -> anyhow::Result<()> {
  if spans.is_empty() {
    return Ok(());
  }

  let rows = spans
    .iter()
    .map(|span| {
      vec![
        span.event_id.to_string(),
        titles.get(span.event_id),
        span.row.to_string(),
        column_label(span),
      ]
    })
    .collect();
  write_table(
    &mut *out,
    vec!["ID", "All-day", "Lane", "Columns"],
    rows
  )?;
  writeln!(out)?;
  Ok(())
}

fn write_table<W: Write>(
  mut writer: W,
  headers: Vec<&str>,
  rows: Vec<Vec<String>>
) -> anyhow::Result<()> {
  let column_count = headers.len();
  let mut widths = vec![0usize; column_count];

  for (idx, header) in
    headers.iter().enumerate()
  {
    widths[idx] = widths[idx]
      .max(UnicodeWidthStr::width(*header));
  }

  for row in &rows {
    for (idx, cell) in
      row.iter().enumerate().take(column_count)
    {
      widths[idx] = widths[idx].max(
        UnicodeWidthStr::width(
          strip_ansi(cell).as_str()
        )
      );
    }
  }

  for idx in 0..column_count {
    write!(
      writer,
      "{:width$} ",
      headers[idx],
      width = widths[idx]
    )?;
  }
  writeln!(writer)?;

  for width in &widths {
    write!(
      writer,
      "{:-<width$} ",
      "",
      width = *width
    )?;
  }
  writeln!(writer)?;

  for row in rows {
    for (idx, cell) in
      row.iter().enumerate().take(column_count)
    {
      let visible_width =
        UnicodeWidthStr::width(
          strip_ansi(cell).as_str()
        );
      let padding = widths[idx]
        .saturating_sub(visible_width);
      write!(
        writer,
        "{}{} ",
        cell,
        " ".repeat(padding)
      )?;
    }
    writeln!(writer)?;
  }

  Ok(())
}

/// Drops `ESC ... m` colour sequences so
/// widths are measured on visible text.
fn strip_ansi(s: &str) -> String {
  let mut pieces = s.split('\x1b');
  let mut out = pieces
    .next()
    .unwrap_or_default()
    .to_string();
  for piece in pieces {
    if let Some((_, visible)) =
      piece.split_once('m')
    {
      out.push_str(visible);
    }
  }
  out
}
