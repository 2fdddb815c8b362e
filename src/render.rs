use anyhow::bail;
use chrono::SecondsFormat;
use std::io::{self, Write};
use tba_api::{
    DistrictPointTables, Fetched, PredictionTables, RawResponse, Series, Table, TableMetadata,
};

/// Plain-text output of a shaped result.
pub trait Render {
    fn render(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl Render for Table {
    fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.is_empty() {
            return writeln!(out, "(no rows)");
        }
        write!(out, "{self}")
    }
}

impl Render for Series {
    fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        write!(out, "{self}")
    }
}

impl Render for PredictionTables {
    fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        section(out, "event stats", &self.event_stats)?;
        section(out, "match predictions", &self.match_predictions)?;
        section(out, "team rankings", &self.team_rankings)?;
        section(out, "team stats", &self.team_stats)
    }
}

impl Render for DistrictPointTables {
    fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        section(out, "points", &self.points)?;
        section(out, "high scores", &self.high_scores)
    }
}

fn section(out: &mut dyn Write, title: &str, table: &Table) -> io::Result<()> {
    writeln!(out, "== {title} ==")?;
    table.render(out)?;
    writeln!(out)
}

/// Prints a fetch result to `out`. Statuses other than 200 and 304 become an error
/// carrying the service's error text.
pub fn emit<T: Render>(
    fetched: &Fetched<T>,
    show_meta: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match fetched {
        Fetched::Shaped(frame) => {
            frame.data().render(out)?;
            if show_meta {
                metadata(out, frame.metadata())?;
            }
        }
        Fetched::NotModified(frame) => {
            frame.data().render(out)?;
            if show_meta {
                metadata(out, frame.metadata())?;
            }
        }
        Fetched::Raw(raw) => raw_response(out, raw, show_meta)?,
    }
    Ok(())
}

fn raw_response(out: &mut dyn Write, raw: &RawResponse, show_meta: bool) -> anyhow::Result<()> {
    if let Some(body) = &raw.body {
        writeln!(out, "{body}")?;
    }
    if show_meta {
        metadata(out, &TableMetadata::from(raw))?;
    }
    match (raw.status_code, &raw.error_body) {
        (200 | 304, _) => Ok(()),
        (status, Some(reason)) => bail!("{} answered HTTP {status}: {}", raw.url, reason.trim()),
        (status, None) => bail!("{} answered HTTP {status}", raw.url),
    }
}

fn metadata(out: &mut dyn Write, meta: &TableMetadata) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "status      {}", meta.status_code)?;
    writeln!(out, "url         {}", meta.url)?;
    writeln!(
        out,
        "fetched_at  {}",
        meta.fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(out, "request     {}", meta.request_descriptor.join("/"))?;
    for (name, value) in &meta.headers {
        writeln!(out, "header      {name}: {value}")?;
    }
    Ok(())
}
