mod cli;
mod render;

use crate::cli::{Cli, Command};
use crate::render::{Render, emit};
use anyhow::Context;
use clap::Parser;
use std::io::{self, Write};
use tba_api::freshness::http_date_add_secs;
use tba_api::{
    AwardsQuery, DistrictsQuery, EventsQuery, Fetched, Freshness, MatchesQuery, Series,
    Session, Table, TbaClient, TeamsQuery,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    better_panic::install();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    // No request is made, so no session is needed.
    if let Command::NextSince { last_modified } = &cli.command {
        return next_since(&mut out, last_modified);
    }

    let session = Session::from_lookup(|name| {
        cli.session_override(name)
            .or_else(|| std::env::var(name).ok())
    })
    .context("invalid session settings")?;
    log::debug!("{} with {} output", session.base_url(), session.format());
    let freshness = Freshness::new(
        cli.modified_since.as_deref(),
        cli.only_modified_since.as_deref(),
    )?;
    let client = TbaClient::new(session).context("could not build the HTTP client")?;

    run(&client, &cli, &freshness, &mut out)?;
    out.flush()?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(
    client: &TbaClient,
    cli: &Cli,
    freshness: &Freshness,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let show = |fetched: &Fetched<Table>, out: &mut dyn Write| emit(fetched, cli.meta, out);

    match &cli.command {
        Command::Status => {
            singleton(
                cli,
                out,
                || client.status::<Series>(freshness),
                || client.status::<Table>(freshness),
            )?;
        }
        Command::Teams { page, year, event, district, all, detail } => {
            let fetched = if *all {
                client.all_teams(*year, *detail, freshness)?
            } else {
                let query = TeamsQuery {
                    page: *page,
                    year: *year,
                    event: event.clone(),
                    district: district.clone(),
                    detail: *detail,
                };
                client.teams(&query, freshness)?
            };
            show(&fetched, out)?;
        }
        Command::Team { team, detail } => show(&client.team(team, *detail, freshness)?, out)?,
        Command::Events { year, district, team, event, detail } => {
            let query = EventsQuery {
                year: *year,
                district: district.clone(),
                team: team.clone(),
                event: event.clone(),
                detail: *detail,
            };
            show(&client.events(&query, freshness)?, out)?;
        }
        Command::Matches { event, team, year, match_key, detail } => {
            let query = MatchesQuery {
                event: event.clone(),
                team: team.clone(),
                year: *year,
                match_key: match_key.clone(),
                detail: *detail,
            };
            show(&client.matches(&query, freshness)?, out)?;
        }
        Command::Districts { team, year } => {
            let query = DistrictsQuery { team: team.clone(), year: *year };
            show(&client.districts(&query, freshness)?, out)?;
        }
        Command::DistrictRankings { district } => {
            show(&client.district_rankings(district, freshness)?, out)?;
        }
        Command::Awards { team, event, year } => {
            let query = AwardsQuery { team: team.clone(), event: event.clone(), year: *year };
            show(&client.awards(&query, freshness)?, out)?;
        }
        Command::Alliances { event } => show(&client.alliances(event, freshness)?, out)?,
        Command::Insights { event } => show(&client.insights(event, freshness)?, out)?,
        Command::Oprs { event } => show(&client.oprs(event, freshness)?, out)?,
        Command::Predictions { event } => {
            emit(&client.predictions(event, freshness)?, cli.meta, out)?;
        }
        Command::Rankings { event } => show(&client.event_rankings(event, freshness)?, out)?,
        Command::DistrictPoints { event } => {
            emit(&client.district_points(event, freshness)?, cli.meta, out)?;
        }
        Command::TeamStatus { event, team } => {
            singleton(
                cli,
                out,
                || client.event_team_status::<Series>(event, team, freshness),
                || client.event_team_status::<Table>(event, team, freshness),
            )?;
        }
        Command::Media { team, year } => show(&client.media(team, *year, freshness)?, out)?,
        Command::SocialMedia { team } => show(&client.social_media(team, freshness)?, out)?,
        Command::Get { path } => {
            let parts: Vec<&str> = path.iter().map(String::as_str).collect();
            show(&client.generic(&parts, freshness)?, out)?;
        }
        Command::NextSince { last_modified } => next_since(out, last_modified)?,
    }
    Ok(())
}

fn next_since(out: &mut dyn Write, last_modified: &str) -> anyhow::Result<()> {
    let next = http_date_add_secs(last_modified, 1).context("invalid Last-Modified value")?;
    writeln!(out, "{next}")?;
    Ok(())
}

/// Emits a flattened singleton as a series with `--series`, otherwise as a table.
/// Both arguments are lazy so only the chosen request is sent.
fn singleton<S, T>(
    cli: &Cli,
    out: &mut dyn Write,
    as_series: impl FnOnce() -> tba_api::ApiResult<Fetched<S>>,
    as_table: impl FnOnce() -> tba_api::ApiResult<Fetched<T>>,
) -> anyhow::Result<()>
where
    S: Render,
    T: Render,
{
    if cli.series {
        emit(&as_series()?, cli.meta, out)
    } else {
        emit(&as_table()?, cli.meta, out)
    }
}
