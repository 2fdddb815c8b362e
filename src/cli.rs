use clap::{Parser, Subcommand};
use tba_api::{Detail, TeamDetail};

const ENVIRONMENT: &str = "Environment:
  TBA_AUTH_KEY        Read API key (required unless --auth-key is given)
  TBAP_BASE_URL       API root (default https://www.thebluealliance.com/api/v3)
  TBAP_FORMAT         table, json or xml (default table)
  TBAP_TIME_ZONE      Zone for match times, e.g. America/Chicago or +05:30 (default UTC)
  TBAP_TIMEOUT_SECS   Request timeout in seconds (default 10)
  RUST_LOG            Log filter, e.g. tba_api=debug";

#[derive(Debug, Parser)]
#[command(
    name = "tbap",
    version,
    about = "Download FRC competition data from The Blue Alliance",
    after_help = ENVIRONMENT
)]
pub struct Cli {
    /// Read API key; overrides TBA_AUTH_KEY
    #[arg(long, global = true)]
    pub auth_key: Option<String>,

    /// Output format: table, json or xml; overrides TBAP_FORMAT
    #[arg(long, short, global = true)]
    pub format: Option<String>,

    /// Time zone for match times, e.g. America/Chicago; overrides TBAP_TIME_ZONE
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub time_zone: Option<String>,

    /// Only answer if the data changed after this HTTP date
    #[arg(long, global = true, value_name = "HTTP_DATE")]
    pub modified_since: Option<String>,

    /// Only return records changed after this HTTP date
    #[arg(long, global = true, value_name = "HTTP_DATE")]
    pub only_modified_since: Option<String>,

    /// Print singleton responses as a label/value series instead of a table
    #[arg(long, global = true)]
    pub series: bool,

    /// Also print the response metadata
    #[arg(long, global = true)]
    pub meta: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Flag value for a session variable, when the flag was given.
    pub fn session_override(&self, name: &str) -> Option<String> {
        match name {
            "TBA_AUTH_KEY" => self.auth_key.clone(),
            "TBAP_FORMAT" => self.format.clone(),
            "TBAP_TIME_ZONE" => self.time_zone.clone(),
            _ => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// API status
    Status,
    /// Teams by page, season page, district or event
    Teams {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        year: Option<u16>,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        district: Option<String>,
        /// Walk every page (optionally for --year)
        #[arg(long, conflicts_with_all = ["page", "event", "district"])]
        all: bool,
        /// full, simple or keys
        #[arg(long, default_value = "full")]
        detail: Detail,
    },
    /// One team
    Team {
        /// Team key, e.g. frc1318
        team: String,
        /// full, simple, years_participated or robots
        #[arg(long, default_value = "full")]
        detail: TeamDetail,
    },
    /// Events by season, district, team or key
    Events {
        #[arg(long)]
        year: Option<u16>,
        #[arg(long)]
        district: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        event: Option<String>,
        /// full, simple or keys
        #[arg(long, default_value = "full")]
        detail: Detail,
    },
    /// Matches at an event, for a team, or a single match
    Matches {
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        year: Option<u16>,
        /// Match key, e.g. 2017wasno_qm1
        #[arg(long = "match")]
        match_key: Option<String>,
        /// full, simple or keys
        #[arg(long, default_value = "full")]
        detail: Detail,
    },
    /// Districts of a team or of a season
    Districts {
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        year: Option<u16>,
    },
    /// District rankings
    DistrictRankings { district: String },
    /// Awards won by a team
    Awards {
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        year: Option<u16>,
    },
    /// Playoff alliances at an event
    Alliances { event: String },
    /// Event insights
    Insights { event: String },
    /// OPR, DPR and CCWM at an event
    Oprs { event: String },
    /// Match and ranking predictions at an event
    Predictions { event: String },
    /// Qualification rankings at an event
    Rankings { event: String },
    /// District points earned at an event
    DistrictPoints { event: String },
    /// A team's status at an event
    TeamStatus { event: String, team: String },
    /// A team's media for one season
    Media { team: String, year: u16 },
    /// A team's social media accounts
    SocialMedia { team: String },
    /// Any other endpoint, e.g. `tbap get event 2017wasno awards`
    Get {
        #[arg(required = true)]
        path: Vec<String>,
    },
    /// Print the HTTP date one second after a Last-Modified value
    NextSince {
        /// HTTP date, e.g. "Wed, 30 Aug 2017 06:49:32 GMT"
        last_modified: String,
    },
}
