//! Command-line interface argument parsing for sweetie.
//!
//! - `sweetie glucose --start 2023-10-01T00:00:00Z`
//! - `sweetie device-status --end 2023-10-15 --pretty`
//! - `sweetie profiles --database nightscout`
//!
//! Connection settings come from flags or the `MONGODB_*` environment variables.

use clap::{Args, Parser, Subcommand};

use sweetie::data::DEFAULT_DATABASE;

/// Query Nightscout CGM data stored in MongoDB.
///
/// Prints the matching documents as a JSON array on stdout.
#[derive(Parser, Debug)]
#[command(name = "sweetie")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Connection URI with <db_username> and <db_password> placeholders
    #[arg(long, env = "MONGODB_URI", global = true)]
    pub uri: Option<String>,

    #[arg(long, env = "MONGODB_USERNAME", global = true)]
    pub username: Option<String>,

    #[arg(long, env = "MONGODB_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Database holding the Nightscout collections
    #[arg(long, env = "MONGODB_DATABASE", global = true, default_value = DEFAULT_DATABASE)]
    pub database: String,
}

/// Time range shared by every query
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Start of the range (ISO 8601). Defaults to two weeks before --end
    #[arg(short, long)]
    pub start: Option<String>,

    /// End of the range (ISO 8601). Defaults to now
    #[arg(short, long)]
    pub end: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sensor glucose readings from `entries`
    Glucose(RangeArgs),
    /// Pump and uploader state from `devicestatus`
    DeviceStatus(RangeArgs),
    /// Therapy profiles, including the one in effect at --start
    Profiles(RangeArgs),
    /// Insulin and other treatments
    Treatments(RangeArgs),
}

/// Which collection a run queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Glucose,
    DeviceStatus,
    Profiles,
    Treatments,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub query: Query,
    pub start: Option<String>,
    pub end: Option<String>,
    pub pretty: bool,
}

impl AppConfig {
    /// Create AppConfig from parsed CLI arguments.
    ///
    /// Fails naming the first missing connection setting.
    pub fn from_cli(cli: Cli) -> Result<Self, String> {
        let (query, range) = match cli.command {
            Commands::Glucose(range) => (Query::Glucose, range),
            Commands::DeviceStatus(range) => (Query::DeviceStatus, range),
            Commands::Profiles(range) => (Query::Profiles, range),
            Commands::Treatments(range) => (Query::Treatments, range),
        };
        let ConnectionArgs {
            uri,
            username,
            password,
            database,
        } = cli.connection;

        Ok(AppConfig {
            uri: uri.ok_or("missing --uri (or MONGODB_URI)")?,
            username: username.ok_or("missing --username (or MONGODB_USERNAME)")?,
            password: password.ok_or("missing --password (or MONGODB_PASSWORD)")?,
            database,
            query,
            start: range.start,
            end: range.end,
            pretty: range.pretty,
        })
    }
}
