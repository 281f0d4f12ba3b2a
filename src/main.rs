//! sweetie: query Nightscout CGM data in MongoDB from the command line.
//!
//! Connects once, runs a single query and prints the documents as JSON.
//! Logs go to stderr and are controlled with `RUST_LOG`.

mod cli;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{AppConfig, Cli, Query};
use sweetie::data::record_to_json;
use sweetie::{DataService, MongoConnection, Record};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,sweetie=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_args();
    let config = AppConfig::from_cli(cli).map_err(anyhow::Error::msg)?;

    let mut connection = MongoConnection::new(&config.uri, &config.username, &config.password)
        .with_database(config.database.clone());
    connection
        .connect()
        .with_context(|| format!("Could not open database `{}`", config.database))?;

    // Close before reporting so a failed query still releases the client
    let result = run_query(&connection, &config);
    connection.close();
    let records = result?;

    let output = Value::Array(records.into_iter().map(record_to_json).collect());
    let rendered = if config.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");

    Ok(())
}

fn run_query(connection: &MongoConnection, config: &AppConfig) -> Result<Vec<Record>> {
    let service = DataService::new(connection);
    let start = config.start.as_deref();
    let end = config.end.as_deref();

    let records = match config.query {
        Query::Glucose => service
            .get_glucose_readings(start, end)
            .context("Failed to retrieve glucose readings")?,
        Query::DeviceStatus => service
            .get_device_status(start, end)
            .context("Failed to retrieve device status")?,
        Query::Profiles => service
            .get_profiles(start, end)
            .context("Failed to retrieve profile data")?,
        Query::Treatments => service
            .get_treatments(start, end)
            .context("Failed to retrieve treatment data")?,
    };

    tracing::info!(count = records.len(), query = ?config.query, "Query complete");
    Ok(records)
}
