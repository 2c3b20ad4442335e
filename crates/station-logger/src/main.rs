//! Unattended archive downloader: reads an INI configuration, wakes a
//! Davis-style console, downloads every archive record since the data
//! file's high-water mark, and appends them to the CSV data file.

mod config;
mod csv_store;
mod error;

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::TimeZone;
use clap::Parser;
use davis_proto::prelude::*;
use davis_proto::transport::{SerialTransport, DEFAULT_TIMEOUT};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::StationLoggerConfig;
use error::LoggerError;

#[derive(Debug, Parser)]
#[command(
    name = "station-logger",
    version,
    about = "Poll a Davis-style console and append new archive records to a CSV data file"
)]
struct Options {
    /// Path to the INI-style station configuration file.
    configfile: PathBuf,
}

fn main() {
    let opts = Options::parse();
    if let Err(err) = run(opts) {
        eprintln!("station-logger: {err}");
        std::process::exit(1);
    }
}

fn run(opts: Options) -> Result<(), LoggerError> {
    let config = StationLoggerConfig::load(&opts.configfile)?;

    let filter = EnvFilter::new(config.log_level.filter_directive());
    if config.log_file.as_os_str().is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(log_file))
            .with_ansi(false)
            .init();
    }

    info!(station = %config.station_name, port = %config.port, "starting archive download");

    let client_config = ClientConfig {
        rain_collector: config.rain_collector,
        altitude_m: config.altitude_m,
        wind_dir_unit: WindDirUnit::Degrees,
        ..ClientConfig::default()
    };

    let since = csv_store::high_water_mark(&config.data_file)?;
    info!(%since, "resuming from high-water mark");

    let transport = SerialTransport::open(&config.port, config.baud_rate, DEFAULT_TIMEOUT)?;
    let mut proto = DavisProtocol::new(transport, client_config);
    proto.wake_up()?;

    let records = proto.get_archive_data(since)?;
    info!(count = records.len(), "downloaded archive records");
    if records.is_empty() {
        warn!("console reported no new records since the last run");
    }

    csv_store::append_records(&config.data_file, &records)?;

    let last_local = records
        .last()
        .and_then(|r| config.timezone.from_local_datetime(&r.timestamp).single());
    if let Some(last_local) = last_local {
        info!(%last_local, "appended new records through");
    }

    proto.into_transport().close()?;
    Ok(())
}
