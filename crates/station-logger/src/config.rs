//! INI-style station configuration: `General`, `StationComm`, and `File`
//! sections, read once at startup.

use std::path::PathBuf;

use davis_proto::error::ConfigError;
use davis_proto::units::RainCollector;
use ini::Ini;

use crate::error::LoggerError;

/// Log level as spelled in the `General.loglevel` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Self::Error),
            "WARNING" => Ok(Self::Warning),
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            _ => Err(ConfigError::UnknownLogLevel(raw.to_string())),
        }
    }

    /// The `tracing_subscriber::EnvFilter` directive this level maps to.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Baud rates the console's serial manual documents as supported.
const ALLOWED_BAUD_RATES: [u32; 8] = [300, 600, 1200, 1800, 2400, 4800, 9600, 19_200];

/// Everything `station-logger` needs, read once from an INI file at startup.
#[derive(Debug, Clone)]
pub struct StationLoggerConfig {
    pub log_level: LogLevel,
    pub station_name: String,
    pub log_file: PathBuf,
    pub timezone: chrono_tz::Tz,
    pub rain_collector: RainCollector,
    pub altitude_m: f64,
    pub port: String,
    pub baud_rate: u32,
    pub data_file: PathBuf,
}

fn section_key<'a>(ini: &'a Ini, section: &'static str, key: &'static str) -> Result<&'a str, LoggerError> {
    ini.section(Some(section))
        .ok_or(LoggerError::MissingSection(section))?
        .get(key)
        .ok_or(LoggerError::MissingKey { section, key })
}

impl StationLoggerConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, LoggerError> {
        let ini = Ini::load_from_file(path)?;

        let log_level = LogLevel::parse(section_key(&ini, "General", "loglevel")?)?;
        let station_name = section_key(&ini, "General", "station")?.to_string();
        let log_file = PathBuf::from(section_key(&ini, "General", "logfile")?);

        let raw_tz = section_key(&ini, "General", "timezone")?;
        let timezone: chrono_tz::Tz = raw_tz
            .parse()
            .map_err(|_| ConfigError::UnknownTimeZone(raw_tz.to_string()))?;

        let raw_collector = section_key(&ini, "General", "raincollector")?;
        let rain_collector = RainCollector::parse(raw_collector)
            .ok_or_else(|| ConfigError::UnknownRainCollector(raw_collector.to_string()))?;

        let raw_altitude = section_key(&ini, "General", "stationaltitude")?;
        let altitude_m: f64 = raw_altitude
            .parse()
            .map_err(|_| ConfigError::InvalidAltitude(raw_altitude.to_string()))?;

        let port = section_key(&ini, "StationComm", "port")?.to_string();
        let raw_baud = section_key(&ini, "StationComm", "baudrate")?;
        let baud_rate: u32 = raw_baud
            .parse()
            .ok()
            .filter(|rate| ALLOWED_BAUD_RATES.contains(rate))
            .ok_or_else(|| ConfigError::UnknownBaudRate(raw_baud.parse().unwrap_or(0)))?;

        let raw_data_file = section_key(&ini, "File", "datafile")?;
        if raw_data_file.trim().is_empty() {
            return Err(ConfigError::InvalidDataFilePath(raw_data_file.to_string()).into());
        }
        let data_file = PathBuf::from(raw_data_file);

        Ok(Self {
            log_level,
            station_name,
            log_file,
            timezone,
            rain_collector,
            altitude_m,
            port,
            baud_rate,
            data_file,
        })
    }
}
