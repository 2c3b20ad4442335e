//! CSV persistence of decoded archive records, and the tail-read used to
//! recover the high-water-mark timestamp across runs.

use std::path::Path;

use chrono::NaiveDateTime;
use davis_proto::record::MeteoRecord;

use crate::error::LoggerError;

pub const HEADER: &[&str] = &[
    "DATE_TIME",
    "TEMP",
    "TEMPMIN",
    "TEMPMAX",
    "PRESS",
    "PRESSSEA",
    "HUM",
    "WIND_SPEED",
    "WIND_DIR",
    "WIND_GUST_SPEED",
    "WIND_GUST_DIR",
    "RAIN",
    "RAIN_RATE",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The high-water mark used when the data file has not been written yet:
/// download everything the console has, matching the upstream `NULL_DATE_TIME`
/// sentinel.
pub fn beginning_of_time() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(1, 1, 1)
        .expect("year 1 is a valid calendar date")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
}

/// Read the data file's last row to recover the timestamp of the most
/// recently persisted record, or [`beginning_of_time`] if the file does
/// not exist yet.
pub fn high_water_mark(path: &Path) -> Result<NaiveDateTime, LoggerError> {
    if !path.exists() {
        return Ok(beginning_of_time());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut last = None;
    for row in reader.records() {
        let row = row?;
        let raw = row.get(0).ok_or(LoggerError::MissingKey {
            section: "File",
            key: "DATE_TIME",
        })?;
        let ts = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map_err(|e| LoggerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        last = Some(ts);
    }
    Ok(last.unwrap_or_else(beginning_of_time))
}

fn fmt_f64(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_else(|| "NA".to_string())
}

fn fmt_scaled<T: Into<f64>>(value: Option<T>) -> String {
    value.map(|v| format!("{:.1}", v.into())).unwrap_or_else(|| "NA".to_string())
}

fn fmt_dir(value: Option<davis_proto::units::WindDirection>) -> String {
    value.map(|d| d.to_string()).unwrap_or_else(|| "NA".to_string())
}

fn row(record: &MeteoRecord) -> Vec<String> {
    vec![
        record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        fmt_f64(record.out_temp),
        fmt_f64(record.low_out_temp),
        fmt_f64(record.hi_out_temp),
        fmt_f64(record.barometer),
        fmt_f64(record.barometer_sea),
        fmt_scaled(record.outside_humidity),
        fmt_f64(record.avg_wind_speed),
        fmt_dir(record.direction_prev_wind),
        fmt_f64(record.high_wind_speed),
        fmt_dir(record.direction_hi_wind),
        fmt_f64(record.rainfall),
        fmt_f64(record.high_rain_rate),
    ]
}

/// Append `records` to the CSV data file at `path`, creating it (with a
/// header row) and its parent directory if neither exists yet.
pub fn append_records(path: &Path, records: &[MeteoRecord]) -> Result<(), LoggerError> {
    if records.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let needs_header = !path.exists();
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if needs_header {
        writer.write_record(HEADER)?;
    }
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    Ok(())
}
