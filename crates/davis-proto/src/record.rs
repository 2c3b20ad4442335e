//! The decoded measurement record: a plain value aggregate, immutable once
//! produced by the codec. No shared state, no inheritance.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::units::WindDirection;

/// One decoded archive sample, already converted to the client's
/// configured units. Every measurement besides `timestamp` is optional:
/// present when the console reported it, `None` when the slot's sentinel
/// marked it missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeteoRecord {
    /// Wall-clock date-time in the console's own (zone-naive) local zone.
    pub timestamp: NaiveDateTime,

    pub out_temp: Option<f64>,
    pub hi_out_temp: Option<f64>,
    pub low_out_temp: Option<f64>,
    pub inside_temp: Option<f64>,

    pub outside_humidity: Option<u8>,
    pub inside_humidity: Option<u8>,

    pub barometer: Option<f64>,
    pub barometer_sea: Option<f64>,

    pub solar_radiation: Option<u16>,

    pub avg_wind_speed: Option<f64>,
    pub high_wind_speed: Option<f64>,
    pub direction_prev_wind: Option<WindDirection>,
    pub direction_hi_wind: Option<WindDirection>,

    pub rainfall: Option<f64>,
    pub high_rain_rate: Option<f64>,

    pub no_wind_samples: Option<u16>,
}
