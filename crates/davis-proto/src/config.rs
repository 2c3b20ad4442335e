//! Client-side session configuration: the set of choices that is fixed
//! for the lifetime of one [`crate::protocol::DavisProtocol`] session.

use crate::units::{PressureUnit, RainCollector, RainUnit, TemperatureUnit, WindDirUnit, WindSpeedUnit};

/// Default number of wake-up retries before giving up on the console.
pub const DEFAULT_RETRIES: u8 = 3;

/// Immutable unit and hardware configuration for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientConfig {
    pub rain_collector: RainCollector,
    pub rain_unit: RainUnit,
    pub temperature_unit: TemperatureUnit,
    pub wind_speed_unit: WindSpeedUnit,
    pub pressure_unit: PressureUnit,
    pub wind_dir_unit: WindDirUnit,
    /// Station altitude above sea level, in metres. Only used to reduce
    /// `barometer` to `barometer_sea`.
    pub altitude_m: f64,
    /// Number of wake-up retries before `wake_up` reports `NotResponding`.
    pub retries: u8,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rain_collector: RainCollector::Mm02,
            rain_unit: RainUnit::Mm,
            temperature_unit: TemperatureUnit::Celsius,
            wind_speed_unit: WindSpeedUnit::MetersPerSecond,
            pressure_unit: PressureUnit::Hpa,
            wind_dir_unit: WindDirUnit::Name,
            altitude_m: 0.0,
            retries: DEFAULT_RETRIES,
        }
    }
}
