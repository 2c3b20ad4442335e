//! Closed-set configuration enums and the conversions indexed by them.
//!
//! Rain collector size, and the five output unit choices, are all closed
//! sets on the wire. Keeping every conversion in this one module (rather
//! than scattering unit math across the codec) is the point: a caller who
//! wants to add a unit only ever touches this file.

use serde::Serialize;

/// Size of the tipping-bucket rain gauge fitted to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RainCollector {
    /// 0.01 in per click.
    Inch001,
    /// 0.1 mm per click.
    Mm01,
    /// 0.2 mm per click.
    Mm02,
}

impl RainCollector {
    /// Parse a collector name the way the station config file spells it.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "RAIN_001IN" => Some(Self::Inch001),
            "RAIN_01MM" => Some(Self::Mm01),
            "RAIN_02MM" => Some(Self::Mm02),
            _ => None,
        }
    }

    fn click_size_mm(self) -> f64 {
        match self {
            Self::Inch001 => 0.01 * 25.45,
            Self::Mm01 => 0.1,
            Self::Mm02 => 0.2,
        }
    }

    fn click_size_in(self) -> f64 {
        match self {
            Self::Inch001 => 0.01,
            Self::Mm01 => 0.1 / 25.45,
            Self::Mm02 => 0.2 / 25.45,
        }
    }
}

/// Output unit for rainfall and rain rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RainUnit {
    Mm,
    In,
}

/// Output unit for temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// Output unit for wind speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindSpeedUnit {
    MetersPerSecond,
    /// Pass the console's raw mph-units reading straight through.
    Raw,
}

/// Output unit for barometric pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PressureUnit {
    Hpa,
    InHg,
}

/// How a wind direction sector should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindDirUnit {
    Name,
    Degrees,
}

/// A decoded wind direction, already rendered in the configured unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WindDirection {
    Name(&'static str),
    Degrees(f64),
}

impl std::fmt::Display for WindDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Degrees(deg) => write!(f, "{deg:.1}"),
        }
    }
}

const SECTOR_NAMES: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Map a console sector index (0..=15) to a wind direction in the
/// requested unit, or `None` if the index is out of range.
pub fn sector(index: u8, unit: WindDirUnit) -> Option<WindDirection> {
    let name = *SECTOR_NAMES.get(index as usize)?;
    Some(match unit {
        WindDirUnit::Name => WindDirection::Name(name),
        WindDirUnit::Degrees => WindDirection::Degrees(f64::from(index) * 22.5),
    })
}

/// Convert a raw temperature reading (tenths of a degree Fahrenheit) to
/// the configured unit.
pub fn temperature(raw_tenths_f: i16, unit: TemperatureUnit) -> f64 {
    let fahrenheit = f64::from(raw_tenths_f) / 10.0;
    match unit {
        TemperatureUnit::Fahrenheit => fahrenheit,
        TemperatureUnit::Celsius => 5.0 / 9.0 * (fahrenheit - 32.0),
    }
}

/// Convert a raw wind speed reading (mph) to the configured unit.
pub fn wind_speed(raw_mph: u8, unit: WindSpeedUnit) -> f64 {
    match unit {
        WindSpeedUnit::Raw => f64::from(raw_mph),
        WindSpeedUnit::MetersPerSecond => f64::from(raw_mph) * 0.44704,
    }
}

/// Convert a raw barometric reading (thousandths of an inHg) to the
/// configured unit.
pub fn pressure(raw_thousandths_inhg: u16, unit: PressureUnit) -> f64 {
    let in_hg = f64::from(raw_thousandths_inhg) / 1000.0;
    match unit {
        PressureUnit::InHg => in_hg,
        PressureUnit::Hpa => in_hg * 33.86389,
    }
}

/// Convert a raw rainfall click count to the configured unit, given the
/// collector fitted to the station.
pub fn rainfall(clicks: u16, collector: RainCollector, unit: RainUnit) -> f64 {
    let per_click = match unit {
        RainUnit::Mm => collector.click_size_mm(),
        RainUnit::In => collector.click_size_in(),
    };
    f64::from(clicks) * per_click
}

/// Gravitational acceleration at 45° latitude, m/s^2.
const G0: f64 = 9.80665;
/// Universal gas constant for air, N.m/(mol.K).
const RS: f64 = 8.31432;
/// Molar mass of Earth's air, kg/mol.
const M_AIR: f64 = 0.0289644;

/// Reduce a measured barometric pressure to sea level using the
/// barometric formula.
///
/// `temp_c` is the station's inside temperature in Celsius, `pressure` is
/// the station reading in whatever unit the caller wants back, and
/// `altitude_m` is the station's altitude above sea level. Uses `T +
/// 273.75` rather than the textbook `T + 273.15`, carried over from the
/// upstream data source for bit-compatibility with existing archives.
pub fn sea_level_pressure(temp_c: f64, pressure: f64, altitude_m: f64) -> f64 {
    let hdiff = -altitude_m;
    if temp_c.is_nan() || pressure.is_nan() || hdiff.is_nan() {
        return f64::NAN;
    }
    let temp_k = temp_c + 273.75;
    pressure * (-G0 * M_AIR * hdiff / (RS * temp_k)).exp()
}
