//! The bit-packed archive record: wire layout, sentinel semantics, and the
//! packed date/time fields reused by `GETTIME`/`SETTIME`/`DMPAFT`.

use deku::prelude::*;

use crate::config::ClientConfig;
use crate::record::MeteoRecord;
use crate::units;

/// Number of bytes in one archive record slot.
pub const RECORD_LEN: usize = 52;

/// Encode a calendar date into the console's packed 16-bit representation.
///
/// `None` (the console's "no date" placeholder) encodes to `0`.
pub fn encode_date(date: Option<(u16, u8, u8)>) -> u16 {
    match date {
        None => 0,
        Some((year, month, day)) => {
            let year_offset = year.saturating_sub(2000);
            u16::from(day) + u16::from(month) * 32 + year_offset * 512
        }
    }
}

/// Decode the console's packed date field.
///
/// Returns `None` if the year/month/day fail their range checks (year
/// 0..=99, month 1..=12, day 1..=31). `0xFFFF` is handled by the caller's
/// validity predicate, not here, since its meaning ("no date") overlaps
/// with the all-zero encoding rather than being a range failure.
pub fn decode_date(raw: u16) -> Option<(u16, u8, u8)> {
    let year = (raw >> 9) & 0x7F;
    let month = ((raw >> 5) & 0x0F) as u8;
    let day = (raw & 0x1F) as u8;
    if year <= 99 && (1..=12).contains(&month) && (1..=31).contains(&day) {
        Some((year + 2000, month, day))
    } else {
        None
    }
}

/// Encode an hour/minute pair into the console's packed 16-bit
/// representation. Seconds are not representable and always decode to 0.
pub fn encode_time(hour: u8, minute: u8) -> u16 {
    u16::from(hour) * 100 + u16::from(minute)
}

/// Decode the console's packed time field.
pub fn decode_time(raw: u16) -> Option<(u8, u8)> {
    let hour = (raw / 100) as u8;
    let minute = (raw % 100) as u8;
    if hour <= 23 && minute <= 59 {
        Some((hour, minute))
    } else {
        None
    }
}

/// Raw, uninterpreted archive record: a one-to-one mapping of the 52-byte
/// wire layout. Sentinel values are not yet resolved to `None` here; that
/// happens in [`decode_slot`], since it also needs the client's unit
/// configuration.
#[derive(Debug, PartialEq, DekuRead, Clone, Copy)]
#[deku(endian = "little")]
pub struct RawArchiveRecord {
    pub packed_date: u16,
    pub packed_time: u16,
    pub out_temp: i16,
    pub hi_out_temp: i16,
    pub low_out_temp: i16,
    pub rainfall: u16,
    pub high_rain_rate: u16,
    pub barometer: u16,
    pub solar_radiation: u16,
    pub no_wind_samples: u16,
    pub inside_temp: i16,
    pub inside_humidity: u8,
    pub outside_humidity: u8,
    pub avg_wind_speed: u8,
    pub high_wind_speed: u8,
    pub direction_hi_wind: u8,
    pub direction_prev_wind: u8,
    #[deku(count = "24")]
    pub reserved: Vec<u8>,
}

/// Whether a 52-byte slot carries a plausible record at all, per the
/// console's own validity rule: either packed field equal to `0xFFFF`, or
/// an out-of-range date/time, marks the slot as unused.
pub fn is_valid_slot(slot: &[u8; RECORD_LEN]) -> bool {
    let packed_date = u16::from_le_bytes([slot[0], slot[1]]);
    let packed_time = u16::from_le_bytes([slot[2], slot[3]]);
    if packed_date == 0xFFFF || packed_time == 0xFFFF {
        return false;
    }
    decode_date(packed_date).is_some() && decode_time(packed_time).is_some()
}

/// Decode one 52-byte archive slot into a [`MeteoRecord`], honoring the
/// sentinel table in SPEC_FULL.md §4.3. Returns `None` if the slot fails
/// [`is_valid_slot`] or if the parsed date/time cannot be combined into a
/// calendar date-time (e.g. 31 February).
pub fn decode_slot(slot: &[u8; RECORD_LEN], config: &ClientConfig) -> Option<MeteoRecord> {
    if !is_valid_slot(slot) {
        return None;
    }
    let (_rest, raw) = RawArchiveRecord::from_bytes((&slot[..], 0)).ok()?;

    let (year, month, day) = decode_date(raw.packed_date)?;
    let (hour, minute) = decode_time(raw.packed_time)?;
    let timestamp = chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))?
        .and_hms_opt(u32::from(hour), u32::from(minute), 0)?;

    let out_temp = (raw.out_temp != 32767).then(|| units::temperature(raw.out_temp, config.temperature_unit));
    let hi_out_temp =
        (raw.hi_out_temp != -32768).then(|| units::temperature(raw.hi_out_temp, config.temperature_unit));
    let low_out_temp =
        (raw.low_out_temp != 32767).then(|| units::temperature(raw.low_out_temp, config.temperature_unit));
    let barometer = (raw.barometer != 0).then(|| units::pressure(raw.barometer, config.pressure_unit));
    let solar_radiation = (raw.solar_radiation != 32767).then_some(raw.solar_radiation);
    let no_wind_samples = (raw.no_wind_samples != 0).then_some(raw.no_wind_samples);
    let inside_temp =
        (raw.inside_temp != 32767).then(|| units::temperature(raw.inside_temp, config.temperature_unit));
    let inside_humidity = (raw.inside_humidity != 255).then_some(raw.inside_humidity);
    let outside_humidity = (raw.outside_humidity != 255).then_some(raw.outside_humidity);
    let avg_wind_speed =
        (raw.avg_wind_speed != 255).then(|| units::wind_speed(raw.avg_wind_speed, config.wind_speed_unit));
    let high_wind_speed =
        (raw.high_wind_speed != 0).then(|| units::wind_speed(raw.high_wind_speed, config.wind_speed_unit));
    let direction_hi_wind = (raw.direction_hi_wind != 255)
        .then(|| units::sector(raw.direction_hi_wind, config.wind_dir_unit))
        .flatten();
    let direction_prev_wind = (raw.direction_prev_wind != 255)
        .then(|| units::sector(raw.direction_prev_wind, config.wind_dir_unit))
        .flatten();

    // "temperature in Celsius" is always what the barometric formula wants,
    // regardless of the client's configured output unit.
    let inside_temp_c = (raw.inside_temp != 32767).then(|| units::temperature(raw.inside_temp, units::TemperatureUnit::Celsius));
    let barometer_hpa = (raw.barometer != 0).then(|| units::pressure(raw.barometer, units::PressureUnit::Hpa));
    let barometer_sea_hpa = match (barometer_hpa, inside_temp_c) {
        (Some(p), Some(t)) => Some(units::sea_level_pressure(t, p, config.altitude_m)),
        _ => None,
    };
    let barometer_sea = barometer_sea_hpa.map(|hpa| match config.pressure_unit {
        units::PressureUnit::Hpa => hpa,
        units::PressureUnit::InHg => hpa / 33.86389,
    });

    Some(MeteoRecord {
        timestamp,
        out_temp,
        hi_out_temp,
        low_out_temp,
        inside_temp,
        outside_humidity,
        inside_humidity,
        barometer,
        barometer_sea,
        solar_radiation,
        avg_wind_speed,
        high_wind_speed,
        direction_prev_wind,
        direction_hi_wind,
        rainfall: Some(units::rainfall(raw.rainfall, config.rain_collector, config.rain_unit)),
        high_rain_rate: Some(units::rainfall(raw.high_rain_rate, config.rain_collector, config.rain_unit)),
        no_wind_samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    #[test]
    fn date_round_trip() {
        for year in 2000..=2099u16 {
            for month in 1..=12u8 {
                for day in [1u8, 15, 28] {
                    let raw = encode_date(Some((year, month, day)));
                    assert_eq!(decode_date(raw), Some((year, month, day)));
                }
            }
        }
        assert_eq!(encode_date(None), 0);
    }

    #[test]
    fn decode_date_rejects_all_ones() {
        assert_eq!(decode_date(0xFFFF), None);
    }

    #[test]
    fn decode_date_matches_spec_example() {
        // S2: 0x2C21 -> 2022-02-01
        assert_eq!(decode_date(0x2C21), Some((2022, 2, 1)));
    }

    #[test]
    fn time_round_trip() {
        for hour in 0..=23u8 {
            for minute in 0..=59u8 {
                let raw = encode_time(hour, minute);
                assert_eq!(decode_time(raw), Some((hour, minute)));
            }
        }
    }

    fn slot_from_fields(packed_date: u16, packed_time: u16, out_temp: i16) -> [u8; RECORD_LEN] {
        let mut slot = [0u8; RECORD_LEN];
        slot[0..2].copy_from_slice(&packed_date.to_le_bytes());
        slot[2..4].copy_from_slice(&packed_time.to_le_bytes());
        slot[4..6].copy_from_slice(&out_temp.to_le_bytes());
        slot[6..8].copy_from_slice(&(-32768i16).to_le_bytes()); // hi_out_temp sentinel
        slot[8..10].copy_from_slice(&32767i16.to_le_bytes()); // low_out_temp sentinel
        slot[16..18].copy_from_slice(&32767u16.to_le_bytes()); // solar_radiation sentinel
        slot[20..22].copy_from_slice(&32767i16.to_le_bytes()); // inside_temp sentinel
        slot[22] = 255; // inside_humidity sentinel
        slot[23] = 255; // outside_humidity sentinel
        slot[24] = 255; // avg_wind_speed sentinel
        slot[26] = 255; // direction_hi_wind sentinel
        slot[27] = 255; // direction_prev_wind sentinel
        slot
    }

    #[test]
    fn decodes_temperature_in_fahrenheit() {
        let packed_date = encode_date(Some((2024, 6, 12)));
        let packed_time = encode_time(14, 45);
        let slot = slot_from_fields(packed_date, packed_time, 215);
        let mut config = ClientConfig::default();
        config.temperature_unit = crate::units::TemperatureUnit::Fahrenheit;
        let record = decode_slot(&slot, &config).expect("valid slot");
        assert_eq!(record.out_temp, Some(21.5));
    }

    #[test]
    fn decodes_temperature_in_celsius() {
        let packed_date = encode_date(Some((2024, 6, 12)));
        let packed_time = encode_time(14, 45);
        let slot = slot_from_fields(packed_date, packed_time, 215);
        let config = ClientConfig::default();
        let record = decode_slot(&slot, &config).expect("valid slot");
        // 215 tenths-F = 21.5F = -5.8(3)C.
        assert!((record.out_temp.unwrap() - (-5.833_333_333_333_333)).abs() < 1e-9);
    }

    #[test]
    fn sentinel_out_temp_is_null_and_so_is_barometer_sea() {
        let packed_date = encode_date(Some((2024, 6, 12)));
        let packed_time = encode_time(14, 45);
        let slot = slot_from_fields(packed_date, packed_time, 32767);
        let config = ClientConfig::default();
        let record = decode_slot(&slot, &config).expect("valid slot");
        assert_eq!(record.out_temp, None);
        assert_eq!(record.barometer_sea, None);
    }

    #[test]
    fn invalid_slot_is_rejected() {
        let slot = [0xFFu8; RECORD_LEN];
        let config = ClientConfig::default();
        assert!(decode_slot(&slot, &config).is_none());
    }
}
