//! Read a Davis-style console's clock, optionally report its drift against
//! the caller's local time, and optionally correct it.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use clap::Parser;
use davis_proto::prelude::*;
use davis_proto::transport::{SerialTransport, DEFAULT_TIMEOUT};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "check-time",
    version,
    about = "Read, or optionally correct, a Davis-style console's clock"
)]
struct Options {
    /// Serial baud rate.
    #[arg(long, default_value_t = 19_200)]
    baudrate: u32,

    /// Print the drift in minutes instead of the station time.
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Time zone the station's wall-clock reading should be labelled with,
    /// e.g. `Etc/GMT-1`. The console itself is zone-naive.
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Drift threshold in minutes; `--settime` only pushes a correction
    /// once drift exceeds this many minutes.
    #[arg(long, default_value_t = 5)]
    timedelta: i64,

    /// Push the caller's current local time to the station if drift
    /// exceeds `--timedelta`.
    #[arg(long, default_value_t = false)]
    settime: bool,

    /// Serial device path.
    #[arg(default_value = "/dev/ttyUSB0")]
    portname: String,
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run(Options::parse()) {
        eprintln!("check-time: {err}");
        std::process::exit(1);
    }
}

fn run(opts: Options) -> anyhow::Result<()> {
    let tz: chrono_tz::Tz = opts
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("unrecognized time zone {:?}", opts.timezone))?;

    let transport = SerialTransport::open(&opts.portname, opts.baudrate, DEFAULT_TIMEOUT)?;
    let mut proto = DavisProtocol::new(transport, ClientConfig::default());
    proto.wake_up()?;

    let station_naive = proto.get_time()?;
    let station_local = tz
        .from_local_datetime(&station_naive)
        .single()
        .ok_or_else(|| anyhow::anyhow!("station time {station_naive} is ambiguous in {tz}"))?;

    let now_local = Utc::now().with_timezone(&tz);
    let drift_minutes = (station_local.clone() - now_local).num_minutes();

    if opts.check {
        println!("{drift_minutes}");
    } else {
        println!("{station_local}");
    }

    if opts.settime && drift_minutes.abs() > opts.timedelta {
        let new_time = now_local.naive_local();
        info!(%new_time, drift_minutes, "drift exceeds threshold, pushing new time");
        proto.set_time(new_time)?;
        println!("set station time to {new_time}");
    }

    proto.into_transport().close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let opts = Options::parse_from(["check-time"]);
        assert_eq!(opts.baudrate, 19_200);
        assert_eq!(opts.portname, "/dev/ttyUSB0");
        assert_eq!(opts.timedelta, 5);
        assert!(!opts.check);
        assert!(!opts.settime);
    }

    #[test]
    fn parses_overrides() {
        let opts = Options::parse_from([
            "check-time",
            "--check",
            "--timezone",
            "Etc/GMT-1",
            "--timedelta",
            "10",
            "/dev/ttyS0",
        ]);
        assert!(opts.check);
        assert_eq!(opts.timezone, "Etc/GMT-1");
        assert_eq!(opts.timedelta, 10);
        assert_eq!(opts.portname, "/dev/ttyS0");
    }
}
