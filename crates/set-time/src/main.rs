//! Push an explicit date-time to a Davis-style console's clock.

use chrono::NaiveDateTime;
use clap::Parser;
use davis_proto::prelude::*;
use davis_proto::transport::{SerialTransport, DEFAULT_TIMEOUT};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "set-time",
    version,
    about = "Set a Davis-style console's clock to an explicit date-time"
)]
struct Options {
    /// Serial baud rate.
    #[arg(long, default_value_t = 19_200)]
    baudrate: u32,

    /// Serial device path.
    portname: String,

    /// Date-time to write, in `YYYY-MM-DDTHH:MM:SS`. Written as wall-clock
    /// time; the console attaches no time zone of its own.
    newtime: String,
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run(Options::parse()) {
        eprintln!("set-time: {err}");
        std::process::exit(1);
    }
}

fn run(opts: Options) -> anyhow::Result<()> {
    let when = NaiveDateTime::parse_from_str(&opts.newtime, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| anyhow::anyhow!("invalid newtime {:?}: {e}", opts.newtime))?;

    let transport = SerialTransport::open(&opts.portname, opts.baudrate, DEFAULT_TIMEOUT)?;
    let mut proto = DavisProtocol::new(transport, ClientConfig::default());
    proto.wake_up()?;
    proto.set_time(when)?;

    let readback = proto.get_time()?;
    info!(%readback, "read back station time after set");
    println!("station time set to {readback}");

    proto.into_transport().close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_positionals() {
        let opts = Options::parse_from(["set-time", "/dev/ttyUSB0", "2024-06-12T14:45:30"]);
        assert_eq!(opts.portname, "/dev/ttyUSB0");
        assert_eq!(opts.newtime, "2024-06-12T14:45:30");
        assert_eq!(opts.baudrate, 19_200);
    }
}
