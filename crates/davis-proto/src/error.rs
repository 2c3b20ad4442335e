//! Error types surfaced by the transport and protocol layers.

use thiserror::Error;

/// Failures that originate at the byte-pipe level, below any framing.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("write to serial port failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("short write: sent {sent} of {requested} bytes")]
    ShortWrite { sent: usize, requested: usize },

    #[error("read timed out waiting for {requested} byte(s), got {got}")]
    Timeout { requested: usize, got: usize },

    #[error("read from serial port failed: {0}")]
    Read(#[source] std::io::Error),
}

/// Failures in the console protocol state machine, above framing.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("console did not respond to wake-up after {retries} attempt(s)")]
    NotResponding { retries: u8 },

    #[error("console did not acknowledge the frame")]
    MissingAck,

    #[error("CRC mismatch in {operation} response")]
    CrcMismatch { operation: &'static str },

    #[error("console returned no usable time (CRC mismatch on GETTIME)")]
    NoTime,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures while reading a station configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown rain collector type {0:?}, expected one of RAIN_001IN, RAIN_01MM, RAIN_02MM")]
    UnknownRainCollector(String),

    #[error("unknown log level {0:?}, expected one of ERROR, WARNING, INFO, DEBUG")]
    UnknownLogLevel(String),

    #[error("baud rate {0} is not one of the console's supported rates")]
    UnknownBaudRate(u32),

    #[error("unrecognized time zone {0:?}")]
    UnknownTimeZone(String),

    #[error("StationAltitude must be a valid floating point number, got {0:?}")]
    InvalidAltitude(String),

    #[error("DataFile must contain a full path, got {0:?}")]
    InvalidDataFilePath(String),
}
