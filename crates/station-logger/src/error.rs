//! Errors surfaced by the station-logger collaborator: configuration
//! parsing and CSV persistence, layered over `davis_proto`'s own errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error(transparent)]
    Config(#[from] davis_proto::error::ConfigError),

    #[error(transparent)]
    Protocol(#[from] davis_proto::error::ProtocolError),

    #[error(transparent)]
    Transport(#[from] davis_proto::error::TransportError),

    #[error("failed to read configuration file: {0}")]
    Ini(#[from] ini::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing section [{0}] in configuration file")]
    MissingSection(&'static str),

    #[error("missing key {key:?} in section [{section}] of configuration file")]
    MissingKey {
        section: &'static str,
        key: &'static str,
    },
}
