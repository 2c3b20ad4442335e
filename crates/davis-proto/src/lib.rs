pub mod codec;
pub mod config;
pub mod crc;
pub mod error;
pub mod protocol;
pub mod record;
pub mod transport;
pub mod units;

pub mod prelude {
    pub use crate::config::ClientConfig;
    pub use crate::error::{ConfigError, ProtocolError, TransportError};
    pub use crate::protocol::DavisProtocol;
    pub use crate::record::MeteoRecord;
    pub use crate::transport::{SerialTransport, Transport};
    pub use crate::units::{
        PressureUnit, RainCollector, RainUnit, TemperatureUnit, WindDirUnit, WindDirection, WindSpeedUnit,
    };
}
