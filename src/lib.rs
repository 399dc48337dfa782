mod client;
mod config;
mod diff;
mod error;
mod logger;
mod protocol;
mod sensors;
mod types;

pub use client::{DeviceSession, SessionBuilder};
pub use config::{ConfigStore, Credentials, FileConfig, MemoryConfig, DEFAULT_CONFIG_FILE};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use sensors::{sensors_for, Sensor, SensorKind, PERCENT_MULTIPLIER};
pub use types::*;
