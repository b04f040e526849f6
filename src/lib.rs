pub mod record;
pub mod transformer;
pub mod index_name;
pub mod retry;
pub mod client;
pub mod backend;
pub mod error;
pub mod env;
pub mod state;
pub mod events;
pub mod template;
pub mod write;
pub mod monitor;
pub mod config;
pub mod shipper;
pub mod layer;
pub mod init;

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ShipperConfig;
pub use error::{ConfigError, ShipperError};
pub use record::LogRecord;
pub use shipper::{Shipper, WriteHandle, WriteOutcome};
