pub mod cancel;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod error;
pub mod limits;
pub mod logging;
pub mod marker;
pub mod privilege;
pub mod process;
pub mod spawner;

pub use cancel::CancellationToken;
pub use config::DaemonConfig;
pub use error::DaemonError;
