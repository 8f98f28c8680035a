pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod runner;
pub mod source;
pub mod state;

pub use error::{MonitorError, Result};
