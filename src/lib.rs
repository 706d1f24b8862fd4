pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;

pub use crate::adapters::{imoova::ImoovaSource, storage::LocalStorage, telegram::TelegramSink};
pub use crate::config::{ConfigOverrides, FileConfig, MonitorConfig};
pub use crate::core::{monitor::Monitor, seen_store::SeenStore};
pub use crate::utils::error::{MonitorError, Result};
