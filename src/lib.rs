pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;

pub use crate::app::{ImportApp, RunOptions, RunReport};
pub use crate::config::AppConfig;
pub use crate::core::RunSummary;
pub use crate::utils::error::{ImportError, Result};
