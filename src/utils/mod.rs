pub mod error;
pub mod logger;
pub mod prompt;
pub mod run_log;
pub mod validation;
