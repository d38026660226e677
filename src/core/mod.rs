pub mod content;
pub mod engine;
pub mod input;
pub mod notification;
pub mod processor;
pub mod strategy;

pub use engine::{ImportEngine, RunSummary};
pub use processor::RowProcessor;
