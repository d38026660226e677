pub mod import;

pub use import::{ImportApp, RunOptions, RunReport};
