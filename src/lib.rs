pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{FilePageSource, FileProgressLog, HttpPageSource, Store};
pub use config::RunConfig;
pub use core::etl::{EtlEngine, RunReport, RunState};
pub use utils::error::{EtlError, Result};
