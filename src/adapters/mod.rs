// Adapters layer: concrete implementations for external systems (http, files, sqlite).

pub mod progress_log;
pub mod source;
pub mod store;

pub use progress_log::FileProgressLog;
pub use source::{FilePageSource, HttpPageSource};
pub use store::Store;
