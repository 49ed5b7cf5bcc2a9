use crate::domain::ports::ProgressLog;
use crate::utils::error::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 以 `YYYY-MM-DD HH:MM:SS : <message>` 逐行附加到檔案
#[derive(Debug, Clone)]
pub struct FileProgressLog {
    path: PathBuf,
}

impl FileProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

pub fn format_entry(timestamp: &str, message: &str) -> String {
    format!("{} : {}\n", timestamp, message)
}

impl ProgressLog for FileProgressLog {
    fn log_progress(&self, message: &str) -> Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_entry(&timestamp, message).as_bytes())?;

        tracing::info!("{}", message);
        Ok(())
    }
}
