use crate::domain::ports::ProgressLog;
use crate::utils::error::Result;
use std::sync::Mutex;

/// 測試用：把訊息留在記憶體
#[derive(Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressLog for MemoryLog {
    fn log_progress(&self, message: &str) -> Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(message.to_string());
        }
        Ok(())
    }
}
