use crate::utils::error::Result;
use async_trait::async_trait;

/// Supplies the raw markup of the source page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self) -> Result<String>;

    /// Where the markup comes from, for log lines.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Box<T> {
    async fn fetch(&self) -> Result<String> {
        (**self).fetch().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Append-only audit trail. A failed write is fatal to the run.
pub trait ProgressLog: Send + Sync {
    fn log_progress(&self, message: &str) -> Result<()>;
}

impl<T: ProgressLog + ?Sized> ProgressLog for &T {
    fn log_progress(&self, message: &str) -> Result<()> {
        (**self).log_progress(message)
    }
}
