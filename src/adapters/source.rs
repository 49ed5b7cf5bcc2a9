use crate::config::SourceConfig;
use crate::domain::ports::PageSource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

/// 透過 HTTP GET 取得頁面
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    url: String,
    client: Client,
    timeout: Option<Duration>,
}

impl HttpPageSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self) -> Result<String> {
        tracing::debug!("Making request to: {}", self.url);

        let mut request = self.client.get(&self.url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(EtlError::FetchStatusError {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        tracing::debug!("Fetched {} bytes of markup", body.len());
        Ok(body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// 從本機已存的 HTML 讀取
#[derive(Debug, Clone)]
pub struct FilePageSource {
    path: PathBuf,
}

impl FilePageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageSource for FilePageSource {
    async fn fetch(&self) -> Result<String> {
        let markup = tokio::fs::read_to_string(&self.path).await?;
        tracing::debug!(
            "Read {} bytes of markup from {}",
            markup.len(),
            self.path.display()
        );
        Ok(markup)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// 依設定選擇來源：有 `file` 就讀檔，否則走 HTTP
pub fn page_source_from_config(config: &SourceConfig) -> Box<dyn PageSource> {
    match &config.file {
        Some(path) => Box::new(FilePageSource::new(path.clone())),
        None => {
            let source = HttpPageSource::new(config.url.clone());
            match config.timeout_seconds {
                Some(secs) => Box::new(source.with_timeout(Duration::from_secs(secs))),
                None => Box::new(source),
            }
        }
    }
}
