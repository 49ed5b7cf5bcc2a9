#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::currency_column;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

/// 一次執行所需的全部設定，取代全域常數
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub source: SourceConfig,
    pub extract: ExtractConfig,
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    /// 指定時從本機 HTML 讀取，不連網
    pub file: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            file: None,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// 0-based position among all `<table>` elements
    pub table_index: usize,
    pub name_column: usize,
    pub value_column: usize,
}

impl ExtractConfig {
    /// cells a row needs before it is considered
    pub fn min_cells(&self) -> usize {
        self.name_column.max(self.value_column) + 1
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            table_index: 2,
            name_column: 1,
            value_column: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub exchange_rate_file: PathBuf,
    pub currencies: Vec<String>,
    /// Multiplier applied when the raw value column is renamed to MC_USD_Billion.
    /// The archived source page already reports billions, so the default is 1.0.
    pub usd_scale: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            exchange_rate_file: PathBuf::from("exchange_rate.csv"),
            currencies: vec!["GBP".to_string(), "EUR".to_string(), "INR".to_string()],
            usd_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub intermediate_csv: PathBuf,
    pub output_csv: PathBuf,
    pub database: PathBuf,
    pub table_name: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            intermediate_csv: PathBuf::from("bank_market_cap.csv"),
            output_csv: PathBuf::from("bank_market_cap_gbp_eur_inr.csv"),
            database: PathBuf::from("Banks.db"),
            table_name: "Largest_banks".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub average_currency: String,
    pub top_n: usize,
    /// run verbatim after the reporting queries
    pub extra: Vec<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            average_currency: "GBP".to_string(),
            top_n: 5,
            extra: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("code_log.txt"),
        }
    }
}

impl RunConfig {
    /// 報表查詢：全表、平均、前 N 筆名稱，再加上自訂查詢
    pub fn report_queries(&self) -> Vec<String> {
        let table = &self.load.table_name;
        let mut queries = vec![
            format!("SELECT * FROM {}", table),
            format!(
                "SELECT AVG({}) FROM {}",
                currency_column(&self.query.average_currency),
                table
            ),
            format!(
                "SELECT \"Bank name\" FROM {} LIMIT {}",
                table, self.query.top_n
            ),
        ];
        queries.extend(self.query.extra.iter().cloned());
        queries
    }

    /// dry-run 時顯示的摘要
    pub fn plan_summary(&self) -> String {
        let source = match &self.source.file {
            Some(file) => format!("file {}", file.display()),
            None => self.source.url.clone(),
        };
        let mut lines = vec![
            format!("Source:        {}", source),
            format!("Table index:   {}", self.extract.table_index),
            format!(
                "Rates:         {} ({})",
                self.transform.exchange_rate_file.display(),
                self.transform.currencies.join(", ")
            ),
            format!("Intermediate:  {}", self.load.intermediate_csv.display()),
            format!("Output CSV:    {}", self.load.output_csv.display()),
            format!(
                "Database:      {} (table {})",
                self.load.database.display(),
                self.load.table_name
            ),
            format!("Audit log:     {}", self.logging.log_file.display()),
            "Queries:".to_string(),
        ];
        lines.extend(self.report_queries().into_iter().map(|q| format!("  {}", q)));
        lines.join("\n")
    }
}
