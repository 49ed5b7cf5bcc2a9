use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Fetch failed: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Fetch failed: {url} returned HTTP {status}")]
    FetchStatusError { url: String, status: u16 },

    #[error("Table not found: need table index {index} but the document has {found} table(s)")]
    StructureNotFound { index: usize, found: usize },

    #[error("Schema error: expected column '{column}' is missing")]
    SchemaError { column: String },

    #[error("Store error: {0}")]
    StoreError(#[from] rusqlite::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Source,
    Schema,
    Storage,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::FetchError(_) | EtlError::FetchStatusError { .. } => ErrorCategory::Network,
            EtlError::StructureNotFound { .. } => ErrorCategory::Source,
            EtlError::SchemaError { .. } => ErrorCategory::Schema,
            EtlError::StoreError(_) | EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            EtlError::CsvError(_) | EtlError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路問題通常重跑即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Source | ErrorCategory::Schema | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::FetchError(_) | EtlError::FetchStatusError { .. } => {
                "Check network access to the source URL, or pass --source-file with a saved copy"
            }
            EtlError::StructureNotFound { .. } => {
                "The page layout changed; adjust extract.table_index to point at the banks table"
            }
            EtlError::SchemaError { .. } => {
                "The intermediate CSV was edited or truncated; delete it and rerun the pipeline"
            }
            EtlError::StoreError(_) => {
                "Make sure the database file is writable and not locked by another process"
            }
            EtlError::IoError(_) => "Check that the output and log paths exist and are writable",
            EtlError::CsvError(_) => {
                "Check the exchange rate file has a 'Currency,Rate' header and one row per currency"
            }
            EtlError::ConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and try again"
            }
            EtlError::ValidationError { .. } => "Fix the input data and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not download the source page: {}", self),
            ErrorCategory::Source => format!("The source page has an unexpected layout: {}", self),
            ErrorCategory::Schema => format!("Intermediate data is malformed: {}", self),
            ErrorCategory::Storage => format!("Could not persist results: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Invalid input data: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
