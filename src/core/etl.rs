use crate::adapters::Store;
use crate::config::RunConfig;
use crate::core::{extract, load, query, transform};
use crate::domain::model::{Dataset, Extracted, QueryResult};
use crate::domain::ports::{PageSource, ProgressLog};
use crate::utils::error::Result;
use std::fmt;

/// 執行狀態，依序前進，不重試
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Extracting,
    Extracted,
    Transforming,
    Transformed,
    LoadingFile,
    LoadingStore,
    Querying,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Extracting => "extracting",
            RunState::Extracted => "extracted",
            RunState::Transforming => "transforming",
            RunState::Transformed => "transformed",
            RunState::LoadingFile => "loading file",
            RunState::LoadingStore => "loading store",
            RunState::Querying => "querying",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub extracted: Extracted,
    pub dataset: Dataset,
    pub queries: Vec<QueryResult>,
}

pub struct EtlEngine<S: PageSource, L: ProgressLog> {
    source: S,
    log: L,
    config: RunConfig,
}

impl<S: PageSource, L: ProgressLog> EtlEngine<S, L> {
    pub fn new(source: S, log: L, config: RunConfig) -> Self {
        Self {
            source,
            log,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs every stage once, in order. The first error aborts the run.
    ///
    /// On failure a best-effort `Process aborted` entry is appended to the
    /// audit log before the error is returned.
    pub async fn run(&self) -> Result<RunReport> {
        let mut state = RunState::Idle;

        match self.run_stages(&mut state).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!("❌ Run aborted while {}: {}", state, e);
                if let Err(log_err) = self.log.log_progress(&format!("Process aborted: {}", e)) {
                    tracing::warn!("Could not record the failure in the audit log: {}", log_err);
                }
                Err(e)
            }
        }
    }

    fn advance(state: &mut RunState, next: RunState) {
        tracing::debug!("State: {} -> {}", state, next);
        *state = next;
    }

    async fn run_stages(&self, state: &mut RunState) -> Result<RunReport> {
        let config = &self.config;
        let log: &dyn ProgressLog = &self.log;

        log.log_progress("Preliminaries complete. Starting ETL process")?;

        // Extract
        Self::advance(state, RunState::Extracting);
        tracing::info!("🚀 Fetching source page from {}", self.source.describe());
        let markup = self.source.fetch().await?;
        let extracted = extract::extract(&markup, &config.extract, log)?;
        load::write_extracted_csv(&extracted.records, &config.load.intermediate_csv)?;
        log.log_progress("Data saved to CSV file")?;
        Self::advance(state, RunState::Extracted);

        // Transform：經由中繼 CSV 重新讀取
        Self::advance(state, RunState::Transforming);
        let usd_records =
            transform::read_usd_records(&config.load.intermediate_csv, config.transform.usd_scale)?;
        let rates = transform::load_rate_table(&config.transform.exchange_rate_file)?;
        let dataset = transform::transform(&usd_records, &rates, &config.transform.currencies, log)?;
        Self::advance(state, RunState::Transformed);

        // Load
        Self::advance(state, RunState::LoadingFile);
        load::load_to_file(&dataset, &config.load.output_csv, log)?;

        log.log_progress("Starting database connection")?;
        let mut store = Store::open(&config.load.database)?;
        log.log_progress("Connection successfully established")?;

        Self::advance(state, RunState::LoadingStore);
        load::load_to_store(&dataset, &mut store, &config.load.table_name, log)?;

        // Query
        Self::advance(state, RunState::Querying);
        log.log_progress("Starting SQL query execution")?;
        let queries = config
            .report_queries()
            .iter()
            .map(|statement| query::run_query(statement, &store, log))
            .collect::<Result<Vec<_>>>()?;

        store.close()?;
        log.log_progress("Database connection closed")?;

        Self::advance(state, RunState::Done);
        log.log_progress("Process complete")?;

        Ok(RunReport {
            extracted,
            dataset,
            queries,
        })
    }
}
