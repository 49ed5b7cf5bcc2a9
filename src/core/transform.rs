use crate::domain::model::{
    Dataset, EnrichedRecord, RateTable, UsdRecord, BANK_NAME_COLUMN, RAW_VALUE_COLUMN,
};
use crate::domain::ports::ProgressLog;
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Rate used for a configured currency that the rate table does not list.
pub const FALLBACK_RATE: f64 = 1.0;

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: f64,
}

/// 讀取匯率檔（`Currency,Rate`）
pub fn load_rate_table<P: AsRef<Path>>(path: P) -> Result<RateTable> {
    let file = std::fs::File::open(path.as_ref())?;
    let rates = parse_rate_table(file)?;
    tracing::debug!(
        "Loaded {} exchange rate(s) from {}",
        rates.len(),
        path.as_ref().display()
    );
    Ok(rates)
}

pub fn parse_rate_table<R: Read>(reader: R) -> Result<RateTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rates = HashMap::new();
    for row in csv_reader.deserialize::<RateRow>() {
        let row = row?;
        if !row.rate.is_finite() || row.rate <= 0.0 {
            return Err(EtlError::ValidationError {
                message: format!("rate for {} must be positive, got {}", row.currency, row.rate),
            });
        }
        if rates.insert(row.currency.clone(), row.rate).is_some() {
            return Err(EtlError::ValidationError {
                message: format!("currency {} is listed more than once", row.currency),
            });
        }
    }

    Ok(RateTable::new(rates))
}

/// 重新讀取中繼 CSV，並把市值欄位改名為 MC_USD_Billion
///
/// Header names are trimmed before lookup. Either expected column missing is a
/// [`EtlError::SchemaError`]; every value is multiplied by `usd_scale`.
pub fn read_usd_records<P: AsRef<Path>>(path: P, usd_scale: f64) -> Result<Vec<UsdRecord>> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_usd_records(file, usd_scale)
}

pub fn parse_usd_records<R: Read>(reader: R, usd_scale: f64) -> Result<Vec<UsdRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| EtlError::SchemaError {
                column: name.to_string(),
            })
    };
    let name_index = column(BANK_NAME_COLUMN)?;
    let value_index = column(RAW_VALUE_COLUMN)?;

    let mut records = Vec::new();
    for (line, row) in csv_reader.records().enumerate() {
        let row = row?;
        let name = row.get(name_index).unwrap_or_default().to_string();
        let raw = row.get(value_index).unwrap_or_default();
        let value: f64 = raw.trim().parse().map_err(|_| EtlError::ValidationError {
            message: format!(
                "row {}: '{}' in column '{}' is not a number",
                line + 1,
                raw,
                RAW_VALUE_COLUMN
            ),
        })?;

        records.push(UsdRecord {
            name,
            usd_billion: value * usd_scale,
        });
    }

    Ok(records)
}

/// numpy 的 round(x, 2)：銀行家捨入
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Adds one `round(usd * rate, 2)` column per currency, in `currencies` order.
///
/// A currency missing from `rates` is converted at [`FALLBACK_RATE`], so its
/// column repeats the USD figure. A warning is emitted whenever that happens.
pub fn transform(
    records: &[UsdRecord],
    rates: &RateTable,
    currencies: &[String],
    log: &dyn ProgressLog,
) -> Result<Dataset> {
    log.log_progress("Starting data transformation")?;

    let resolved: Vec<(&String, f64)> = currencies
        .iter()
        .map(|code| {
            let rate = rates.get(code).unwrap_or_else(|| {
                tracing::warn!(
                    "⚠️ No exchange rate for {}; using fallback rate {}",
                    code,
                    FALLBACK_RATE
                );
                FALLBACK_RATE
            });
            (code, rate)
        })
        .collect();

    let enriched = records
        .iter()
        .map(|record| EnrichedRecord {
            name: record.name.clone(),
            usd_billion: record.usd_billion,
            converted: resolved
                .iter()
                .map(|(code, rate)| ((*code).clone(), round2(record.usd_billion * rate)))
                .collect(),
        })
        .collect();

    log.log_progress("Data transformation complete")?;

    Ok(Dataset {
        currencies: currencies.to_vec(),
        records: enriched,
    })
}
