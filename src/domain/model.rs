use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

pub const BANK_NAME_COLUMN: &str = "Bank name";
pub const RAW_VALUE_COLUMN: &str = "Market capitalization(US$million)";
pub const USD_COLUMN: &str = "MC_USD_Billion";

/// `MC_<CCY>_Billion`
pub fn currency_column(code: &str) -> String {
    format!("MC_{}_Billion", code)
}

/// One row of the source table as scraped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    pub name: String,
    pub market_cap_usd_millions: f64,
}

/// Output of the extraction stage; `skipped` counts rows dropped by the row filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub records: Vec<RawRecord>,
    pub skipped: usize,
}

/// A raw record after the CSV round-trip, with the value column renamed to `MC_USD_Billion`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsdRecord {
    pub name: String,
    pub usd_billion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub name: String,
    pub usd_billion: f64,
    /// (currency code, amount) in configured currency order
    pub converted: Vec<(String, f64)>,
}

impl EnrichedRecord {
    pub fn amount(&self, code: &str) -> Option<f64> {
        self.converted
            .iter()
            .find(|(ccy, _)| ccy == code)
            .map(|(_, amount)| *amount)
    }
}

/// Ordered collection of enriched records plus the currency layout shared by every row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub currencies: Vec<String>,
    pub records: Vec<EnrichedRecord>,
}

impl Dataset {
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![BANK_NAME_COLUMN.to_string(), USD_COLUMN.to_string()];
        columns.extend(self.currencies.iter().map(|code| currency_column(code)));
        columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Currency code to USD conversion factor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => f.write_str(&format_decimal(*v)),
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// One result row; values are in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub statement: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.values.get(index)
    }

    /// column name → value maps, for consumers that want records rather than a grid
    ///
    /// Repeated column names get a numeric suffix (`a`, `a_1`, ...) so no value is dropped.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        let keys = self.json_keys();
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = self
            .rows
            .iter()
            .map(|row| {
                keys.iter()
                    .cloned()
                    .zip(row.values.iter().map(serde_json::to_value))
                    .map(|(column, value)| value.map(|v| (column, v)))
                    .collect::<serde_json::Result<serde_json::Map<_, _>>>()
            })
            .collect::<serde_json::Result<_>>()?;
        serde_json::to_value(rows)
    }

    fn json_keys(&self) -> Vec<String> {
        let mut seen: HashSet<String> = self.columns.iter().cloned().collect();
        let mut used: HashSet<&str> = HashSet::new();
        self.columns
            .iter()
            .map(|column| {
                if used.insert(column.as_str()) {
                    return column.clone();
                }
                let mut suffix = 1;
                loop {
                    let candidate = format!("{}_{}", column, suffix);
                    if seen.insert(candidate.clone()) {
                        return candidate;
                    }
                    suffix += 1;
                }
            })
            .collect()
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.values.iter().map(ToString::to_string).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(column, width)| format!("{:<width$}", column, width = width))
            .collect();
        writeln!(f, "{}", header.join("  ").trim_end())?;

        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = width))
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }
}

/// 與 pandas 輸出一致：整數值保留 `.0`
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
