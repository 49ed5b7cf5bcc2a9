use crate::adapters::Store;
use crate::domain::model::{
    format_decimal, Dataset, EnrichedRecord, RawRecord, BANK_NAME_COLUMN, RAW_VALUE_COLUMN,
    USD_COLUMN,
};
use crate::domain::ports::ProgressLog;
use crate::utils::error::{EtlError, Result};
use rusqlite::params_from_iter;
use std::io::{Read, Write};
use std::path::Path;

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// 擷取結果的中繼 CSV，原始欄位名稱
pub fn write_extracted_csv<P: AsRef<Path>>(records: &[RawRecord], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record([BANK_NAME_COLUMN, RAW_VALUE_COLUMN])?;
    for record in records {
        writer.write_record([
            record.name.clone(),
            format_decimal(record.market_cap_usd_millions),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(dataset.columns())?;

    for record in &dataset.records {
        let mut row = vec![record.name.clone(), format_decimal(record.usd_billion)];
        row.extend(
            record
                .converted
                .iter()
                .map(|(_, amount)| format_decimal(*amount)),
        );
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Overwrites `path` with the dataset as comma-separated text with a header row.
pub fn load_to_file<P: AsRef<Path>>(dataset: &Dataset, path: P, log: &dyn ProgressLog) -> Result<()> {
    log.log_progress("Starting data load to CSV")?;

    let file = std::fs::File::create(path.as_ref())?;
    write_dataset(dataset, file)?;
    tracing::debug!(
        "Wrote {} row(s) to {}",
        dataset.len(),
        path.as_ref().display()
    );

    log.log_progress("Data successfully saved to CSV")?;
    Ok(())
}

/// 讀回 `load_to_file` 輸出的檔案
pub fn read_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let expect = |index: usize, column: &str| match headers.get(index) {
        Some(h) if h == column => Ok(()),
        _ => Err(EtlError::SchemaError {
            column: column.to_string(),
        }),
    };
    expect(0, BANK_NAME_COLUMN)?;
    expect(1, USD_COLUMN)?;

    let currencies = headers
        .iter()
        .skip(2)
        .map(|header| {
            header
                .strip_prefix("MC_")
                .and_then(|rest| rest.strip_suffix("_Billion"))
                .map(str::to_string)
                .ok_or_else(|| EtlError::SchemaError {
                    column: header.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let parse = |raw: &str| {
        raw.parse::<f64>().map_err(|_| EtlError::ValidationError {
            message: format!("'{}' is not a number", raw),
        })
    };

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let usd_billion = parse(row.get(1).unwrap_or_default())?;
        let converted = currencies
            .iter()
            .enumerate()
            .map(|(i, code)| -> Result<(String, f64)> {
                Ok((code.clone(), parse(row.get(i + 2).unwrap_or_default())?))
            })
            .collect::<Result<Vec<_>>>()?;

        records.push(EnrichedRecord {
            name: row.get(0).unwrap_or_default().to_string(),
            usd_billion,
            converted,
        });
    }

    Ok(Dataset {
        currencies,
        records,
    })
}

/// Drops and recreates `table_name`, then inserts every record in order.
///
/// Indexes or constraints previously defined on the table are gone afterwards.
/// Rows are inserted in one transaction; the drop is not rolled back on failure.
pub fn load_to_store(
    dataset: &Dataset,
    store: &mut Store,
    table_name: &str,
    log: &dyn ProgressLog,
) -> Result<()> {
    log.log_progress("Starting data load to database")?;

    let table = quote_ident(table_name);
    let columns = dataset.columns();
    let column_defs: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let sql_type = if i == 0 { "TEXT" } else { "REAL" };
            format!("{} {}", quote_ident(column), sql_type)
        })
        .collect();

    let conn = store.connection_mut();
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} ({defs});",
        table = table,
        defs = column_defs.join(", ")
    ))?;

    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
        (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let tx = conn.transaction()?;
    {
        let mut statement = tx.prepare(&insert_sql)?;
        for record in &dataset.records {
            let mut values: Vec<rusqlite::types::Value> = vec![
                record.name.clone().into(),
                record.usd_billion.into(),
            ];
            values.extend(record.converted.iter().map(|(_, amount)| (*amount).into()));
            statement.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;
    tracing::debug!("Inserted {} row(s) into {}", dataset.len(), table_name);

    log.log_progress("Data successfully loaded to database")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MemoryLog;
    use tempfile::TempDir;

    fn sample_dataset() -> Dataset {
        Dataset {
            currencies: vec!["GBP".to_string(), "EUR".to_string(), "INR".to_string()],
            records: vec![
                EnrichedRecord {
                    name: "JPMorgan Chase".to_string(),
                    usd_billion: 432.92,
                    converted: vec![
                        ("GBP".to_string(), 346.34),
                        ("EUR".to_string(), 402.62),
                        ("INR".to_string(), 35910.71),
                    ],
                },
                EnrichedRecord {
                    name: "Bank, \"quoted\"".to_string(),
                    usd_billion: 10.0,
                    converted: vec![
                        ("GBP".to_string(), 8.0),
                        ("EUR".to_string(), 9.3),
                        ("INR".to_string(), 829.5),
                    ],
                },
            ],
        }
    }

    #[test]
    fn test_load_to_file_writes_header_and_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bank_market_cap_gbp_eur_inr.csv");
        std::fs::write(&path, "stale content that must disappear\n".repeat(10)).unwrap();
        let log = MemoryLog::default();

        load_to_file(&sample_dataset(), &path, &log).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Bank name,MC_USD_Billion,MC_GBP_Billion,MC_EUR_Billion,MC_INR_Billion",
                "JPMorgan Chase,432.92,346.34,402.62,35910.71",
                "\"Bank, \"\"quoted\"\"\",10.0,8.0,9.3,829.5",
            ]
        );
        assert_eq!(
            log.messages(),
            vec!["Starting data load to CSV", "Data successfully saved to CSV"]
        );
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        let dataset = sample_dataset();

        load_to_file(&dataset, &path, &MemoryLog::default()).unwrap();
        let reread = read_dataset(std::fs::File::open(&path).unwrap()).unwrap();

        assert_eq!(reread, dataset);
    }

    #[test]
    fn test_read_dataset_rejects_foreign_header() {
        let err = read_dataset("Name,MC_USD_Billion\nx,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, EtlError::SchemaError { ref column } if column == "Bank name"));
    }

    #[test]
    fn test_write_extracted_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bank_market_cap.csv");
        let records = vec![RawRecord {
            name: "BankA".to_string(),
            market_cap_usd_millions: 1234.5,
        }];

        write_extracted_csv(&records, &path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Bank name,Market capitalization(US$million)\nBankA,1234.5\n"
        );
    }

    #[test]
    fn test_load_to_store_replaces_table() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                "CREATE TABLE Largest_banks (old_column INTEGER);
                 INSERT INTO Largest_banks VALUES (1), (2), (3);
                 CREATE INDEX idx_old ON Largest_banks(old_column);",
            )
            .unwrap();
        let dataset = sample_dataset();
        let log = MemoryLog::default();

        load_to_store(&dataset, &mut store, "Largest_banks", &log).unwrap();
        load_to_store(&dataset, &mut store, "Largest_banks", &log).unwrap();

        let conn = store.connection();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM Largest_banks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);

        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_old'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 0);

        let columns: Vec<String> = conn
            .prepare("SELECT * FROM Largest_banks")
            .unwrap()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(columns, dataset.columns());

        let names: Vec<String> = conn
            .prepare("SELECT \"Bank name\" FROM Largest_banks")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(names, vec!["JPMorgan Chase", "Bank, \"quoted\""]);

        assert_eq!(
            log.messages(),
            vec![
                "Starting data load to database",
                "Data successfully loaded to database",
                "Starting data load to database",
                "Data successfully loaded to database",
            ]
        );
    }

    #[test]
    fn test_load_empty_dataset_creates_table() {
        let mut store = Store::open_in_memory().unwrap();
        let dataset = Dataset {
            currencies: vec!["GBP".to_string()],
            records: vec![],
        };

        load_to_store(&dataset, &mut store, "Largest_banks", &MemoryLog::default()).unwrap();

        assert!(store.table_exists("Largest_banks").unwrap());
    }
}
