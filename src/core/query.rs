use crate::adapters::Store;
use crate::domain::model::{QueryResult, Row, Value};
use crate::domain::ports::ProgressLog;
use crate::utils::error::Result;
use rusqlite::types::ValueRef;

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Text(format!("<{} byte blob>", bytes.len())),
    }
}

/// Runs `statement` as given and collects every row in result order.
///
/// The statement is written to the audit log verbatim before it runs. Nothing
/// here validates or rewrites it.
pub fn run_query(statement: &str, store: &Store, log: &dyn ProgressLog) -> Result<QueryResult> {
    log.log_progress(&format!("Executing query: {}", statement))?;

    let mut prepared = store.connection().prepare(statement)?;
    let columns: Vec<String> = prepared
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = prepared.query([])?;
    while let Some(row) = cursor.next()? {
        let values = (0..width)
            .map(|i| row.get_ref(i).map(to_value))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.push(Row { values });
    }

    tracing::debug!("Query returned {} row(s)", rows.len());

    Ok(QueryResult {
        statement: statement.to_string(),
        columns,
        rows,
    })
}
