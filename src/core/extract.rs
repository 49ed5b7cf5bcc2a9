use crate::config::ExtractConfig;
use crate::domain::model::{Extracted, RawRecord};
use crate::domain::ports::ProgressLog;
use crate::utils::error::{EtlError, Result};
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EtlError::ValidationError {
        message: format!("invalid selector '{}': {}", css, e),
    })
}

/// 所有文字節點各自去除空白後直接串接
fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect()
}

/// Thousands separators are stripped; negative or non-finite values are rejected.
pub fn parse_market_cap(text: &str) -> Option<f64> {
    text.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// 從頁面中第 `table_index` 個表格擷取 (銀行名稱, 市值)
///
/// The first `<tr>` is treated as the header. Rows with too few `<td>` cells or
/// an unparseable value are dropped and counted in [`Extracted::skipped`].
pub fn extract(markup: &str, config: &ExtractConfig, log: &dyn ProgressLog) -> Result<Extracted> {
    log.log_progress("Starting data extraction")?;

    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;

    let document = Html::parse_document(markup);
    let tables: Vec<ElementRef<'_>> = document.select(&table_selector).collect();
    tracing::debug!("Document contains {} table(s)", tables.len());

    let table = tables
        .get(config.table_index)
        .ok_or(EtlError::StructureNotFound {
            index: config.table_index,
            found: tables.len(),
        })?;

    let min_cells = config.min_cells();
    let mut extracted = Extracted::default();

    for (position, row) in table.select(&row_selector).enumerate().skip(1) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        if cells.len() < min_cells {
            tracing::debug!("Skipping row {}: {} cell(s)", position, cells.len());
            extracted.skipped += 1;
            continue;
        }

        let value_text = cell_text(&cells[config.value_column]);
        match parse_market_cap(&value_text) {
            Some(market_cap_usd_millions) => extracted.records.push(RawRecord {
                name: cell_text(&cells[config.name_column]),
                market_cap_usd_millions,
            }),
            None => {
                tracing::debug!("Skipping row {}: unparseable value '{}'", position, value_text);
                extracted.skipped += 1;
            }
        }
    }

    tracing::info!(
        "Extracted {} record(s), skipped {} row(s)",
        extracted.records.len(),
        extracted.skipped
    );
    log.log_progress("Data extraction complete")?;

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MemoryLog;

    fn page(third_table_rows: &str) -> String {
        format!(
            r#"<html><body>
<table><tr><td>nav</td></tr></table>
<table><tr><th>Rank</th><th>Bank</th></tr><tr><td>1</td><td>Other</td><td>5</td></tr></table>
<table>
  <tr><th>Rank</th><th>Bank name</th><th>Market cap</th></tr>
  {}
</table>
</body></html>"#,
            third_table_rows
        )
    }

    #[test]
    fn test_extract_skips_unparseable_values() {
        let markup = page(
            r#"<tr><td></td><td>BankA</td><td>1,234.5</td></tr>
               <tr><td></td><td>BankB</td><td>abc</td></tr>"#,
        );
        let log = MemoryLog::default();

        let extracted = extract(&markup, &ExtractConfig::default(), &log).unwrap();

        assert_eq!(
            extracted.records,
            vec![RawRecord {
                name: "BankA".to_string(),
                market_cap_usd_millions: 1234.5,
            }]
        );
        assert_eq!(extracted.skipped, 1);
        assert_eq!(
            log.messages(),
            vec!["Starting data extraction", "Data extraction complete"]
        );
    }

    #[test]
    fn test_extract_preserves_order_and_drops_short_rows() {
        let markup = page(
            r#"<tr><td>1</td><td>JPMorgan Chase</td><td>432.92</td></tr>
               <tr><td>2</td><td>only two</td></tr>
               <tr><td>3</td><td>Bank of America</td><td>231.52</td></tr>
               <tr><td>4</td><td>Negative Bank</td><td>-5</td></tr>
               <tr><td>5</td><td>ICBC</td><td>194.56</td><td>extra</td></tr>"#,
        );

        let extracted = extract(&markup, &ExtractConfig::default(), &MemoryLog::default()).unwrap();

        let names: Vec<&str> = extracted.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["JPMorgan Chase", "Bank of America", "ICBC"]);
        assert_eq!(extracted.records[2].market_cap_usd_millions, 194.56);
        assert_eq!(extracted.skipped, 2);
    }

    #[test]
    fn test_extract_strips_nested_markup() {
        let markup = page(
            r#"<tr><td>1</td><td>
                 <span class="flag"></span> <a href="/wiki/HSBC">HSBC</a>
               </td><td> 160.68
               </td></tr>"#,
        );

        let extracted = extract(&markup, &ExtractConfig::default(), &MemoryLog::default()).unwrap();

        assert_eq!(extracted.records.len(), 1);
        assert_eq!(extracted.records[0].name, "HSBC");
        assert_eq!(extracted.records[0].market_cap_usd_millions, 160.68);
    }

    #[test]
    fn test_extract_missing_table() {
        let markup = "<table><tr><td>a</td></tr></table><table></table>";
        let log = MemoryLog::default();

        let err = extract(markup, &ExtractConfig::default(), &log).unwrap_err();

        assert!(matches!(err, EtlError::StructureNotFound { index: 2, found: 2 }));
        assert_eq!(log.messages(), vec!["Starting data extraction"]);
    }

    #[test]
    fn test_extract_header_only_table() {
        let extracted = extract(&page(""), &ExtractConfig::default(), &MemoryLog::default()).unwrap();
        assert!(extracted.records.is_empty());
        assert_eq!(extracted.skipped, 0);
    }

    #[test]
    fn test_extract_with_custom_columns() {
        let markup = "<table><tr><th>h</th></tr><tr><td>7.5</td><td>BankZ</td></tr></table>";
        let config = ExtractConfig {
            table_index: 0,
            name_column: 1,
            value_column: 0,
        };

        let extracted = extract(markup, &config, &MemoryLog::default()).unwrap();

        assert_eq!(extracted.records[0].name, "BankZ");
        assert_eq!(extracted.records[0].market_cap_usd_millions, 7.5);
    }

    #[test]
    fn test_parse_market_cap() {
        assert_eq!(parse_market_cap("1,234.5"), Some(1234.5));
        assert_eq!(parse_market_cap("0"), Some(0.0));
        assert_eq!(parse_market_cap("abc"), None);
        assert_eq!(parse_market_cap(""), None);
        assert_eq!(parse_market_cap("-1"), None);
        assert_eq!(parse_market_cap("inf"), None);
        assert_eq!(parse_market_cap("NaN"), None);
    }
}
