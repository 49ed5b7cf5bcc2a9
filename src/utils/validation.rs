use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> EtlError {
    EtlError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_positive_factor(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            field_name,
            value,
            "Value must be a finite number greater than zero",
        ));
    }
    Ok(())
}

/// 表名會直接拼進 SQL，只允許字母、數字與底線
pub fn validate_sql_identifier(field_name: &str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    if !starts_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(
            field_name,
            value,
            "Must start with a letter or underscore and contain only letters, digits and underscores",
        ));
    }
    Ok(())
}

pub fn validate_currency_code(field_name: &str, code: &str) -> Result<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(invalid(
            field_name,
            code,
            "Currency codes are three upper-case letters, e.g. GBP",
        ));
    }
    Ok(())
}

pub fn validate_unique<'a>(field_name: &str, values: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(invalid(field_name, value, "Duplicate entry"));
        }
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("source.url", "https://example.com").is_ok());
        assert!(validate_url("source.url", "http://example.com").is_ok());
        assert!(validate_url("source.url", "").is_err());
        assert!(validate_url("source.url", "invalid-url").is_err());
        assert!(validate_url("source.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_sql_identifier() {
        assert!(validate_sql_identifier("load.table_name", "Largest_banks").is_ok());
        assert!(validate_sql_identifier("load.table_name", "_t1").is_ok());
        assert!(validate_sql_identifier("load.table_name", "").is_err());
        assert!(validate_sql_identifier("load.table_name", "1banks").is_err());
        assert!(validate_sql_identifier("load.table_name", "banks; DROP TABLE x").is_err());
    }

    #[test]
    fn test_validate_currency_code() {
        assert!(validate_currency_code("transform.currencies", "INR").is_ok());
        assert!(validate_currency_code("transform.currencies", "inr").is_err());
        assert!(validate_currency_code("transform.currencies", "EURO").is_err());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique("transform.currencies", ["GBP", "EUR"]).is_ok());
        assert!(validate_unique("transform.currencies", ["GBP", "GBP"]).is_err());
    }

    #[test]
    fn test_validate_positive_factor() {
        assert!(validate_positive_factor("transform.usd_scale", 0.001).is_ok());
        assert!(validate_positive_factor("transform.usd_scale", 0.0).is_err());
        assert!(validate_positive_factor("transform.usd_scale", f64::NAN).is_err());
    }
}
