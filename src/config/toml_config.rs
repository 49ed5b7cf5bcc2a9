use crate::config::RunConfig;
use crate::domain::model::{currency_column, USD_COLUMN};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use std::path::Path;

impl RunConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，未填欄位使用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 目前生效的配置，輸出成可再載入的 TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| EtlError::ConfigError {
            message: format!("TOML serialization error: {}", e),
        })
    }
}

/// 替換環境變數 (例如 ${DATA_DIR})；未設定的變數保持原樣
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
        message: format!("Invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.into_owned())
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap_or_default()
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        // 來源：有本機檔案時不檢查 URL
        match &self.source.file {
            Some(file) => validation::validate_path("source.file", path_str(file))?,
            None => validation::validate_url("source.url", &self.source.url)?,
        }
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_positive_number("source.timeout_seconds", timeout as usize, 1)?;
        }

        if self.extract.name_column == self.extract.value_column {
            return Err(EtlError::InvalidConfigValueError {
                field: "extract.value_column".to_string(),
                value: self.extract.value_column.to_string(),
                reason: "Name and value columns must differ".to_string(),
            });
        }

        validation::validate_path(
            "transform.exchange_rate_file",
            path_str(&self.transform.exchange_rate_file),
        )?;
        for code in &self.transform.currencies {
            validation::validate_currency_code("transform.currencies", code)?;
            // USD 欄位已固定存在
            if currency_column(code) == USD_COLUMN {
                return Err(EtlError::InvalidConfigValueError {
                    field: "transform.currencies".to_string(),
                    value: code.clone(),
                    reason: format!("{} is always written; list target currencies only", USD_COLUMN),
                });
            }
        }
        validation::validate_unique(
            "transform.currencies",
            self.transform.currencies.iter().map(String::as_str),
        )?;
        validation::validate_positive_factor("transform.usd_scale", self.transform.usd_scale)?;

        validation::validate_path("load.intermediate_csv", path_str(&self.load.intermediate_csv))?;
        validation::validate_path("load.output_csv", path_str(&self.load.output_csv))?;
        validation::validate_path("load.database", path_str(&self.load.database))?;
        validation::validate_sql_identifier("load.table_name", &self.load.table_name)?;

        validation::validate_currency_code("query.average_currency", &self.query.average_currency)?;
        if !self
            .transform
            .currencies
            .contains(&self.query.average_currency)
        {
            return Err(EtlError::InvalidConfigValueError {
                field: "query.average_currency".to_string(),
                value: self.query.average_currency.clone(),
                reason: "Must be one of transform.currencies".to_string(),
            });
        }
        validation::validate_positive_number("query.top_n", self.query.top_n, 1)?;
        for statement in &self.query.extra {
            validation::validate_non_empty_string("query.extra", statement)?;
        }

        validation::validate_path("logging.log_file", path_str(&self.logging.log_file))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = RunConfig::from_toml_str(
            r#"
[transform]
currencies = ["JPY", "EUR"]

[load]
table_name = "banks_2023"

[query]
average_currency = "JPY"
"#,
        )
        .unwrap();

        assert_eq!(config.transform.currencies, vec!["JPY", "EUR"]);
        assert_eq!(
            config.transform.exchange_rate_file,
            PathBuf::from("exchange_rate.csv")
        );
        assert_eq!(config.load.table_name, "banks_2023");
        assert_eq!(config.load.database, PathBuf::from("Banks.db"));
        assert_eq!(config.extract.table_index, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("BANK_ETL_TEST_DIR", "/tmp/bank-etl");
        let config = RunConfig::from_toml_str(
            r#"
[load]
database = "${BANK_ETL_TEST_DIR}/Banks.db"
output_csv = "${BANK_ETL_UNSET_VARIABLE}/out.csv"
"#,
        )
        .unwrap();

        assert_eq!(config.load.database, PathBuf::from("/tmp/bank-etl/Banks.db"));
        assert_eq!(
            config.load.output_csv,
            PathBuf::from("${BANK_ETL_UNSET_VARIABLE}/out.csv")
        );
    }

    #[test]
    fn test_effective_config_reloads_unchanged() {
        let mut config = RunConfig::default();
        config.source.file = Some(PathBuf::from("saved/largest_banks.html"));
        config.transform.usd_scale = 0.001;
        config.query.extra = vec!["SELECT COUNT(*) FROM Largest_banks".to_string()];

        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("[transform]"));
        assert!(rendered.contains("table_name = \"Largest_banks\""));

        assert_eq!(RunConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = RunConfig::from_toml_str("[load\ntable_name = 1").unwrap_err();
        assert!(matches!(err, EtlError::ConfigError { .. }));
    }

    #[test]
    fn test_validation_rejects_bad_table_name() {
        let mut config = RunConfig::default();
        config.load.table_name = "Largest banks".to_string();
        assert!(matches!(
            config.validate(),
            Err(EtlError::InvalidConfigValueError { ref field, .. }) if field == "load.table_name"
        ));
    }

    #[test]
    fn test_validation_rejects_average_outside_currencies() {
        let mut config = RunConfig::default();
        config.query.average_currency = "JPY".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_usd_as_target_currency() {
        let mut config = RunConfig::default();
        config.transform.currencies = vec!["USD".to_string(), "GBP".to_string()];

        assert!(matches!(
            config.validate(),
            Err(EtlError::InvalidConfigValueError { ref field, ref value, .. })
                if field == "transform.currencies" && value == "USD"
        ));
    }

    #[test]
    fn test_source_file_skips_url_check() {
        let mut config = RunConfig::default();
        config.source.url = String::new();
        assert!(config.validate().is_err());

        config.source.file = Some(PathBuf::from("page.html"));
        assert!(config.validate().is_ok());
    }
}
