use crate::core::codec::DEFAULT_VERSION;
use crate::core::grid::{GridLayout, DEFAULT_EARLIEST, DEFAULT_LATEST};
use crate::core::time_parser;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SchedError};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_range,
    validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SEMESTER: &str = "2nd Sem, AY 2025-2026";
pub const DEFAULT_CATALOG_PATH: &str = "./csvjson.json";
pub const DEFAULT_STATE_FILE: &str = "current_schedule.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedConfig {
    pub schedule: ScheduleConfig,
    pub grid: Option<GridConfig>,
    pub catalog: CatalogConfig,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub semester: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// "0700" or "07:00"
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub r#type: String,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub output_path: String,
    pub state_file: Option<String>,
}

/// Catalog backend chosen by `[catalog] type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File { path: String },
    Http { endpoint: String, timeout_seconds: u64 },
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig {
                semester: DEFAULT_SEMESTER.to_string(),
                version: Some(DEFAULT_VERSION.to_string()),
            },
            grid: None,
            catalog: CatalogConfig {
                r#type: "file".to_string(),
                path: Some(DEFAULT_CATALOG_PATH.to_string()),
                endpoint: None,
                timeout_seconds: None,
            },
            storage: None,
        }
    }
}

impl SchedConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SchedError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SchedError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CATALOG_URL})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    fn grid_bound(value: Option<&String>, default: u32, field: &str) -> Result<u32> {
        match value {
            Some(raw) => time_parser::parse_clock(raw.trim()).map_err(|e| {
                SchedError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            }),
            None => Ok(default),
        }
    }

    pub fn earliest_minutes(&self) -> Result<u32> {
        let raw = self.grid.as_ref().and_then(|g| g.earliest.as_ref());
        Self::grid_bound(raw, DEFAULT_EARLIEST, "grid.earliest")
    }

    pub fn latest_minutes(&self) -> Result<u32> {
        let raw = self.grid.as_ref().and_then(|g| g.latest.as_ref());
        Self::grid_bound(raw, DEFAULT_LATEST, "grid.latest")
    }

    pub fn grid_layout(&self) -> Result<GridLayout> {
        GridLayout::new(self.earliest_minutes()?, self.latest_minutes()?)
    }

    pub fn catalog_source(&self) -> Result<CatalogSource> {
        match self.catalog.r#type.as_str() {
            "file" => {
                let path = validate_required_field("catalog.path", &self.catalog.path)?;
                Ok(CatalogSource::File { path: path.clone() })
            }
            "http" => {
                let endpoint = validate_required_field("catalog.endpoint", &self.catalog.endpoint)?;
                Ok(CatalogSource::Http {
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                    timeout_seconds: self.catalog.timeout_seconds.unwrap_or(10),
                })
            }
            other => Err(SchedError::InvalidConfigValueError {
                field: "catalog.type".to_string(),
                value: other.to_string(),
                reason: "Unsupported catalog type. Valid types: file, http".to_string(),
            }),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("schedule.semester", &self.schedule.semester)?;

        // 驗證課表格線範圍
        self.grid_layout()?;

        match self.catalog_source()? {
            CatalogSource::File { path } => {
                validate_path("catalog.path", &path)?;
                validate_file_extension("catalog.path", &path, &["json", "csv"])?;
            }
            CatalogSource::Http {
                endpoint,
                timeout_seconds,
            } => {
                validate_url("catalog.endpoint", &endpoint)?;
                validate_range("catalog.timeout_seconds", timeout_seconds, 1, 300)?;
            }
        }

        validate_path("storage.output_path", self.output_path())?;
        validate_file_extension("storage.state_file", self.state_file(), &["json"])?;

        Ok(())
    }
}

impl ConfigProvider for SchedConfig {
    fn semester(&self) -> &str {
        &self.schedule.semester
    }

    fn document_version(&self) -> &str {
        self.schedule.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    fn output_path(&self) -> &str {
        self.storage
            .as_ref()
            .map(|s| s.output_path.as_str())
            .unwrap_or(".")
    }

    fn state_file(&self) -> &str {
        self.storage
            .as_ref()
            .and_then(|s| s.state_file.as_deref())
            .unwrap_or(DEFAULT_STATE_FILE)
    }
}

impl Validate for SchedConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[schedule]
semester = "1st Sem, AY 2026-2027"

[grid]
earliest = "0730"
latest = "19:30"

[catalog]
type = "file"
path = "./sections.csv"
"#;

        let config = SchedConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.semester(), "1st Sem, AY 2026-2027");
        assert_eq!(config.document_version(), "1.0");
        assert_eq!(config.earliest_minutes().unwrap(), 450);
        assert_eq!(config.latest_minutes().unwrap(), 1170);
        assert_eq!(config.grid_layout().unwrap().row_count(), 24);
        assert_eq!(config.state_file(), DEFAULT_STATE_FILE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SCHED_TEST_CATALOG_URL", "http://127.0.0.1:5000");

        let toml_content = r#"
[schedule]
semester = "test"

[catalog]
type = "http"
endpoint = "${SCHED_TEST_CATALOG_URL}/"
timeout_seconds = 5
"#;

        let config = SchedConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.catalog_source().unwrap(),
            CatalogSource::Http {
                endpoint: "http://127.0.0.1:5000".to_string(),
                timeout_seconds: 5
            }
        );

        std::env::remove_var("SCHED_TEST_CATALOG_URL");
    }

    #[test]
    fn test_config_validation() {
        let bad_catalog = r#"
[schedule]
semester = "test"

[catalog]
type = "database"
"#;
        let config = SchedConfig::from_toml_str(bad_catalog).unwrap();
        assert!(config.validate().is_err());

        let bad_grid = r#"
[schedule]
semester = "test"

[grid]
earliest = "2000"
latest = "1900"

[catalog]
type = "file"
path = "sections.json"
"#;
        let config = SchedConfig::from_toml_str(bad_grid).unwrap();
        assert!(config.validate().is_err());

        let missing_endpoint = r#"
[schedule]
semester = "test"

[catalog]
type = "http"
"#;
        let config = SchedConfig::from_toml_str(missing_endpoint).unwrap();
        assert!(matches!(
            config.validate(),
            Err(SchedError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[schedule]
semester = "file-test"
version = "1.1"

[catalog]
type = "file"
path = "catalog.json"

[storage]
output_path = "./schedules"
state_file = "mine.json"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = SchedConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.semester(), "file-test");
        assert_eq!(config.document_version(), "1.1");
        assert_eq!(config.output_path(), "./schedules");
        assert_eq!(config.state_file(), "mine.json");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SchedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid_layout().unwrap().row_count(), 28);
    }
}
