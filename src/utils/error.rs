use crate::domain::model::Conflict;
use thiserror::Error;

/// 時間字串解析失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("Malformed schedule time: {raw:?}")]
    Malformed { raw: String },

    #[error("Invalid clock value {token:?} (expected HHMM)")]
    InvalidClock { token: String },

    #[error("No recognised meeting days in {raw:?}")]
    NoDays { raw: String },

    #[error("End time {end} is not after start time {start}")]
    EmptyRange { start: u32, end: u32 },
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("Time parsing failed: {0}")]
    Parse(#[from] ParseFailure),

    #[error("Schedule conflict: {0}")]
    Conflict(Conflict),

    #[error("Section {id} is already on the schedule")]
    DuplicateSection { id: String },

    #[error("Invalid schedule file format: {message}")]
    InvalidFormat { message: String },

    #[error("Section not found: {subject_code} {section}")]
    SectionNotFound { subject_code: String, section: String },

    #[error("Catalog request failed: {message}")]
    Catalog { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value:?}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Schedule,
    Persistence,
    Catalog,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SchedError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SchedError::Parse(_) => ErrorCategory::Input,
            SchedError::Conflict(_) | SchedError::DuplicateSection { .. } => {
                ErrorCategory::Schedule
            }
            SchedError::InvalidFormat { .. } | SchedError::SerializationError(_) => {
                ErrorCategory::Persistence
            }
            SchedError::SectionNotFound { .. }
            | SchedError::Catalog { .. }
            | SchedError::ApiError(_)
            | SchedError::CsvError(_) => ErrorCategory::Catalog,
            SchedError::ConfigError { .. }
            | SchedError::MissingConfigError { .. }
            | SchedError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            SchedError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 使用者可直接修正的錯誤
            ErrorCategory::Input | ErrorCategory::Schedule => ErrorSeverity::High,
            ErrorCategory::Persistence | ErrorCategory::Configuration => ErrorSeverity::High,
            // 遠端目錄可能只是暫時無法使用
            ErrorCategory::Catalog => match self {
                SchedError::SectionNotFound { .. } => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SchedError::Parse(_) => {
                "Check the section's time string, e.g. \"M-TH 1230-1400\"".to_string()
            }
            SchedError::Conflict(conflict) => format!(
                "Remove {} first or pick a section that meets at a different time",
                conflict.conflicting_label
            ),
            SchedError::DuplicateSection { id } => {
                format!("{} is already placed; remove it before adding it again", id)
            }
            SchedError::InvalidFormat { .. } | SchedError::SerializationError(_) => {
                "Make sure the file is a schedule JSON file produced by `save`".to_string()
            }
            SchedError::SectionNotFound { .. } => {
                "Run `sections <CODE>` to see the offered sections".to_string()
            }
            SchedError::Catalog { .. } | SchedError::ApiError(_) => {
                "Check that the catalog backend is reachable and retry".to_string()
            }
            SchedError::CsvError(_) => {
                "Check the catalog export headers and encoding".to_string()
            }
            SchedError::ConfigError { .. }
            | SchedError::MissingConfigError { .. }
            | SchedError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line options".to_string()
            }
            SchedError::IoError(_) => "Check file paths and permissions".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SchedError::Conflict(conflict) => format!(
                "Schedule conflict detected! Conflicts with {} ({} {})",
                conflict.conflicting_label, conflict.day, conflict.time_range
            ),
            SchedError::InvalidFormat { .. } => "Invalid schedule file format.".to_string(),
            SchedError::SectionNotFound { .. } => "Section not found".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedError>;
