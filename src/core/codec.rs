use crate::core::schedule::Schedule;
use crate::domain::model::{LoadFailure, LoadReport, SavedClass, ScheduleDocument};
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::{Result, SchedError};
use crate::utils::validation::validate_file_extension;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

pub const DEFAULT_VERSION: &str = "1.0";

/// Converts schedules to and from [`ScheduleDocument`].
#[derive(Debug, Clone)]
pub struct ScheduleCodec {
    version: String,
    semester: String,
}

impl ScheduleCodec {
    pub fn new(version: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            semester: semester.into(),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.document_version(), config.semester())
    }

    pub fn semester(&self) -> &str {
        &self.semester
    }

    pub fn save(&self, schedule: &Schedule) -> ScheduleDocument {
        self.save_at(schedule, Utc::now())
    }

    pub fn save_at(&self, schedule: &Schedule, saved_date: DateTime<Utc>) -> ScheduleDocument {
        ScheduleDocument {
            version: self.version.clone(),
            saved_date: Some(saved_date),
            semester: self.semester.clone(),
            classes: schedule.list().iter().map(SavedClass::from_placed).collect(),
            rejected: Vec::new(),
        }
    }

    /// 讀取 JSON 並確認含有 `classes` 陣列
    ///
    /// Only a missing `classes` array fails the whole document. Entries that
    /// cannot be read are kept in [`ScheduleDocument::rejected`] and the
    /// header fields fall back to empty values.
    pub fn parse(&self, json: &str) -> Result<ScheduleDocument> {
        let mut value: Value = serde_json::from_str(json).map_err(|e| SchedError::InvalidFormat {
            message: format!("not valid JSON: {}", e),
        })?;

        let entries = value
            .get_mut("classes")
            .and_then(Value::as_array_mut)
            .map(std::mem::take)
            .ok_or_else(|| SchedError::InvalidFormat {
                message: "missing `classes` array".to_string(),
            })?;

        let mut document: ScheduleDocument = serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable schedule header: {}", e);
            ScheduleDocument::default()
        });

        for (index, entry) in entries.into_iter().enumerate() {
            let id = entry_label(&entry, index);
            match serde_json::from_value::<SavedClass>(entry) {
                Ok(saved) => document.classes.push(saved),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry {}: {}", id, e);
                    document.rejected.push(LoadFailure {
                        id,
                        reason: format!("unreadable entry: {}", e),
                    });
                }
            }
        }

        Ok(document)
    }

    pub fn to_json(&self, document: &ScheduleDocument) -> Result<String> {
        Ok(serde_json::to_string_pretty(document)?)
    }

    /// Whether loading would replace a non-empty schedule.
    pub fn would_overwrite(&self, schedule: &Schedule) -> bool {
        !schedule.is_empty()
    }

    /// Clears `schedule` and replays every saved entry through [`Schedule::add`]
    /// in list order; entries that fail are counted, not fatal.
    pub fn load(&self, document: &ScheduleDocument, schedule: &mut Schedule) -> LoadReport {
        let removed = schedule.clear();
        if removed > 0 {
            tracing::info!("Cleared {} class(es) before loading", removed);
        }

        if document.semester != self.semester && !document.semester.is_empty() {
            tracing::warn!(
                "Loading a schedule saved for {:?} into {:?}",
                document.semester,
                self.semester
            );
        }

        let mut report = LoadReport::with_rejected(&document.rejected);
        for saved in &document.classes {
            match schedule.add(saved.to_record()) {
                Ok(_) => report.record_success(),
                Err(e) => {
                    tracing::warn!("Skipping {} due to {}", saved.display_id(), e);
                    report.record_failure(saved.display_id(), e.to_string());
                }
            }
        }

        tracing::info!(
            "Loaded {} class(es), skipped {}",
            report.success_count,
            report.fail_count
        );
        report
    }

    /// "schedule_2026-10-17.json"
    pub fn default_filename(date: NaiveDate) -> String {
        format!("schedule_{}.json", date.format("%Y-%m-%d"))
    }

    pub async fn write<S: Storage>(
        &self,
        storage: &S,
        path: &str,
        document: &ScheduleDocument,
    ) -> Result<()> {
        validate_file_extension("schedule_file", path, &["json"])?;
        let json = self.to_json(document)?;
        storage.write_file(path, json.as_bytes()).await?;
        tracing::debug!("Schedule written to {} ({} bytes)", path, json.len());
        Ok(())
    }

    pub async fn read<S: Storage>(&self, storage: &S, path: &str) -> Result<ScheduleDocument> {
        validate_file_extension("schedule_file", path, &["json"])?;
        let bytes = storage.read_file(path).await?;
        let json = String::from_utf8(bytes).map_err(|e| SchedError::InvalidFormat {
            message: format!("file is not UTF-8: {}", e),
        })?;
        self.parse(&json)
    }
}

/// Id for a report line: the saved id, `code-section`, or the position.
fn entry_label(entry: &Value, index: usize) -> String {
    let field = |name: &str| entry.get(name).and_then(Value::as_str).filter(|s| !s.is_empty());

    match (field("id"), field("subjectCode"), field("section")) {
        (Some(id), _, _) => id.to_string(),
        (None, Some(code), Some(section)) => format!("{}-{}", code, section),
        _ => format!("entry {}", index + 1),
    }
}

impl Default for ScheduleCodec {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION, crate::config::toml_config::DEFAULT_SEMESTER)
    }
}
