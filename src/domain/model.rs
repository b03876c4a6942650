use chrono::{DateTime, Utc};
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Length of one grid block in minutes.
pub const BLOCK_MINUTES: u32 = 30;

/// Minutes in a day; the latest valid end time.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Days that have a column on the weekly grid, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    /// 對照課表上的星期縮寫 (M, T, W, TH, F, SAT)
    pub fn from_abbreviation(token: &str) -> Option<Self> {
        match token {
            "M" => Some(Weekday::Monday),
            "T" => Some(Weekday::Tuesday),
            "W" => Some(Weekday::Wednesday),
            "TH" => Some(Weekday::Thursday),
            "F" => Some(Weekday::Friday),
            "SAT" => Some(Weekday::Saturday),
            _ => None,
        }
    }

    pub fn column(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Weekly meeting pattern of a section, in minutes since midnight.
///
/// The parser does not enforce `start < end` or a non-empty day set; see
/// [`TimeInterval::is_placeable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeInterval {
    pub days: BTreeSet<Weekday>,
    pub start_minutes: u32,
    pub end_minutes: u32,
}

impl TimeInterval {
    pub fn duration_minutes(&self) -> u32 {
        self.end_minutes.saturating_sub(self.start_minutes)
    }

    /// 需要佔用的 30 分鐘區塊數 (無條件進位)
    pub fn blocks_needed(&self) -> usize {
        self.duration_minutes().div_ceil(BLOCK_MINUTES) as usize
    }

    pub fn is_placeable(&self) -> bool {
        !self.days.is_empty() && self.start_minutes < self.end_minutes
    }

    /// "12:30-14:00"
    pub fn time_label(&self) -> String {
        format!(
            "{}-{}",
            format_clock(self.start_minutes),
            format_clock(self.end_minutes)
        )
    }
}

/// Formats minutes since midnight as `HH:MM`.
pub fn format_clock(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Formats minutes since midnight as the compact `HHMM` form used in time strings.
pub fn format_compact_clock(minutes: u32) -> String {
    format!("{:02}{:02}", minutes / 60, minutes % 60)
}

/// One offered section as supplied by the catalog. Only `time` is parsed;
/// everything else is display data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    #[serde(rename = "Subject Code", default, deserialize_with = "loose_string")]
    pub subject_code: String,
    #[serde(rename = "Section", default, deserialize_with = "loose_string")]
    pub section: String,
    #[serde(rename = "Course Title", default, deserialize_with = "loose_string")]
    pub course_title: String,
    #[serde(rename = "Units", default, deserialize_with = "loose_string")]
    pub units: String,
    #[serde(rename = "Time", default, deserialize_with = "loose_string")]
    pub time: String,
    #[serde(rename = "Room", default, deserialize_with = "loose_string")]
    pub room: String,
    #[serde(rename = "Instructor", default, deserialize_with = "loose_string")]
    pub instructor: String,
}

impl SectionRecord {
    /// Schedule-wide identifier: `"<subject code>-<section>"`.
    pub fn id(&self) -> String {
        format!("{}-{}", self.subject_code, self.section)
    }

    /// "ENGL 11 A"
    pub fn label(&self) -> String {
        format!("{} {}", self.subject_code, self.section)
    }
}

/// A section that has been placed on the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedClass {
    pub id: String,
    pub record: SectionRecord,
    pub interval: TimeInterval,
}

impl PlacedClass {
    pub fn new(record: SectionRecord, interval: TimeInterval) -> Self {
        Self {
            id: record.id(),
            record,
            interval,
        }
    }

    pub fn label(&self) -> String {
        self.record.label()
    }
}

/// The first placed section found overlapping a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub conflicting_id: String,
    pub conflicting_label: String,
    pub day: Weekday,
    /// Label of the grid row where the overlap was found, e.g. `"13:00-13:30"`.
    pub time_range: String,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conflicts with {} on {} {}",
            self.conflicting_label, self.day, self.time_range
        )
    }
}

/// 課表變動通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleChange {
    Added { id: String },
    Removed { id: String },
}

/// Persisted schedule file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDocument {
    #[serde(default, deserialize_with = "loose_string")]
    pub version: String,
    #[serde(default, deserialize_with = "lenient")]
    pub saved_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "loose_string")]
    pub semester: String,
    pub classes: Vec<SavedClass>,
    /// `classes` elements that could not be read; counted as load failures.
    #[serde(skip)]
    pub rejected: Vec<LoadFailure>,
}

/// A placed section flattened to plain fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedClass {
    #[serde(default, deserialize_with = "loose_string")]
    pub id: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub subject_code: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub section: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub course_title: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub units: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub time: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub room: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub instructor: String,
    /// Informational only; the raw `time` is re-parsed on load.
    #[serde(default, deserialize_with = "lenient")]
    pub time_info: Option<SavedTimeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTimeInfo {
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

impl SavedClass {
    pub fn from_placed(placed: &PlacedClass) -> Self {
        let record = &placed.record;
        Self {
            id: placed.id.clone(),
            subject_code: record.subject_code.clone(),
            section: record.section.clone(),
            course_title: record.course_title.clone(),
            units: record.units.clone(),
            time: record.time.clone(),
            room: record.room.clone(),
            instructor: record.instructor.clone(),
            time_info: Some(SavedTimeInfo {
                days: placed
                    .interval
                    .days
                    .iter()
                    .map(|day| day.name().to_string())
                    .collect(),
                start_time: format_compact_clock(placed.interval.start_minutes),
                end_time: format_compact_clock(placed.interval.end_minutes),
            }),
        }
    }

    /// 重建課程資料 (不信任已存的 timeInfo)
    pub fn to_record(&self) -> SectionRecord {
        SectionRecord {
            subject_code: self.subject_code.clone(),
            section: self.section.clone(),
            course_title: self.course_title.clone(),
            units: self.units.clone(),
            time: self.time.clone(),
            room: self.room.clone(),
            instructor: self.instructor.clone(),
        }
    }

    /// Identifier for logs and reports; falls back to the derived id.
    pub fn display_id(&self) -> String {
        if self.id.is_empty() {
            format!("{}-{}", self.subject_code, self.section)
        } else {
            self.id.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of restoring a schedule document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub success_count: usize,
    pub fail_count: usize,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// Starts a report with the entries the document could not read.
    pub fn with_rejected(rejected: &[LoadFailure]) -> Self {
        let mut report = Self::default();
        for failure in rejected {
            report.record_failure(failure.id.clone(), failure.reason.clone());
        }
        report
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, id: impl Into<String>, reason: impl Into<String>) {
        self.fail_count += 1;
        self.failures.push(LoadFailure {
            id: id.into(),
            reason: reason.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }

    pub fn summary(&self) -> String {
        let mut message = format!(
            "Schedule loaded successfully!\n\n{} class(es) added.",
            self.success_count
        );
        if self.fail_count > 0 {
            message.push_str(&format!(
                "\n{} class(es) skipped due to conflicts.",
                self.fail_count
            ));
        }
        message
    }
}

/// 無法解析的值視為缺漏
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// 接受字串、數字或 null，統一轉成字串 (目錄匯出時欄位型別不固定)
fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct LooseStringVisitor;

    impl<'de> Visitor<'de> for LooseStringVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            if v.fract() == 0.0 && v.is_finite() {
                Ok(format!("{}", v as i64))
            } else {
                Ok(v.to_string())
            }
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<String, D2::Error> {
            d.deserialize_any(LooseStringVisitor)
        }
    }

    deserializer.deserialize_any(LooseStringVisitor)
}
