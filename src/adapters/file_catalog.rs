use crate::domain::model::SectionRecord;
use crate::domain::ports::SectionCatalog;
use crate::utils::error::{Result, SchedError};
use crate::utils::validation::validate_file_extension;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Section catalog backed by a local export of the course offerings.
///
/// Selections are only remembered for the lifetime of the value.
#[derive(Debug, Default)]
pub struct FileCatalog {
    sections: Vec<SectionRecord>,
    selected: Mutex<Vec<SectionRecord>>,
}

impl FileCatalog {
    pub fn new(sections: Vec<SectionRecord>) -> Self {
        let sections = sections
            .into_iter()
            .map(|mut record| {
                // 課程代碼統一大寫
                record.subject_code = normalize_code(&record.subject_code);
                record.section = record.section.trim().to_string();
                record
            })
            .collect();

        Self {
            sections,
            selected: Mutex::new(Vec::new()),
        }
    }

    /// Reads a `.json` array or a `.csv` file with the catalog column headers.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.to_string_lossy();
        validate_file_extension("catalog.path", &shown, &["json", "csv"])?;

        let file = std::fs::File::open(path)?;
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let catalog = if is_csv {
            Self::from_csv_reader(file)?
        } else {
            Self::from_json_reader(file)?
        };

        tracing::info!(
            "Loaded {} section(s) from {}",
            catalog.sections.len(),
            shown
        );
        Ok(catalog)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let sections: Vec<SectionRecord> = serde_json::from_reader(reader)?;
        Ok(Self::new(sections))
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut sections = Vec::new();

        // 以字串讀取，避免 "01" 之類的節次被當成數字
        for row in csv_reader.deserialize::<HashMap<String, String>>() {
            let row = row?;
            let field = |name: &str| row.get(name).cloned().unwrap_or_default();
            sections.push(SectionRecord {
                subject_code: field("Subject Code"),
                section: field("Section"),
                course_title: field("Course Title"),
                units: field("Units"),
                time: field("Time"),
                room: field("Room"),
                instructor: field("Instructor"),
            });
        }

        Ok(Self::new(sections))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Ids of the currently reserved sections, in commit order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.selected_guard().iter().map(SectionRecord::id).collect()
    }

    fn selected_guard(&self) -> MutexGuard<'_, Vec<SectionRecord>> {
        self.selected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[async_trait]
impl SectionCatalog for FileCatalog {
    async fn all_courses(&self) -> Result<Vec<String>> {
        let mut courses: Vec<String> = Vec::new();
        for record in &self.sections {
            if !courses.contains(&record.subject_code) {
                courses.push(record.subject_code.clone());
            }
        }
        Ok(courses)
    }

    async fn fetch_sections(&self, subject_code: &str) -> Result<Vec<SectionRecord>> {
        let code = normalize_code(subject_code);
        tracing::debug!("Looking up sections for {:?}", code);

        Ok(self
            .sections
            .iter()
            .filter(|record| record.subject_code == code)
            .cloned()
            .collect())
    }

    async fn commit_selection(&self, subject_code: &str, section: &str) -> Result<SectionRecord> {
        let code = normalize_code(subject_code);
        let section = section.trim();

        let record = self
            .sections
            .iter()
            .find(|record| record.subject_code == code && record.section == section)
            .cloned()
            .ok_or_else(|| SchedError::SectionNotFound {
                subject_code: code.clone(),
                section: section.to_string(),
            })?;

        self.selected_guard().push(record.clone());
        Ok(record)
    }

    async fn release_selection(&self, id: &str) -> Result<()> {
        // id 格式為 "SUBJECTCODE-SECTION"，以最後一個 '-' 分割
        if let Some((code, section)) = id.rsplit_once('-') {
            self.selected_guard()
                .retain(|record| !(record.subject_code == code && record.section == section));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_JSON: &str = r#"[
        {"Subject Code": "engl 11", "Section": "A", "Course Title": "Purposive Communication", "Units": 3,
         "Time": "M-TH 1230-1400\n(FULLY ONSITE)", "Room": "SEC-A203", "Instructor": "SANTOS, MARIA"},
        {"Subject Code": "ENGL 11", "Section": "B", "Course Title": "Purposive Communication", "Units": 3,
         "Time": "T-F 0800-0930", "Room": "SEC-A204", "Instructor": null},
        {"Subject Code": "MATH 20", "Section": "B", "Course Title": "Calculus", "Units": 4.0,
         "Time": "T-F 1300-1400", "Room": "CTC 102", "Instructor": "REYES, JOSE"}
    ]"#;

    #[tokio::test]
    async fn test_json_catalog_lookup_is_case_insensitive() {
        let catalog = FileCatalog::from_json_reader(CATALOG_JSON.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);

        let sections = catalog.fetch_sections(" engl 11 ").await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].subject_code, "ENGL 11");

        let courses = catalog.all_courses().await.unwrap();
        assert_eq!(courses, vec!["ENGL 11", "MATH 20"]);
    }

    #[tokio::test]
    async fn test_commit_and_release() {
        let catalog = FileCatalog::from_json_reader(CATALOG_JSON.as_bytes()).unwrap();

        let record = catalog.commit_selection("math 20", "B").await.unwrap();
        assert_eq!(record.units, "4");
        assert_eq!(catalog.selected_ids(), vec!["MATH 20-B"]);

        catalog.release_selection("MATH 20-B").await.unwrap();
        assert!(catalog.selected_ids().is_empty());

        assert!(matches!(
            catalog.commit_selection("MATH 20", "Z").await,
            Err(SchedError::SectionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_csv_catalog_keeps_section_labels() {
        let csv_data = "Subject Code,Section,Course Title,Units,Time,Room,Instructor\n\
                        PHYS 71,01,Physics,4,M-W 0700-0830,F-204,\n\
                        PHYS 71,02,Physics,4,T-TH 0700-0830,F-205,CRUZ\n";
        let catalog = FileCatalog::from_csv_reader(csv_data.as_bytes()).unwrap();

        let sections = catalog.fetch_sections("PHYS 71").await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section, "01");
        assert_eq!(sections[0].id(), "PHYS 71-01");
        assert_eq!(sections[0].instructor, "");
    }

    #[test]
    fn test_from_path_reads_json_and_rejects_other_extensions() {
        use std::io::Write;

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json_file.write_all(CATALOG_JSON.as_bytes()).unwrap();
        let catalog = FileCatalog::from_path(json_file.path()).unwrap();
        assert_eq!(catalog.len(), 3);

        let txt_file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(FileCatalog::from_path(txt_file.path()).is_err());
    }
}
