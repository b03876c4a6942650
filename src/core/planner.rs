use crate::core::codec::ScheduleCodec;
use crate::core::schedule::Schedule;
use crate::domain::model::{LoadReport, PlacedClass, ScheduleDocument, SectionRecord};
use crate::domain::ports::SectionCatalog;
use crate::utils::error::{Result, SchedError};
use crate::utils::validation::validate_non_empty_string;
use futures::future::join_all;

/// A catalog section together with whether it could be placed right now.
#[derive(Debug)]
pub struct SectionPreview {
    pub record: SectionRecord,
    pub problem: Option<SchedError>,
}

impl SectionPreview {
    pub fn is_available(&self) -> bool {
        self.problem.is_none()
    }
}

/// Drives the schedule together with the catalog collaborator.
pub struct SchedulePlanner<C: SectionCatalog> {
    catalog: C,
    schedule: Schedule,
    codec: ScheduleCodec,
}

impl<C: SectionCatalog> SchedulePlanner<C> {
    pub fn new(catalog: C, schedule: Schedule, codec: ScheduleCodec) -> Self {
        Self {
            catalog,
            schedule,
            codec,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn schedule_mut(&mut self) -> &mut Schedule {
        &mut self.schedule
    }

    pub fn codec(&self) -> &ScheduleCodec {
        &self.codec
    }

    pub async fn courses(&self) -> Result<Vec<String>> {
        self.catalog.all_courses().await
    }

    /// 列出課程的所有節次，並標示目前能否加入
    pub async fn sections(&self, subject_code: &str) -> Result<Vec<SectionPreview>> {
        validate_non_empty_string("subject_code", subject_code)?;
        let sections = self.catalog.fetch_sections(subject_code.trim()).await?;

        Ok(sections
            .into_iter()
            .map(|record| {
                let problem = self.schedule.check(&record).err();
                SectionPreview { record, problem }
            })
            .collect())
    }

    /// Checks locally first, then reserves with the catalog, then places.
    pub async fn select(&mut self, subject_code: &str, section: &str) -> Result<PlacedClass> {
        validate_non_empty_string("subject_code", subject_code)?;
        let subject_code = subject_code.trim();
        let section = section.trim();

        let record = self
            .catalog
            .fetch_sections(subject_code)
            .await?
            .into_iter()
            .find(|record| record.section.trim() == section)
            .ok_or_else(|| SchedError::SectionNotFound {
                subject_code: subject_code.to_string(),
                section: section.to_string(),
            })?;

        // 先檢查衝突，避免在後端留下無效的選課
        self.schedule.check(&record)?;

        let confirmed = self
            .catalog
            .commit_selection(&record.subject_code, &record.section)
            .await?;
        self.place_committed(confirmed).await
    }

    async fn place_committed(&mut self, record: SectionRecord) -> Result<PlacedClass> {
        let id = record.id();
        match self.schedule.add(record) {
            Ok(placed) => {
                tracing::info!("Added {} ({})", placed.label(), placed.interval.time_label());
                Ok(placed)
            }
            Err(e) => {
                if let Err(release_err) = self.catalog.release_selection(&id).await {
                    tracing::warn!("Could not release {}: {}", id, release_err);
                }
                Err(e)
            }
        }
    }

    /// Removes locally, then notifies the catalog. `false` if `id` was not placed.
    pub async fn drop_section(&mut self, id: &str) -> bool {
        if !self.schedule.remove(id) {
            return false;
        }

        if let Err(e) = self.catalog.release_selection(id).await {
            tracing::warn!("Removed {} locally but the catalog release failed: {}", id, e);
        }
        tracing::info!("Removed {}", id);
        true
    }

    pub async fn clear(&mut self) -> usize {
        let ids: Vec<String> = self.schedule.list().iter().map(|c| c.id.clone()).collect();

        let mut removed = 0;
        for id in ids {
            if self.drop_section(&id).await {
                removed += 1;
            }
        }
        removed
    }

    pub fn save(&self) -> ScheduleDocument {
        self.codec.save(&self.schedule)
    }

    pub fn would_overwrite(&self) -> bool {
        self.codec.would_overwrite(&self.schedule)
    }

    /// Replaces the schedule with a saved document, reserving every entry with
    /// the catalog.
    ///
    /// Entries are screened in saved order against the entries before them,
    /// the reservations for the survivors run concurrently, and the confirmed
    /// records are placed in saved order.
    pub async fn restore(&mut self, document: &ScheduleDocument) -> LoadReport {
        let removed = self.clear().await;
        if removed > 0 {
            tracing::info!("Cleared {} class(es) before restoring", removed);
        }

        let mut report = LoadReport::with_rejected(&document.rejected);
        let mut scratch = Schedule::new(self.schedule.layout().clone());
        let mut accepted = Vec::new();

        for saved in &document.classes {
            match scratch.add(saved.to_record()) {
                Ok(_) => accepted.push(saved),
                Err(e) => {
                    tracing::warn!("Skipping {} due to {}", saved.display_id(), e);
                    report.record_failure(saved.display_id(), e.to_string());
                }
            }
        }

        let commits = accepted
            .iter()
            .map(|saved| self.catalog.commit_selection(&saved.subject_code, &saved.section));
        let results = join_all(commits).await;

        for (saved, result) in accepted.into_iter().zip(results) {
            let placed = match result {
                Ok(record) => self.place_committed(record).await,
                Err(e) => Err(e),
            };
            match placed {
                Ok(_) => report.record_success(),
                Err(e) => {
                    tracing::warn!("Could not restore {}: {}", saved.display_id(), e);
                    report.record_failure(saved.display_id(), e.to_string());
                }
            }
        }

        tracing::info!(
            "Restored {} class(es), skipped {}",
            report.success_count,
            report.fail_count
        );
        report
    }
}
