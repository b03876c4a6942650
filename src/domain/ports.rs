use crate::domain::model::{PlacedClass, ScheduleChange, SectionRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Storage backend for schedule documents.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn semester(&self) -> &str;
    fn document_version(&self) -> &str;
    fn output_path(&self) -> &str;
    fn state_file(&self) -> &str;
}

/// Source of offered sections and the server-side reservation of selected ones.
#[async_trait]
pub trait SectionCatalog: Send + Sync {
    async fn all_courses(&self) -> Result<Vec<String>>;
    async fn fetch_sections(&self, subject_code: &str) -> Result<Vec<SectionRecord>>;
    /// Reserves a section and returns the authoritative record for it.
    async fn commit_selection(&self, subject_code: &str, section: &str) -> Result<SectionRecord>;
    async fn release_selection(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl<T: SectionCatalog + ?Sized> SectionCatalog for Box<T> {
    async fn all_courses(&self) -> Result<Vec<String>> {
        (**self).all_courses().await
    }

    async fn fetch_sections(&self, subject_code: &str) -> Result<Vec<SectionRecord>> {
        (**self).fetch_sections(subject_code).await
    }

    async fn commit_selection(&self, subject_code: &str, section: &str) -> Result<SectionRecord> {
        (**self).commit_selection(subject_code, section).await
    }

    async fn release_selection(&self, id: &str) -> Result<()> {
        (**self).release_selection(id).await
    }
}

/// Display-refresh hook, called after every successful add or remove.
pub trait ScheduleObserver: Send + Sync {
    fn on_change(&self, change: &ScheduleChange, classes: &[PlacedClass]);
}
