// Adapters layer: concrete implementations for external systems (catalog backends, storage).

pub mod file_catalog;
pub mod http_catalog;
pub mod storage;

pub use file_catalog::FileCatalog;
pub use http_catalog::HttpCatalog;
pub use storage::LocalStorage;

use crate::config::toml_config::{CatalogSource, SchedConfig};
use crate::domain::ports::SectionCatalog;
use crate::utils::error::Result;
use std::time::Duration;

/// 依設定建立對應的課程目錄
pub fn catalog_from_config(config: &SchedConfig) -> Result<Box<dyn SectionCatalog>> {
    match config.catalog_source()? {
        CatalogSource::File { path } => Ok(Box::new(FileCatalog::from_path(path)?)),
        CatalogSource::Http {
            endpoint,
            timeout_seconds,
        } => {
            tracing::debug!("Using catalog backend at {}", endpoint);
            Ok(Box::new(HttpCatalog::new(
                endpoint,
                Duration::from_secs(timeout_seconds),
            )?))
        }
    }
}
