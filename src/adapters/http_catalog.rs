use crate::domain::model::SectionRecord;
use crate::domain::ports::SectionCatalog;
use crate::utils::error::{Result, SchedError};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Catalog served by the course-offerings backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SectionsResponse {
    #[serde(default)]
    sections: Vec<SectionRecord>,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    #[serde(default)]
    success: bool,
    section: Option<SectionRecord>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    /// 非 2xx 回應轉成錯誤，盡量帶出後端的 error 訊息
    async fn check_status(route: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| status.to_string());

        Err(SchedError::Catalog {
            message: format!("{} returned {}: {}", route, status.as_u16(), detail),
        })
    }
}

#[async_trait]
impl SectionCatalog for HttpCatalog {
    async fn all_courses(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.url("all_courses")).send().await?;
        let response = Self::check_status("all_courses", response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_sections(&self, subject_code: &str) -> Result<Vec<SectionRecord>> {
        tracing::debug!("Fetching sections for {:?} from {}", subject_code, self.base_url);

        let response = self
            .client
            .post(self.url("get_schedules"))
            .json(&json!({ "code": subject_code }))
            .send()
            .await?;
        let response = Self::check_status("get_schedules", response).await?;

        let body: SectionsResponse = response.json().await?;
        Ok(body.sections)
    }

    async fn commit_selection(&self, subject_code: &str, section: &str) -> Result<SectionRecord> {
        let response = self
            .client
            .post(self.url("select_section"))
            .json(&json!({ "new_code": subject_code, "new_section": section }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SchedError::SectionNotFound {
                subject_code: subject_code.to_string(),
                section: section.to_string(),
            });
        }
        let response = Self::check_status("select_section", response).await?;

        let body: SelectResponse = response.json().await?;
        match (body.success, body.section) {
            (true, Some(record)) => Ok(record),
            _ => Err(SchedError::Catalog {
                message: body
                    .error
                    .unwrap_or_else(|| "selection was not confirmed".to_string()),
            }),
        }
    }

    async fn release_selection(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("remove_section"))
            .json(&json!({ "class_id": id }))
            .send()
            .await?;
        Self::check_status("remove_section", response).await?;
        Ok(())
    }
}
