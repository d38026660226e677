use crate::adapters::http::{join_url, json_body};
use crate::config::{FunderApiConfig, SwecrisConfig};
use crate::domain::model::ProjectMetadata;
use crate::domain::ports::GrantRegistry;
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const SWECRIS: &str = "SweCRIS";
const FUNDER_API: &str = "Funder API";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwecrisProject {
    #[serde(default)]
    project_title_en: Option<String>,
    #[serde(default)]
    project_title_sv: Option<String>,
    #[serde(default)]
    project_abstract_en: Option<String>,
    #[serde(default)]
    project_abstract_sv: Option<String>,
    #[serde(default)]
    project_start_date: Option<String>,
    #[serde(default)]
    project_end_date: Option<String>,
}

impl From<SwecrisProject> for ProjectMetadata {
    fn from(project: SwecrisProject) -> Self {
        ProjectMetadata::new(
            project.project_title_en.unwrap_or_default(),
            project.project_title_sv.unwrap_or_default(),
            project.project_abstract_en.unwrap_or_default(),
            project.project_abstract_sv.unwrap_or_default(),
            project.project_start_date.as_deref().unwrap_or_default(),
            project.project_end_date.as_deref().unwrap_or_default(),
        )
    }
}

/// Registry A: national grant database keyed by `{grantId}_{funderSuffix}`.
pub struct SwecrisRegistry {
    client: Client,
    url: String,
    api_key: String,
    suffix: String,
}

impl SwecrisRegistry {
    pub fn new(config: &SwecrisConfig, suffix: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            suffix: suffix.into(),
        }
    }

    pub fn project_url(&self, grant_id: &str) -> String {
        join_url(&self.url, &format!("{}_{}", grant_id, self.suffix))
    }
}

#[async_trait]
impl GrantRegistry for SwecrisRegistry {
    fn source_name(&self) -> &str {
        SWECRIS
    }

    async fn fetch(&self, grant_id: &str) -> Result<Option<ProjectMetadata>> {
        let url = self.project_url(grant_id);
        tracing::debug!("📡 Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        // 查無資料時 SweCRIS 回傳 500 / "Internal server error"；其餘錯誤狀態照常回報
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::INTERNAL_SERVER_ERROR || body.contains("Internal server error") {
            tracing::debug!("{} answered {} for {}", SWECRIS, status, grant_id);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ImportError::RemoteError {
                service: SWECRIS.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let project: SwecrisProject =
            serde_json::from_str(&body).map_err(|e| ImportError::UnexpectedResponse {
                service: SWECRIS.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(project.into()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunderApiProject {
    #[serde(default)]
    title_en: Option<String>,
    #[serde(default)]
    title_sv: Option<String>,
    #[serde(default)]
    description_en: Option<String>,
    #[serde(default)]
    description_sv: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

impl From<FunderApiProject> for ProjectMetadata {
    fn from(project: FunderApiProject) -> Self {
        ProjectMetadata::new(
            project.title_en.unwrap_or_default(),
            project.title_sv.unwrap_or_default(),
            project.description_en.unwrap_or_default(),
            project.description_sv.unwrap_or_default(),
            project.start_date.as_deref().unwrap_or_default(),
            project.end_date.as_deref().unwrap_or_default(),
        )
    }
}

/// Registry B: a funder's own grant API keyed by the plain grant id.
pub struct FunderApiRegistry {
    client: Client,
    url: String,
    api_key: Option<String>,
    name: String,
}

impl FunderApiRegistry {
    pub fn new(config: &FunderApiConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            name: config.name.clone().unwrap_or_else(|| FUNDER_API.to_string()),
        }
    }
}

#[async_trait]
impl GrantRegistry for FunderApiRegistry {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, grant_id: &str) -> Result<Option<ProjectMetadata>> {
        let mut request = self
            .client
            .get(join_url(&self.url, grant_id))
            .header("Accept", "application/json");
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let project: Option<FunderApiProject> = json_body(&self.name, response).await?;
        Ok(project.map(ProjectMetadata::from))
    }
}
