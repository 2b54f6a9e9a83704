//! REST-backed template store.
//!
//! Endpoints, relative to `{base_url}/v1/projects/{project_id}`:
//! - `GET  /remoteConfig` (etag in the `ETag` response header)
//! - `PUT  /remoteConfig[?validateOnly=true]` with `If-Match: <etag>`
//! - `GET  /remoteConfig:listVersions?pageSize=<n>`

use super::TemplateStore;
use crate::error::{SyncError, SyncPhase, SyncResult};
use crate::types::{Template, Version};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, ETAG, HeaderMap, HeaderValue, IF_MATCH};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Template store speaking the remote-config REST API.
pub struct HttpTemplateStore {
    /// Endpoint root with no trailing slash.
    base_url: String,
    project_id: String,
    access_token: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListVersionsResponse {
    #[serde(default)]
    versions: Vec<Version>,
}

impl HttpTemplateStore {
    pub fn new(
        mut base_url: String,
        project_id: String,
        access_token: String,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> SyncResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {}", e)))?;
        let trimmed_len = base_url.trim_end_matches('/').len();
        base_url.truncate(trimmed_len);
        Ok(Self {
            base_url,
            project_id,
            access_token,
            client,
        })
    }

    fn template_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/remoteConfig",
            self.base_url, self.project_id
        )
    }

    fn headers(&self, phase: SyncPhase, etag: Option<&str>) -> SyncResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.access_token))
            .map_err(|_| SyncError::store(phase, "access token is not a valid header value"))?;
        headers.insert(AUTHORIZATION, bearer);
        if let Some(etag) = etag {
            let value = HeaderValue::from_str(etag)
                .map_err(|_| SyncError::store(phase, "etag is not a valid header value"))?;
            headers.insert(IF_MATCH, value);
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; UTF-8"),
            );
        }
        Ok(headers)
    }

    async fn put_template(
        &self,
        phase: SyncPhase,
        template: &Template,
        validate_only: bool,
    ) -> SyncResult<Template> {
        let etag = if template.etag.is_empty() {
            "*"
        } else {
            template.etag.as_str()
        };
        let mut request = self
            .client
            .put(self.template_url())
            .headers(self.headers(phase, Some(etag))?)
            .json(&template.request_body());
        if validate_only {
            request = request.query(&[("validateOnly", "true")]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SyncError::store(phase, e.to_string()))?;
        let mut returned = read_template(phase, response).await?;
        if returned.etag.is_empty() {
            returned.etag = template.etag.clone();
        }
        Ok(returned)
    }
}

#[async_trait]
impl TemplateStore for HttpTemplateStore {
    async fn fetch_template(&self) -> SyncResult<Template> {
        let phase = SyncPhase::Fetch;
        let response = self
            .client
            .get(self.template_url())
            .headers(self.headers(phase, None)?)
            .send()
            .await
            .map_err(|e| SyncError::store(phase, e.to_string()))?;
        read_template(phase, response).await
    }

    async fn validate_template(&self, template: &Template) -> SyncResult<Template> {
        let mut validated = self.put_template(SyncPhase::Validate, template, true).await?;
        // validateOnly answers with `<etag>-0`; publish must send the fetched etag
        validated.etag = template.etag.clone();
        Ok(validated)
    }

    async fn publish_template(&self, template: &Template) -> SyncResult<Template> {
        self.put_template(SyncPhase::Publish, template, false).await
    }

    async fn list_versions(&self, page_size: u32) -> SyncResult<Vec<Version>> {
        let phase = SyncPhase::ListVersions;
        let url = format!("{}:listVersions", self.template_url());
        let response = self
            .client
            .get(url)
            .headers(self.headers(phase, None)?)
            .query(&[("pageSize", page_size.to_string())])
            .send()
            .await
            .map_err(|e| SyncError::store(phase, e.to_string()))?;
        let response = check_status(phase, response).await?;
        let body: ListVersionsResponse = response
            .json()
            .await
            .map_err(|e| SyncError::store(phase, e.to_string()))?;
        Ok(body.versions)
    }
}

/// Decode a template body; the etag comes from the response header.
async fn read_template(phase: SyncPhase, response: Response) -> SyncResult<Template> {
    let response = check_status(phase, response).await?;
    let etag = response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mut template: Template = response
        .json()
        .await
        .map_err(|e| SyncError::store(phase, format!("unexpected response body: {}", e)))?;
    if let Some(etag) = etag {
        template.etag = etag;
    }
    debug!(phase = %phase, etag = %template.etag, "Template received");
    Ok(template)
}

async fn check_status(phase: SyncPhase, response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(phase, status.as_u16(), &body))
}

/// Map a backend error body to a store error, keeping its status code and message.
fn error_from_body(phase: SyncPhase, http_status: u16, body: &str) -> SyncError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope
                .error
                .status
                .unwrap_or_else(|| http_status.to_string());
            SyncError::store_with_code(phase, code, envelope.error.message)
        }
        Err(_) => SyncError::store_with_code(
            phase,
            http_status.to_string(),
            format!("HTTP {}: {}", http_status, body.trim()),
        ),
    }
}
