//! GitHub contents API client
//!
//! Reads and writes single files of a repository branch. The blob `sha`
//! returned by a read is the version token; presenting a stale one on write
//! makes GitHub answer 409 (or 422), which surfaces as
//! [`StoreError::Conflict`].

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ContentStore, StoreError, VersionToken, Versioned};

const USER_AGENT: &str = concat!("wordup-ingest/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Repository branch addressed by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    /// API root, normally `https://api.github.com`
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

/// GET /repos/{owner}/{repo}/contents/{path} response (file variant)
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    download_url: Option<String>,
}

/// PUT /repos/{owner}/{repo}/contents/{path} request
#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

/// Contents API client for one repository branch
pub struct GithubContentsClient {
    http_client: reqwest::Client,
    repo: GithubRepo,
    token: Option<String>,
}

impl GithubContentsClient {
    pub fn new(repo: GithubRepo, token: Option<String>) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        // Fail early on an unusable base URL
        contents_url(&repo, "")?;

        Ok(Self {
            http_client,
            repo,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn repo(&self) -> &GithubRepo {
        &self.repo
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // Files over 1 MB come back without inline content
    async fn download(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(status.as_u16(), error_text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ContentStore for GithubContentsClient {
    async fn read(&self, path: &str) -> Result<Versioned, StoreError> {
        let mut url = contents_url(&self.repo, path)?;
        url.query_pairs_mut().append_pair("ref", &self.repo.branch);

        tracing::debug!(path = %path, url = %url, "Reading repository file");

        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(status.as_u16(), error_text));
        }

        let file: ContentsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("{} is not a file: {}", path, e)))?;

        let content = if file.encoding == "base64" && (!file.content.is_empty() || file.size == 0) {
            decode_content(&file.content)?
        } else if let Some(download_url) = file.download_url.as_deref() {
            self.download(download_url).await?
        } else {
            return Err(StoreError::Decode(format!(
                "{} has unsupported encoding '{}'",
                path, file.encoding
            )));
        };

        tracing::debug!(path = %path, sha = %file.sha, bytes = content.len(), "Read repository file");

        Ok(Versioned {
            content,
            version: VersionToken::new(file.sha),
        })
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        version: Option<&VersionToken>,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        let url = contents_url(&self.repo, path)?;
        let body = PutRequest {
            message,
            content: STANDARD.encode(content),
            branch: &self.repo.branch,
            sha: version.map(VersionToken::as_str),
        };

        tracing::debug!(
            path = %path,
            bytes = content.len(),
            create = version.is_none(),
            "Writing repository file"
        );

        let response = self
            .authorized(self.http_client.put(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Conflict(format!("{}: {}", path, error_text)));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(status.as_u16(), error_text));
        }

        let written: PutResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        tracing::info!(path = %path, sha = %written.content.sha, "Committed repository file");

        Ok(VersionToken::new(written.content.sha))
    }
}

/// `{api_base}/repos/{owner}/{repo}/contents/{path}` with each segment escaped
fn contents_url(repo: &GithubRepo, path: &str) -> Result<Url, StoreError> {
    let mut url = Url::parse(&repo.api_base)
        .map_err(|e| StoreError::Network(format!("invalid API base '{}': {}", repo.api_base, e)))?;

    url.path_segments_mut()
        .map_err(|_| StoreError::Network(format!("invalid API base '{}'", repo.api_base)))?
        .pop_if_empty()
        .extend(["repos", repo.owner.as_str(), repo.repo.as_str(), "contents"])
        .extend(path.split('/').filter(|s| !s.is_empty()));

    Ok(url)
}

/// Decode contents API base64, which arrives wrapped at 60 columns
fn decode_content(encoded: &str) -> Result<Vec<u8>, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Decode(format!("invalid base64 content: {}", e)))
}
