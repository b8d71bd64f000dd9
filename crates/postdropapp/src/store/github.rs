//! GitHub contents API backend.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `get_entry` | `GET /repos/{owner}/{repo}/contents/{path}?ref={ref}` |
//! | `create_entry` | `PUT /repos/{owner}/{repo}/contents/{path}` without `sha` |
//! | `update_entry` | `PUT /repos/{owner}/{repo}/contents/{path}` with `sha` |
//! | `get_branch` | `GET /repos/{owner}/{repo}/branches/{name}` |
//! | `repository` | `GET /repos/{owner}/{repo}` |
//! | `list_dir` | `GET /repos/{owner}/{repo}/contents/{dir}?ref={ref}` |
//!
//! File content travels base64-encoded. The blob `sha` is the version token.

use super::{
    BranchInfo, RemoteEntry, RemoteStore, RepositoryInfo, StoreError, StoreErrorKind,
    StoreResult, WriteReceipt,
};
use crate::config::PublishSettings;
use crate::error::{PostdropError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const API_VERSION: &str = "2022-11-28";
const TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_CHARS: usize = 200;

pub struct GitHubStore {
    http: Client,
    api_base: Url,
    owner: String,
    repo: String,
    token: String,
}

#[derive(Deserialize)]
struct ContentFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct ContentRef {
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct PutResponse {
    #[serde(default)]
    content: Option<ContentRef>,
}

#[derive(Deserialize)]
struct BranchCommit {
    sha: String,
}

#[derive(Deserialize)]
struct Branch {
    name: String,
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct Repository {
    full_name: String,
    default_branch: String,
}

#[derive(Deserialize)]
struct DirItem {
    name: String,
}

impl GitHubStore {
    pub fn new(api_base: &str, owner: &str, repo: &str, token: &str) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| PostdropError::Config(format!("invalid api_base {}: {}", api_base, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(concat!("postdrop/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| PostdropError::Api(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base,
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    pub fn from_settings(settings: &PublishSettings) -> Result<Self> {
        Self::new(
            &settings.api_base,
            &settings.owner,
            &settings.repo,
            &settings.token,
        )
    }

    /// `{api_base}/repos/{owner}/{repo}/{segments...}` with each segment escaped.
    fn repo_url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> StoreResult<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StoreError::new(
                    StoreErrorKind::Unprocessable,
                    format!("{} cannot be a base URL", self.api_base),
                )
            })?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, path: &str, git_ref: Option<&str>) -> StoreResult<Url> {
        let segments = std::iter::once("contents").chain(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.repo_url(segments)?;
        if let Some(git_ref) = git_ref {
            url.query_pairs_mut().append_pair("ref", git_ref);
        }
        Ok(url)
    }

    fn blob_url(&self, branch: &str, path: &str) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            self.owner, self.repo, branch, path
        )
    }

    fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| StoreError::new(StoreErrorKind::Transport, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let rate_limited = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "0")
            .unwrap_or(false);
        let body = response.text().unwrap_or_default();
        Err(StoreError::new(
            StoreErrorKind::from_status(status.as_u16(), rate_limited),
            error_message(&body),
        ))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> StoreResult<T> {
        tracing::debug!(%url, "GET");
        let response = self.send(self.http.get(url))?;
        decode(response)
    }

    fn put_contents(
        &self,
        path: &str,
        message: &str,
        content: &str,
        version: Option<&str>,
        branch: &str,
    ) -> StoreResult<WriteReceipt> {
        let url = self.contents_url(path, None)?;
        let mut payload = json!({
            "message": message,
            "content": STANDARD.encode(content.as_bytes()),
            "branch": branch,
        });
        if let Some(version) = version {
            payload["sha"] = json!(version);
        }

        tracing::debug!(%url, update = version.is_some(), "PUT");
        let response = self.send(self.http.put(url).json(&payload))?;
        let body: PutResponse = decode(response)?;
        let content = body.content.unwrap_or(ContentRef {
            sha: None,
            html_url: None,
        });

        Ok(WriteReceipt {
            reference: content
                .html_url
                .unwrap_or_else(|| self.blob_url(branch, path)),
            version: content.sha.unwrap_or_default(),
        })
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    response.json().map_err(|e| {
        StoreError::new(
            StoreErrorKind::Transport,
            format!("unexpected response body: {}", e),
        )
    })
}

/// GitHub errors are `{"message": "..."}`; fall back to a truncated body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_CHARS).collect())
}

fn decode_content(file: &ContentFile) -> StoreResult<String> {
    let Some(raw) = file.content.as_deref() else {
        return Ok(String::new());
    };
    if file.encoding.as_deref().unwrap_or("base64") != "base64" {
        return Ok(raw.to_string());
    }

    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|e| {
        StoreError::new(StoreErrorKind::Transport, format!("bad base64 content: {}", e))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl RemoteStore for GitHubStore {
    fn get_entry(&self, path: &str, git_ref: &str) -> StoreResult<RemoteEntry> {
        let url = self.contents_url(path, Some(git_ref))?;
        let value: serde_json::Value = self.get_json(url)?;
        if value.is_array() {
            return Err(StoreError::new(
                StoreErrorKind::Unprocessable,
                format!("{} is a directory", path),
            ));
        }

        let file: ContentFile = serde_json::from_value(value).map_err(|e| {
            StoreError::new(
                StoreErrorKind::Transport,
                format!("unexpected response body: {}", e),
            )
        })?;
        Ok(RemoteEntry {
            content: decode_content(&file)?,
            version: file.sha,
        })
    }

    fn create_entry(
        &self,
        path: &str,
        message: &str,
        content: &str,
        branch: &str,
    ) -> StoreResult<WriteReceipt> {
        self.put_contents(path, message, content, None, branch)
    }

    fn update_entry(
        &self,
        path: &str,
        message: &str,
        content: &str,
        version: &str,
        branch: &str,
    ) -> StoreResult<WriteReceipt> {
        self.put_contents(path, message, content, Some(version), branch)
    }

    fn get_branch(&self, name: &str) -> StoreResult<BranchInfo> {
        let url = self.repo_url(["branches", name])?;
        let branch: Branch = self.get_json(url)?;
        Ok(BranchInfo {
            name: branch.name,
            head: branch.commit.sha,
        })
    }

    fn repository(&self) -> StoreResult<RepositoryInfo> {
        let url = self.repo_url(std::iter::empty::<&str>())?;
        let repo: Repository = self.get_json(url)?;
        Ok(RepositoryInfo {
            full_name: repo.full_name,
            default_branch: repo.default_branch,
        })
    }

    fn list_dir(&self, path: &str, git_ref: &str) -> StoreResult<Vec<String>> {
        let url = self.contents_url(path, Some(git_ref))?;
        let value: serde_json::Value = self.get_json(url)?;
        if !value.is_array() {
            return Err(StoreError::new(
                StoreErrorKind::Unprocessable,
                format!("{} is not a directory", path),
            ));
        }
        let items: Vec<DirItem> = serde_json::from_value(value).map_err(|e| {
            StoreError::new(
                StoreErrorKind::Transport,
                format!("unexpected response body: {}", e),
            )
        })?;
        Ok(items.into_iter().map(|item| item.name).collect())
    }
}
