//! Document store backed by a file in a GitHub repository.
//!
//! Uses the repository contents API:
//!
//! - `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}` returns the
//!   base64 file content and its blob SHA.
//! - `PUT /repos/{owner}/{repo}/contents/{path}` commits new content. The
//!   request carries the blob SHA the change was based on and GitHub
//!   refuses it with `409 Conflict` when the file has moved on. Any other
//!   refusal, including a `422` about a missing sha, is not a conflict.
//!
//! The blob SHA is the version token, so every write is a commit that only
//! lands on top of the revision it was computed from.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    decode_document, encode_document, DocumentStore, Snapshot, StoreError, VersionToken, WriteAck,
};
use crate::models::Document;

const USER_AGENT: &str = "Restaurant-Picker-App";
const ACCEPT: &str = "application/vnd.github.v3+json";

/// Where the document lives and how to reach it.
#[derive(Clone)]
pub struct GitHubTarget {
    /// API root, e.g. `https://api.github.com`.
    pub api_url: String,
    /// Repository in `owner/name` form.
    pub repo: String,
    pub branch: String,
    /// Path of the JSON file inside the repository.
    pub path: String,
    /// Access token with contents write permission.
    pub token: String,
    /// Transport timeout for each API call.
    pub timeout: Duration,
}

impl std::fmt::Debug for GitHubTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubTarget")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("path", &self.path)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// File entry returned by the contents API.
#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    /// Base64, wrapped with newlines.
    content: String,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    content: ShaRef,
    #[serde(default)]
    commit: Option<ShaRef>,
}

#[derive(Debug, Deserialize)]
struct ShaRef {
    sha: String,
}

/// Document store reading and committing one file through the GitHub API.
#[derive(Debug, Clone)]
pub struct GitHubStore {
    client: reqwest::Client,
    target: GitHubTarget,
}

impl GitHubStore {
    pub fn new(target: GitHubTarget) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(target.timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, target })
    }

    pub fn target(&self) -> &GitHubTarget {
        &self.target
    }

    /// Contents API URL for the document, with each path segment escaped.
    fn contents_url(&self) -> String {
        let path = self
            .target
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!(
            "{}/repos/{}/contents/{}",
            self.target.api_url.trim_end_matches('/'),
            self.target.repo,
            path
        )
    }

    fn authorization(&self) -> String {
        format!("token {}", self.target.token)
    }
}

impl DocumentStore for GitHubStore {
    async fn read(&self) -> Result<Snapshot, StoreError> {
        let url = format!(
            "{}?ref={}",
            self.contents_url(),
            urlencoding::encode(&self.target.branch)
        );

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, self.authorization())
            .header(header::ACCEPT, ACCEPT)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("GitHub API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "GitHub API error: {}",
                status.as_u16()
            )));
        }

        let file: ContentsFile = response
            .json()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Unexpected GitHub response: {}", e)))?;

        let bytes = decode_content(&file.content)?;
        let document = decode_document(&bytes)?;

        tracing::debug!(sha = %file.sha, path = %self.target.path, "Fetched document");

        Ok(Snapshot {
            document,
            version: VersionToken::new(file.sha),
        })
    }

    async fn write(
        &self,
        document: &Document,
        version: &VersionToken,
        message: &str,
    ) -> Result<WriteAck, StoreError> {
        let body = UpdateRequest {
            message,
            content: STANDARD.encode(encode_document(document)?),
            sha: version.as_str(),
            branch: &self.target.branch,
        };

        let response = self
            .client
            .put(self.contents_url())
            .header(header::AUTHORIZATION, self.authorization())
            .header(header::ACCEPT, ACCEPT)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("GitHub API request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let update: UpdateResponse = response.json().await.map_err(|e| {
                StoreError::Unavailable(format!("Unexpected GitHub response: {}", e))
            })?;

            let commit = update.commit.map(|c| c.sha);
            tracing::info!(
                sha = %update.content.sha,
                commit = commit.as_deref().unwrap_or("-"),
                "Committed: {}",
                message
            );

            return Ok(WriteAck {
                version: VersionToken::new(update.content.sha),
                commit,
            });
        }

        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            tracing::warn!(sha = %version, "Rejected write based on stale document");
            return Err(StoreError::VersionConflict(version.clone()));
        }

        Err(StoreError::Unavailable(format!(
            "GitHub update failed: {} - {}",
            status.as_u16(),
            text
        )))
    }
}

/// Decodes contents API base64, which arrives wrapped at 60 columns.
fn decode_content(content: &str) -> Result<Vec<u8>, StoreError> {
    let compact: String = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Corrupt(format!("Invalid base64 content: {}", e)))
}
