//! GitHub contents API client for reading block sources.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{DirEntry, EntryKind, SourceHost};
use crate::config::ResolvedConfig;
use crate::error::{LibraryError, Result};

const SERVICE: &str = "source host";

/// GitHub REST client
pub struct GitHubClient {
    /// API base URL, no trailing slash
    api_url: String,
    /// Personal access token (anonymous when absent)
    token: Option<String>,
    /// HTTP client
    client: reqwest::Client,
}

/// Response of the contents endpoint: a listing or a single file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentsEntry>),
    File(ContentsFile),
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl GitHubClient {
    /// Create a new client
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Create from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(config.github_api_url.clone(), config.github_token.clone())
    }

    /// Build contents API URL
    fn contents_url(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_url,
            owner,
            repo,
            path.trim_matches('/'),
            git_ref
        )
    }

    async fn contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<ContentsResponse>> {
        let url = self.contents_url(owner, repo, path, git_ref);
        debug!(%url, "GET contents");

        let mut request = self
            .client
            .get(&url)
            .header(USER_AGENT, concat!("sheetlib/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::Transport {
                service: SERVICE,
                url,
                status,
                body,
            });
        }

        Ok(Some(response.json().await?))
    }
}

/// Decode file content in the transport encoding the API reports
fn decode_content(file: ContentsFile) -> Result<String> {
    let content = file.content.unwrap_or_default();
    match file.encoding.as_deref() {
        Some("base64") => {
            let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD.decode(cleaned)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Ok(content),
    }
}

fn entry_kind(kind: &str) -> EntryKind {
    match kind {
        "file" => EntryKind::File,
        "dir" => EntryKind::Dir,
        _ => EntryKind::Other,
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Vec<DirEntry>>> {
        match self.contents(owner, repo, path, git_ref).await? {
            Some(ContentsResponse::Listing(entries)) => Ok(Some(
                entries
                    .into_iter()
                    .map(|e| DirEntry {
                        kind: entry_kind(&e.kind),
                        name: e.name,
                        path: e.path,
                    })
                    .collect(),
            )),
            Some(ContentsResponse::File(_)) | None => Ok(None),
        }
    }

    async fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>> {
        match self.contents(owner, repo, path, git_ref).await? {
            Some(ContentsResponse::File(file)) => decode_content(file).map(Some),
            Some(ContentsResponse::Listing(_)) | None => Ok(None),
        }
    }
}
