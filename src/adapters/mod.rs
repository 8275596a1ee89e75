//! Adapter interfaces for external systems.
//!
//! Two collaborators sit behind traits: the content service that stores
//! sheets, pages and the site configuration, and the source-code host that
//! holds block implementations. Not-found is always `Ok(None)`.

pub mod da;
pub mod github;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub use da::DaClient;
pub use github::GitHubClient;

/// Remote document store holding library sheets and pages.
///
/// Paths are storage paths without extension (`/docs/library/blocks`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable store name
    fn name(&self) -> &str;

    /// Fetch a JSON document
    async fn get_document(&self, org: &str, repo: &str, path: &str) -> Result<Option<Value>>;

    /// Persist a JSON document, replacing what is there
    async fn put_document(&self, org: &str, repo: &str, path: &str, document: &Value)
        -> Result<()>;

    /// Fetch a page's markup
    async fn get_html(&self, org: &str, repo: &str, path: &str) -> Result<Option<String>>;

    /// Persist a page's markup
    async fn put_html(&self, org: &str, repo: &str, path: &str, html: &str) -> Result<()>;

    /// Fetch the site configuration document
    async fn get_site_config(&self, org: &str, repo: &str) -> Result<Option<Value>>;

    /// Persist the site configuration document
    async fn put_site_config(&self, org: &str, repo: &str, config: &Value) -> Result<()>;
}

/// Kind of entry in a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One entry of a source directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

/// Source-code host serving repository contents
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// List a directory. `None` when the path does not exist or is a file.
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<Vec<DirEntry>>>;

    /// Fetch and decode a file. `None` when the path does not exist.
    async fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>>;
}
