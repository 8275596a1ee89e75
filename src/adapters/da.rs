//! HTTP client for the document-authoring admin API.
//!
//! ```text
//! GET  <admin>/source/<org>/<repo><path>.json   sheet documents
//! PUT  <admin>/source/<org>/<repo><path>.html   pages (multipart `data`)
//! GET  <admin>/config/<org>/<repo>/             site configuration
//! POST <admin>/config/<org>/<repo>/             (multipart `config`)
//! ```

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::DocumentStore;
use crate::config::ResolvedConfig;
use crate::error::{LibraryError, Result};

const SERVICE: &str = "content service";

/// Admin API client
pub struct DaClient {
    /// Admin API base URL, no trailing slash
    admin_url: String,
    /// Bearer token (anonymous when absent)
    token: Option<String>,
    /// HTTP client
    client: reqwest::Client,
}

impl DaClient {
    /// Create a new client
    pub fn new(admin_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            admin_url: admin_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Create from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(config.admin_url.clone(), config.da_token.clone())
    }

    fn source_url(&self, org: &str, repo: &str, path: &str, ext: &str) -> String {
        format!(
            "{}/source/{}/{}/{}.{}",
            self.admin_url,
            org,
            repo,
            path.trim_matches('/'),
            ext
        )
    }

    fn config_url(&self, org: &str, repo: &str) -> String {
        format!("{}/config/{}/{}/", self.admin_url, org, repo)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET a resource; 404 maps to `None`
    async fn fetch(&self, url: &str) -> Result<Option<Response>> {
        debug!(%url, "GET");
        let response = self.request(Method::GET, url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(transport_error(url, response).await);
        }
        Ok(Some(response))
    }

    async fn upload(&self, method: Method, url: &str, field: &str, part: Part) -> Result<()> {
        debug!(%url, %method, "upload");
        let form = Form::new().part(field.to_string(), part);
        let response = self.request(method, url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(transport_error(url, response).await);
        }
        Ok(())
    }

    async fn fetch_json(&self, url: &str) -> Result<Option<Value>> {
        match self.fetch(url).await? {
            Some(response) => Ok(Some(response.json().await?)),
            None => Ok(None),
        }
    }

    fn json_part(value: &Value, file_name: &str) -> Result<Part> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/json")?)
    }
}

async fn transport_error(url: &str, response: Response) -> LibraryError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    LibraryError::Transport {
        service: SERVICE,
        url: url.to_string(),
        status,
        body,
    }
}

#[async_trait]
impl DocumentStore for DaClient {
    fn name(&self) -> &str {
        "da"
    }

    async fn get_document(&self, org: &str, repo: &str, path: &str) -> Result<Option<Value>> {
        self.fetch_json(&self.source_url(org, repo, path, "json")).await
    }

    async fn put_document(
        &self,
        org: &str,
        repo: &str,
        path: &str,
        document: &Value,
    ) -> Result<()> {
        let url = self.source_url(org, repo, path, "json");
        let part = Self::json_part(document, "data.json")?;
        self.upload(Method::PUT, &url, "data", part).await
    }

    async fn get_html(&self, org: &str, repo: &str, path: &str) -> Result<Option<String>> {
        match self.fetch(&self.source_url(org, repo, path, "html")).await? {
            Some(response) => Ok(Some(response.text().await?)),
            None => Ok(None),
        }
    }

    async fn put_html(&self, org: &str, repo: &str, path: &str, html: &str) -> Result<()> {
        let url = self.source_url(org, repo, path, "html");
        let part = Part::text(html.to_string())
            .file_name("index.html")
            .mime_str("text/html")?;
        self.upload(Method::PUT, &url, "data", part).await
    }

    async fn get_site_config(&self, org: &str, repo: &str) -> Result<Option<Value>> {
        self.fetch_json(&self.config_url(org, repo)).await
    }

    async fn put_site_config(&self, org: &str, repo: &str, config: &Value) -> Result<()> {
        let url = self.config_url(org, repo);
        let bytes = serde_json::to_string(config)?;
        let part = Part::text(bytes).mime_str("application/json")?;
        self.upload(Method::POST, &url, "config", part).await
    }
}
