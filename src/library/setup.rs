//! Multi-item setup flows for each library type.
//!
//! Every flow upserts its items one by one into the type's sheet, then
//! registers the sheet in the site config. A failing item is reported and
//! the rest carry on; nothing already written is rolled back.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::kind::LibraryType;
use super::manager::{encoder, BatchItemResult, BatchOutcome, BatchSummary, SheetManager};
use super::paths::{build_public_url, sheet_url, storage_path};
use super::registrar::{RegistrationOutcome, Registrar};
use crate::adapters::{DocumentStore, SourceHost};
use crate::blocks::{analyze_block, discover_blocks, extract_block_content, fetch_page};
use crate::blocks::{generate_block_doc, BlockDoc};
use crate::error::{LibraryError, Result};
use crate::sheet::{row, Row};

/// Icon keys: lowercase slug
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static ICON_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").unwrap());

/// A page template to list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub name: String,
    /// Storage path of the template page
    pub path: String,
}

/// An icon to list; `icon` defaults to `/icons/<key>.svg`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconItem {
    pub key: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A placeholder string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderItem {
    pub key: String,
    pub text: String,
}

/// Where block sources live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSource {
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
}

/// Outcome of a setup flow
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub success: bool,
    pub library_type: LibraryType,
    pub path: String,
    pub summary: BatchSummary,
    pub items: Vec<BatchItemResult>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationOutcome>,
    pub completed_at: DateTime<Utc>,
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LibraryError::InvalidIdentifier {
            field,
            value: value.to_string(),
            reason: "must not be empty",
        });
    }
    Ok(value)
}

/// Setup flows for one site
pub struct LibrarySetup<'a, S> {
    manager: &'a SheetManager<S>,
    org: &'a str,
    repo: &'a str,
    base_folder: &'a str,
}

impl<'a, S: DocumentStore> LibrarySetup<'a, S> {
    pub fn new(manager: &'a SheetManager<S>, org: &'a str, repo: &'a str, base_folder: &'a str) -> Self {
        Self {
            manager,
            org,
            repo,
            base_folder,
        }
    }

    fn sheet_path(&self, kind: LibraryType) -> String {
        storage_path(kind, self.base_folder, None)
    }

    async fn upsert_all<T, F>(&self, kind: LibraryType, items: &[T], to_row: F) -> BatchOutcome
    where
        F: Fn(&T) -> Result<Row>,
    {
        let path = self.sheet_path(kind);
        self.manager
            .batch_upsert(
                self.org,
                self.repo,
                items,
                kind.key_field(),
                &path,
                &encoder(kind),
                to_row,
            )
            .await
    }

    /// Register the sheet when at least one item made it in
    async fn finish(&self, kind: LibraryType, batch: BatchOutcome) -> SetupReport {
        let persisted = batch.summary.added + batch.summary.updated;
        let registration = if persisted > 0 {
            let url = sheet_url(self.org, self.repo, &batch.path);
            Some(
                Registrar::new(self.manager.store())
                    .register(self.org, self.repo, kind.as_str(), &url)
                    .await,
            )
        } else {
            None
        };

        let registered = registration.as_ref().map_or(true, |r| r.registered);
        let mut errors = batch.errors;
        if let Some(error) = registration.as_ref().and_then(|r| r.error.clone()) {
            errors.push(format!("registration: {}", error));
        }

        info!(library = %kind, success = batch.success && registered, "Setup finished");
        SetupReport {
            success: batch.success && registered,
            library_type: kind,
            path: batch.path,
            summary: batch.summary,
            items: batch.results,
            errors,
            registration,
            completed_at: Utc::now(),
        }
    }

    /// List page templates
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn templates(&self, items: &[TemplateItem]) -> SetupReport {
        let (org, repo) = (self.org, self.repo);
        let batch = self
            .upsert_all(LibraryType::Templates, items, |item| {
                let name = required("template name", &item.name)?;
                let path = required("template path", &item.path)?;
                Ok(row([
                    ("name", name.to_string()),
                    ("path", build_public_url(org, repo, path)),
                ]))
            })
            .await;
        self.finish(LibraryType::Templates, batch).await
    }

    /// List icons
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn icons(&self, items: &[IconItem]) -> SetupReport {
        let (org, repo) = (self.org, self.repo);
        let batch = self
            .upsert_all(LibraryType::Icons, items, |item| {
                if !ICON_KEY_RE.is_match(&item.key) {
                    return Err(LibraryError::InvalidIdentifier {
                        field: "icon key",
                        value: item.key.clone(),
                        reason: "must be a lowercase slug",
                    });
                }
                let icon = item
                    .icon
                    .clone()
                    .unwrap_or_else(|| build_public_url(org, repo, &format!("icons/{}.svg", item.key)));
                Ok(row([("key", item.key.clone()), ("icon", icon)]))
            })
            .await;
        self.finish(LibraryType::Icons, batch).await
    }

    /// List placeholder strings
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn placeholders(&self, items: &[PlaceholderItem]) -> SetupReport {
        let batch = self
            .upsert_all(LibraryType::Placeholders, items, |item| {
                let key = required("placeholder key", &item.key)?;
                Ok(row([("Key", key), ("Text", item.text.as_str())]))
            })
            .await;
        self.finish(LibraryType::Placeholders, batch).await
    }

    /// Document every block in a code repository.
    ///
    /// Each block gets a generated page at `<base>/blocks/<name>`, with live
    /// markup from `sample_page` when one is given, and a row in the blocks
    /// sheet pointing at that page.
    #[instrument(skip(self, host))]
    pub async fn blocks<H: SourceHost + ?Sized>(
        &self,
        host: &H,
        source: &BlockSource,
        sample_page: Option<&str>,
    ) -> SetupReport {
        let kind = LibraryType::Blocks;
        let path = self.sheet_path(kind);

        let names = match discover_blocks(host, &source.owner, &source.repo, &source.git_ref).await {
            Ok(Some(names)) => names,
            Ok(None) => return self.failed(kind, path, "no blocks directory in source repository"),
            Err(e) => return self.failed(kind, path, e),
        };

        let sample = match sample_page {
            Some(page) => fetch_page(self.manager.store(), self.org, self.repo, page).await,
            None => None,
        };

        let mut page_errors = Vec::new();
        let mut rows = Vec::new();
        for name in &names {
            match self.document_block(host, source, name, sample.as_deref()).await {
                Ok(entry) => rows.push(entry),
                Err(e) => {
                    warn!(block = %name, error = %e, "Failed to write block page");
                    page_errors.push((name.clone(), e.to_string()));
                }
            }
        }

        let mut batch = self.upsert_all(kind, &rows, |r| Ok(r.clone())).await;
        for (name, error) in page_errors {
            batch.summary.total += 1;
            batch.summary.failed += 1;
            batch.success = false;
            batch.errors.push(format!("{}: {}", name, error));
            batch.results.push(BatchItemResult {
                key: Some(name),
                success: false,
                existed: false,
                error: Some(error),
            });
        }

        self.finish(kind, batch).await
    }

    async fn document_block<H: SourceHost + ?Sized>(
        &self,
        host: &H,
        source: &BlockSource,
        name: &str,
        sample: Option<&str>,
    ) -> Result<Row> {
        let analysis = analyze_block(host, &source.owner, &source.repo, &source.git_ref, name).await;
        let content = sample.map(|html| extract_block_content(html, name));

        let html = generate_block_doc(&BlockDoc {
            name,
            description: analysis.description.as_deref(),
            variants: &analysis.variants,
            flags: analysis.flags,
            content: content.as_ref(),
        });

        let page_path = storage_path(LibraryType::Blocks, self.base_folder, Some(name));
        self.manager
            .store()
            .put_html(self.org, self.repo, &page_path, &html)
            .await?;

        Ok(row([
            ("name", name.to_string()),
            ("path", build_public_url(self.org, self.repo, &page_path)),
        ]))
    }

    fn failed(&self, kind: LibraryType, path: String, error: impl ToString) -> SetupReport {
        SetupReport {
            success: false,
            library_type: kind,
            path,
            summary: BatchSummary::default(),
            items: Vec::new(),
            errors: vec![error.to_string()],
            registration: None,
            completed_at: Utc::now(),
        }
    }
}
