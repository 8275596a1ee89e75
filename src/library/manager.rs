//! Read-modify-write of library sheets stored in the content service.
//!
//! Nothing is cached: every operation fetches the current document, applies
//! one change and writes the whole document back. There is no
//! compare-and-swap, so callers mutating the same document must do so one
//! operation at a time.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::document::encode_typed;
use super::kind::LibraryType;
use super::paths::storage_path;
use crate::adapters::DocumentStore;
use crate::error::{validate_identifier, LibraryError, Result};
use crate::sheet::{
    decode_data_sheet, decode_options_sheet, is_empty_document, row_value, Row, Sheet,
    SheetDocument,
};

/// Result of an upsert
#[derive(Debug, Clone, Serialize)]
pub struct UpsertOutcome {
    pub added: bool,
    /// True when a row with the same key was replaced
    pub existed: bool,
    pub path: String,
    pub entry: Row,
}

/// Result of a removal. A missing document is reported, not raised.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveOutcome {
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-item outcome within a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    /// Key of the entry, when it could be built
    pub key: Option<String>,
    pub success: bool,
    pub existed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate counts of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub added: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Result of a batch upsert. Applied items stay applied when others fail.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub path: String,
    pub summary: BatchSummary,
    pub results: Vec<BatchItemResult>,
    pub errors: Vec<String>,
}

/// Encoder for a library type, carrying the current options sheet through
pub fn encoder(kind: LibraryType) -> impl Fn(Vec<Row>, Option<Sheet>) -> Result<SheetDocument> {
    move |rows, options| Ok(encode_typed(kind, rows, options))
}

/// Library sheet manager over a document store
pub struct SheetManager<S> {
    store: S,
}

impl<S: DocumentStore> SheetManager<S> {
    /// Create a new manager
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch and decode a document; absence and `{}` are `None`
    pub async fn load(&self, org: &str, repo: &str, path: &str) -> Result<Option<SheetDocument>> {
        validate_identifier("org", org)?;
        validate_identifier("repo", repo)?;

        match self.store.get_document(org, repo, path).await? {
            Some(value) if !is_empty_document(&value) => {
                SheetDocument::from_value(&value).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Rows of the document's data sheet, or none when it does not exist
    #[instrument(skip(self))]
    pub async fn read_items(&self, org: &str, repo: &str, path: &str) -> Result<Vec<Row>> {
        let items = self
            .load(org, repo, path)
            .await?
            .and_then(|doc| decode_data_sheet(&doc).map(|s| s.data.clone()))
            .unwrap_or_default();

        debug!(count = items.len(), "Read library items");
        Ok(items)
    }

    /// Insert or replace one entry by key and persist the document
    #[instrument(skip(self, entry, encode))]
    pub async fn upsert_item<E>(
        &self,
        org: &str,
        repo: &str,
        entry: Row,
        key_field: &str,
        path: &str,
        encode: &E,
    ) -> Result<UpsertOutcome>
    where
        E: Fn(Vec<Row>, Option<Sheet>) -> Result<SheetDocument>,
    {
        let key = row_value(&entry, key_field)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LibraryError::MissingKey(key_field.to_string()))?;

        let current = self.load(org, repo, path).await?;
        let (sheet, options) = split(current.as_ref());

        let existed = sheet.row_exists(&key, key_field);
        let updated = sheet.upsert_row(entry.clone(), key_field);

        let document = encode(updated.data, options)?;
        self.store
            .put_document(org, repo, path, &document.to_value())
            .await?;

        info!(store = self.store.name(), %key, existed, "Upserted library entry");
        Ok(UpsertOutcome {
            added: true,
            existed,
            path: path.to_string(),
            entry,
        })
    }

    /// Remove every entry with the given key and persist the document
    #[instrument(skip(self, encode))]
    pub async fn remove_item<E>(
        &self,
        org: &str,
        repo: &str,
        key_value: &str,
        key_field: &str,
        path: &str,
        encode: &E,
    ) -> Result<RemoveOutcome>
    where
        E: Fn(Vec<Row>, Option<Sheet>) -> Result<SheetDocument>,
    {
        let Some(current) = self.load(org, repo, path).await? else {
            warn!("No library document to remove from");
            return Ok(RemoveOutcome {
                removed: false,
                path: None,
                error: Some("not found".to_string()),
            });
        };

        let (sheet, options) = split(Some(&current));
        let updated = sheet.remove_row(key_value, key_field);

        let document = encode(updated.data, options)?;
        self.store
            .put_document(org, repo, path, &document.to_value())
            .await?;

        info!(store = self.store.name(), key = %key_value, "Removed library entry");
        Ok(RemoveOutcome {
            removed: true,
            path: Some(path.to_string()),
            error: None,
        })
    }

    /// Upsert items one after another; failures are collected, not raised.
    ///
    /// Each item re-reads the document, so later items observe earlier ones.
    #[instrument(skip(self, items, encode, to_row), fields(count = items.len()))]
    pub async fn batch_upsert<T, E, F>(
        &self,
        org: &str,
        repo: &str,
        items: &[T],
        key_field: &str,
        path: &str,
        encode: &E,
        to_row: F,
    ) -> BatchOutcome
    where
        E: Fn(Vec<Row>, Option<Sheet>) -> Result<SheetDocument>,
        F: Fn(&T) -> Result<Row>,
    {
        let mut summary = BatchSummary {
            total: items.len(),
            ..Default::default()
        };
        let mut results = Vec::with_capacity(items.len());
        let mut errors = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let entry = to_row(item);
            let key = entry
                .as_ref()
                .ok()
                .and_then(|row| row_value(row, key_field));

            let outcome = match entry {
                Ok(row) => {
                    self.upsert_item(org, repo, row, key_field, path, encode)
                        .await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(done) => {
                    if done.existed {
                        summary.updated += 1;
                    } else {
                        summary.added += 1;
                    }
                    results.push(BatchItemResult {
                        key,
                        success: true,
                        existed: done.existed,
                        error: None,
                    });
                }
                Err(e) => {
                    summary.failed += 1;
                    let label = key.clone().unwrap_or_else(|| format!("item {}", index));
                    warn!(item = %label, error = %e, "Batch item failed");
                    errors.push(format!("{}: {}", label, e));
                    results.push(BatchItemResult {
                        key,
                        success: false,
                        existed: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(
            added = summary.added,
            updated = summary.updated,
            failed = summary.failed,
            "Batch upsert finished"
        );

        BatchOutcome {
            success: summary.failed == 0,
            path: path.to_string(),
            summary,
            results,
            errors,
        }
    }

    /// Rows of a library type's sheet under `base_folder`
    pub async fn list_library(
        &self,
        org: &str,
        repo: &str,
        kind: LibraryType,
        base_folder: &str,
    ) -> Result<Vec<Row>> {
        let path = storage_path(kind, base_folder, None);
        self.read_items(org, repo, &path).await
    }

    /// Upsert one entry into a library type's sheet, keyed by the type's key field
    pub async fn add_entry(
        &self,
        org: &str,
        repo: &str,
        kind: LibraryType,
        base_folder: &str,
        entry: Row,
    ) -> Result<UpsertOutcome> {
        let path = storage_path(kind, base_folder, None);
        self.upsert_item(org, repo, entry, kind.key_field(), &path, &encoder(kind))
            .await
    }

    /// Remove one entry from a library type's sheet
    pub async fn remove_entry(
        &self,
        org: &str,
        repo: &str,
        kind: LibraryType,
        base_folder: &str,
        key_value: &str,
    ) -> Result<RemoveOutcome> {
        let path = storage_path(kind, base_folder, None);
        self.remove_item(org, repo, key_value, kind.key_field(), &path, &encoder(kind))
            .await
    }
}

/// Data sheet (empty when absent) and options sheet of a document
fn split(doc: Option<&SheetDocument>) -> (Sheet, Option<Sheet>) {
    match doc {
        Some(doc) => (
            decode_data_sheet(doc).cloned().unwrap_or_default(),
            decode_options_sheet(doc).cloned(),
        ),
        None => (Sheet::empty(), None),
    }
}
