//! Registration of library sheets in the site configuration.
//!
//! The site config is a sheet document with a `library` table mapping a
//! library type (`title`) to the public URL of its sheet (`path`). A flat
//! config is migrated to multi-sheet form before the table is added.

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::kind::LibraryType;
use crate::adapters::DocumentStore;
use crate::error::{validate_identifier, Result};
use crate::sheet::{
    is_empty_document, row_value, MultiSheet, Row, Sheet, SheetDocument, DATA_SHEET, LIBRARY_SHEET,
};

const TITLE: &str = "title";
const PATH: &str = "path";

/// Shape of the stored config when a registration starts
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigShape {
    Missing,
    Flat(Sheet),
    MultiSheetNoLibrary(MultiSheet),
    MultiSheetWithLibrary(MultiSheet),
}

impl ConfigShape {
    /// Classify a fetched config value
    pub fn classify(value: Option<&serde_json::Value>) -> Result<Self> {
        let Some(value) = value.filter(|v| !is_empty_document(v)) else {
            return Ok(ConfigShape::Missing);
        };

        Ok(match SheetDocument::from_value(value)? {
            SheetDocument::Flat(sheet) => ConfigShape::Flat(sheet),
            SheetDocument::Multi(multi) if multi.contains(LIBRARY_SHEET) => {
                ConfigShape::MultiSheetWithLibrary(multi)
            }
            SheetDocument::Multi(multi) => ConfigShape::MultiSheetNoLibrary(multi),
        })
    }
}

/// A multi-sheet config guaranteed to hold a `library` sheet
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedConfig {
    pub document: MultiSheet,
    pub sheet_existed: bool,
    pub created_sheet: bool,
    pub converted_to_multi_sheet: bool,
    pub preserved_rows: usize,
}

impl PreparedConfig {
    /// Bring any config shape to one with a `library` sheet
    pub fn from_shape(shape: ConfigShape) -> Self {
        match shape {
            ConfigShape::Missing => Self {
                document: MultiSheet::new().with_sheet(LIBRARY_SHEET, Sheet::empty()),
                sheet_existed: false,
                created_sheet: true,
                converted_to_multi_sheet: false,
                preserved_rows: 0,
            },
            ConfigShape::Flat(sheet) => {
                let preserved_rows = sheet.len();
                Self {
                    // the flat sheet moves as-is, keeping total and column widths
                    document: MultiSheet::new()
                        .with_sheet(DATA_SHEET, sheet)
                        .with_sheet(LIBRARY_SHEET, Sheet::empty()),
                    sheet_existed: false,
                    created_sheet: true,
                    converted_to_multi_sheet: true,
                    preserved_rows,
                }
            }
            ConfigShape::MultiSheetNoLibrary(multi) => Self {
                document: multi.with_sheet(LIBRARY_SHEET, Sheet::empty()),
                sheet_existed: false,
                created_sheet: true,
                converted_to_multi_sheet: false,
                preserved_rows: 0,
            },
            ConfigShape::MultiSheetWithLibrary(multi) => Self {
                document: multi,
                sheet_existed: true,
                created_sheet: false,
                converted_to_multi_sheet: false,
                preserved_rows: 0,
            },
        }
    }

    /// A copy of the `library` sheet
    pub fn library(&self) -> Sheet {
        self.document
            .get(LIBRARY_SHEET)
            .cloned()
            .unwrap_or_default()
    }
}

/// Set the path for `kind` in a library sheet.
///
/// Returns the new sheet and whether the type was already registered. New
/// rows are back-filled with empty strings for every other column in use.
pub fn register_type(library: &Sheet, kind: &str, path: &str) -> (Sheet, bool) {
    if let Some(existing) = library.find_row(kind, TITLE) {
        let mut updated = existing.clone();
        updated.insert(PATH.to_string(), path.into());
        return (library.upsert_row(updated, TITLE), true);
    }

    let mut columns = library.columns();
    for required in [TITLE, PATH] {
        if !columns.iter().any(|c| c == required) {
            columns.push(required.to_string());
        }
    }

    let new_row: Row = columns
        .into_iter()
        .map(|column| {
            let value = match column.as_str() {
                TITLE => kind.to_string(),
                PATH => path.to_string(),
                _ => String::new(),
            };
            (column, value.into())
        })
        .collect();

    (library.upsert_row(new_row, TITLE), false)
}

/// Result of a registration. Failures are reported here, never raised.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationOutcome {
    pub registered: bool,
    pub existed: bool,
    pub created_sheet: bool,
    pub converted_to_multi_sheet: bool,
    pub preserved_rows: usize,
    pub library_entry_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegistrationOutcome {
    fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// Result of a read-only registration check
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationCheck {
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Titles currently registered, when the type is missing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub registered_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Registers library sheets in a site's configuration
pub struct Registrar<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> Registrar<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Map `kind` to `path` in the site config's `library` sheet
    #[instrument(skip(self))]
    pub async fn register(&self, org: &str, repo: &str, kind: &str, path: &str) -> RegistrationOutcome {
        match self.try_register(org, repo, kind, path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Library registration failed");
                RegistrationOutcome::failed(e)
            }
        }
    }

    async fn try_register(
        &self,
        org: &str,
        repo: &str,
        kind: &str,
        path: &str,
    ) -> Result<RegistrationOutcome> {
        validate_identifier("org", org)?;
        validate_identifier("repo", repo)?;
        kind.parse::<LibraryType>()?;

        let current = self.store.get_site_config(org, repo).await?;
        let shape = ConfigShape::classify(current.as_ref())?;
        let mut prepared = PreparedConfig::from_shape(shape);

        let (library, existed) = register_type(&prepared.library(), kind, path);
        let library_entry_count = library.len();
        prepared.document.insert(LIBRARY_SHEET, library);

        let document = SheetDocument::Multi(prepared.document);
        self.store
            .put_site_config(org, repo, &document.to_value())
            .await?;

        info!(
            store = self.store.name(),
            existed,
            converted = prepared.converted_to_multi_sheet,
            entries = library_entry_count,
            "Registered library type"
        );

        Ok(RegistrationOutcome {
            registered: true,
            existed,
            created_sheet: prepared.created_sheet,
            converted_to_multi_sheet: prepared.converted_to_multi_sheet,
            preserved_rows: prepared.preserved_rows,
            library_entry_count,
            error: None,
        })
    }

    /// Look up a registration without writing anything
    #[instrument(skip(self))]
    pub async fn check(&self, org: &str, repo: &str, kind: &str) -> RegistrationCheck {
        match self.try_check(org, repo, kind).await {
            Ok(check) => check,
            Err(e) => RegistrationCheck {
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }

    async fn try_check(&self, org: &str, repo: &str, kind: &str) -> Result<RegistrationCheck> {
        validate_identifier("org", org)?;
        validate_identifier("repo", repo)?;
        kind.parse::<LibraryType>()?;

        let current = self.store.get_site_config(org, repo).await?;
        let library = match ConfigShape::classify(current.as_ref())? {
            ConfigShape::MultiSheetWithLibrary(multi) => multi.get(LIBRARY_SHEET).cloned(),
            _ => None,
        };

        let Some(library) = library else {
            return Ok(RegistrationCheck {
                reason: Some("site config has no library sheet".to_string()),
                ..Default::default()
            });
        };

        match library.find_row(kind, TITLE) {
            Some(found) => Ok(RegistrationCheck {
                registered: true,
                path: row_value(found, PATH),
                ..Default::default()
            }),
            None => Ok(RegistrationCheck {
                reason: Some(format!("'{}' is not registered", kind)),
                registered_types: library
                    .data
                    .iter()
                    .filter_map(|r| row_value(r, TITLE))
                    .collect(),
                ..Default::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::row;
    use serde_json::json;

    #[test]
    fn test_classify_shapes() {
        assert_eq!(ConfigShape::classify(None).unwrap(), ConfigShape::Missing);
        assert_eq!(
            ConfigShape::classify(Some(&json!({}))).unwrap(),
            ConfigShape::Missing
        );

        let flat = json!({ "data": [{ "key": "a", "value": "b" }], ":type": "sheet" });
        assert!(matches!(
            ConfigShape::classify(Some(&flat)).unwrap(),
            ConfigShape::Flat(_)
        ));

        let multi = json!({
            "data": { "data": [], ":type": "sheet" },
            ":names": ["data"],
            ":version": 3,
            ":type": "multi-sheet"
        });
        assert!(matches!(
            ConfigShape::classify(Some(&multi)).unwrap(),
            ConfigShape::MultiSheetNoLibrary(_)
        ));
    }

    #[test]
    fn test_flat_migration_preserves_rows() {
        let rows = vec![
            row([("key", "admin.role.all"), ("value", "a@example.com")]),
            row([("key", "editor.path"), ("value", "/drafts")]),
            row([("key", "cdn.prod.host"), ("value", "www.example.com")]),
        ];
        let mut sheet = Sheet::from_rows(rows.clone());
        sheet.total = 3;
        sheet.col_widths = Some(json!([150, 300]));

        let prepared = PreparedConfig::from_shape(ConfigShape::Flat(sheet));

        assert!(prepared.converted_to_multi_sheet);
        assert!(prepared.created_sheet);
        assert_eq!(prepared.preserved_rows, 3);
        let data = prepared.document.get(DATA_SHEET).unwrap();
        assert_eq!(data.data, rows);
        assert_eq!(data.col_widths, Some(json!([150, 300])));
        assert_eq!(prepared.document.names(), ["data", "library"]);
        assert!(prepared.library().is_empty());
    }

    #[test]
    fn test_multi_without_library_keeps_other_sheets() {
        let multi = MultiSheet::new()
            .with_sheet("data", Sheet::from_rows(vec![row([("key", "x")])]))
            .with_sheet("permissions", Sheet::from_rows(vec![row([("path", "/")])]));

        let prepared = PreparedConfig::from_shape(ConfigShape::MultiSheetNoLibrary(multi.clone()));

        assert_eq!(prepared.preserved_rows, 0);
        assert!(!prepared.converted_to_multi_sheet);
        assert_eq!(prepared.document.get("data"), multi.get("data"));
        assert_eq!(prepared.document.get("permissions"), multi.get("permissions"));
        assert_eq!(prepared.document.names(), ["data", "permissions", "library"]);
    }

    #[test]
    fn test_register_type_appends_and_backfills() {
        let library = Sheet::from_rows(vec![row([
            ("title", "blocks"),
            ("path", "https://content.da.live/a/b/docs/library/blocks.json"),
            ("experience", "block"),
        ])]);

        let (updated, existed) = register_type(&library, "icons", "https://icons.json");

        assert!(!existed);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated.total, 2);
        let added = &updated.data[1];
        assert_eq!(row_value(added, "title").as_deref(), Some("icons"));
        assert_eq!(row_value(added, "path").as_deref(), Some("https://icons.json"));
        assert_eq!(row_value(added, "experience").as_deref(), Some(""));
    }

    #[test]
    fn test_register_type_twice_last_path_wins() {
        let (once, _) = register_type(&Sheet::empty(), "blocks", "/first.json");
        let (twice, existed) = register_type(&once, "blocks", "/second.json");

        assert!(existed);
        assert_eq!(twice.len(), 1);
        assert_eq!(
            row_value(&twice.data[0], "path").as_deref(),
            Some("/second.json")
        );
    }
}
