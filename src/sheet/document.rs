//! Flat and multi-sheet document shapes and their JSON wire encoding.
//!
//! ```text
//! flat:  { total, limit, offset, data: [..], ":type": "sheet" }
//! multi: { <name>: { ..sheet.. }, ..., ":version": 3, ":names": [..], ":type": "multi-sheet" }
//! ```
//!
//! The shape always comes from the `:type` tag.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::rows::{Row, Sheet};
use crate::error::{LibraryError, Result};

pub const MULTI_SHEET_VERSION: u64 = 3;

pub const DATA_SHEET: &str = "data";
pub const OPTIONS_SHEET: &str = "options";
pub const LIBRARY_SHEET: &str = "library";

const TYPE_KEY: &str = ":type";
const NAMES_KEY: &str = ":names";
const VERSION_KEY: &str = ":version";
const SHEET_TAG: &str = "sheet";
const MULTI_SHEET_TAG: &str = "multi-sheet";

/// Named sheets with their declared order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiSheet {
    names: Vec<String>,
    sheets: BTreeMap<String, Sheet>,
    /// Top-level members that are not sheets (`:private` and the like)
    extra: Map<String, Value>,
}

impl MultiSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheet names in document order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Add or replace a sheet. New names go last.
    pub fn insert(&mut self, name: impl Into<String>, sheet: Sheet) {
        let name = name.into();
        if !self.sheets.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.sheets.insert(name, sheet);
    }

    /// Builder form of [`MultiSheet::insert`]
    pub fn with_sheet(mut self, name: impl Into<String>, sheet: Sheet) -> Self {
        self.insert(name, sheet);
        self
    }

    /// Iterate sheets in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Sheet)> {
        self.names
            .iter()
            .filter_map(|n| self.sheets.get(n).map(|s| (n.as_str(), s)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Non-sheet top-level members carried through encoding
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A stored library document in one of its two shapes
#[derive(Debug, Clone, PartialEq)]
pub enum SheetDocument {
    Flat(Sheet),
    Multi(MultiSheet),
}

impl SheetDocument {
    /// Decode a document from its wire form
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| LibraryError::MalformedDocument("document is not an object".into()))?;

        match obj.get(TYPE_KEY).and_then(Value::as_str) {
            Some(SHEET_TAG) => Ok(SheetDocument::Flat(decode_sheet(value)?)),
            Some(MULTI_SHEET_TAG) => decode_multi(obj).map(SheetDocument::Multi),
            Some(other) => Err(LibraryError::MalformedDocument(format!(
                "unsupported document type '{}'",
                other
            ))),
            None => Err(LibraryError::MalformedDocument(
                "missing ':type' tag".into(),
            )),
        }
    }

    /// Encode to the wire form
    pub fn to_value(&self) -> Value {
        match self {
            SheetDocument::Flat(sheet) => sheet_value(sheet),
            SheetDocument::Multi(multi) => {
                let mut obj = Map::new();
                for (name, sheet) in multi.iter() {
                    obj.insert(name.to_string(), sheet_value(sheet));
                }
                for (key, value) in &multi.extra {
                    obj.insert(key.clone(), value.clone());
                }
                obj.insert(VERSION_KEY.into(), Value::from(MULTI_SHEET_VERSION));
                obj.insert(
                    NAMES_KEY.into(),
                    Value::Array(multi.names().iter().cloned().map(Value::String).collect()),
                );
                obj.insert(TYPE_KEY.into(), Value::String(MULTI_SHEET_TAG.into()));
                Value::Object(obj)
            }
        }
    }

    pub fn is_multi_sheet(&self) -> bool {
        matches!(self, SheetDocument::Multi(_))
    }
}

/// True for the values a store may hand back for "nothing here yet"
pub fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

fn decode_sheet(value: &Value) -> Result<Sheet> {
    let mut sheet: Sheet = serde_json::from_value(value.clone())
        .map_err(|e| LibraryError::MalformedDocument(format!("invalid sheet: {}", e)))?;
    // re-added on encode
    sheet.extra.remove(TYPE_KEY);
    Ok(sheet)
}

fn decode_multi(obj: &Map<String, Value>) -> Result<MultiSheet> {
    let names: Vec<String> = match obj.get(NAMES_KEY) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    LibraryError::MalformedDocument("':names' must list strings".into())
                })
            })
            .collect::<Result<_>>()?,
        Some(_) => {
            return Err(LibraryError::MalformedDocument(
                "':names' must be an array".into(),
            ))
        }
        None => obj
            .iter()
            .filter(|(k, v)| !k.starts_with(':') && v.is_object())
            .map(|(k, _)| k.clone())
            .collect(),
    };

    let mut multi = MultiSheet::new();
    for name in &names {
        let value = obj.get(name).ok_or_else(|| {
            LibraryError::MalformedDocument(format!("sheet '{}' listed but missing", name))
        })?;
        multi.insert(name.clone(), decode_sheet(value)?);
    }

    multi.extra = obj
        .iter()
        .filter(|(k, _)| {
            !names.contains(k) && ![TYPE_KEY, NAMES_KEY, VERSION_KEY].contains(&k.as_str())
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(multi)
}

fn sheet_value(sheet: &Sheet) -> Value {
    // Sheet only holds maps, numbers and strings
    let mut value = serde_json::to_value(sheet).unwrap_or_else(|_| Value::Object(Map::new()));
    if let Value::Object(obj) = &mut value {
        obj.insert(TYPE_KEY.into(), Value::String(SHEET_TAG.into()));
    }
    value
}

/// The primary table: the flat sheet itself, or the multi-sheet `data` member
pub fn decode_data_sheet(doc: &SheetDocument) -> Option<&Sheet> {
    match doc {
        SheetDocument::Flat(sheet) => Some(sheet),
        SheetDocument::Multi(multi) => multi.get(DATA_SHEET),
    }
}

/// The `options` side table, when the document has one
pub fn decode_options_sheet(doc: &SheetDocument) -> Option<&Sheet> {
    match doc {
        SheetDocument::Flat(_) => None,
        SheetDocument::Multi(multi) => multi.get(OPTIONS_SHEET),
    }
}

/// Wrap rows as a single-table document
pub fn encode_sheet(rows: Vec<Row>) -> SheetDocument {
    SheetDocument::Flat(Sheet::from_rows(rows))
}

/// Wrap named row sets as a multi-sheet document, keeping the given order
pub fn encode_multi_sheet<S: Into<String>>(
    named: impl IntoIterator<Item = (S, Vec<Row>)>,
) -> SheetDocument {
    let multi = named
        .into_iter()
        .fold(MultiSheet::new(), |m, (name, rows)| {
            m.with_sheet(name, Sheet::from_rows(rows))
        });
    SheetDocument::Multi(multi)
}
