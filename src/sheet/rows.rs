//! Sheet rows and the flat table that holds them.
//!
//! Mutations never touch the receiver: every operation returns a fresh
//! `Sheet` with `total`/`limit` recomputed and `offset` reset.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single row: ordered column name -> value
pub type Row = Map<String, Value>;

/// Build a row from string pairs, keeping the given column order
pub fn row<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Value::String(v.into())))
        .collect()
}

/// String form of a column value. Missing and null columns have none.
pub fn row_value(row: &Row, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// One table of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(default)]
    pub total: usize,

    #[serde(default)]
    pub limit: usize,

    #[serde(default)]
    pub offset: usize,

    #[serde(default)]
    pub data: Vec<Row>,

    /// Editor column widths, carried through untouched
    #[serde(
        rename = ":colWidths",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub col_widths: Option<Value>,

    /// Any other sheet-level members (`:sheetname`, editor state), kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Sheet {
    fn default() -> Self {
        Self::empty()
    }
}

impl Sheet {
    /// A sheet with no rows
    pub fn empty() -> Self {
        Self::from_rows(Vec::new())
    }

    /// Wrap rows into a sheet with consistent counts
    pub fn from_rows(data: Vec<Row>) -> Self {
        Self {
            total: data.len(),
            limit: data.len(),
            offset: 0,
            data,
            col_widths: None,
            extra: Map::new(),
        }
    }

    fn with_data(&self, data: Vec<Row>) -> Self {
        Self {
            total: data.len(),
            limit: data.len(),
            offset: 0,
            data,
            col_widths: self.col_widths.clone(),
            extra: self.extra.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Find the first row whose `key_field` equals `key_value`
    pub fn find_row(&self, key_value: &str, key_field: &str) -> Option<&Row> {
        self.data
            .iter()
            .find(|r| row_value(r, key_field).as_deref() == Some(key_value))
    }

    /// Membership test by key
    pub fn row_exists(&self, key_value: &str, key_field: &str) -> bool {
        self.find_row(key_value, key_field).is_some()
    }

    /// Replace the row with the same key in place, or append it.
    ///
    /// A row without a value for `key_field` never matches and is appended.
    pub fn upsert_row(&self, row: Row, key_field: &str) -> Sheet {
        let mut data = self.data.clone();
        let position = row_value(&row, key_field).and_then(|key| {
            data.iter()
                .position(|r| row_value(r, key_field).as_deref() == Some(key.as_str()))
        });

        match position {
            Some(pos) => data[pos] = row,
            None => data.push(row),
        }

        self.with_data(data)
    }

    /// Drop every row matching `key_value`. Absent keys return the sheet unchanged.
    pub fn remove_row(&self, key_value: &str, key_field: &str) -> Sheet {
        if !self.row_exists(key_value, key_field) {
            return self.clone();
        }

        let data = self
            .data
            .iter()
            .filter(|r| row_value(r, key_field).as_deref() != Some(key_value))
            .cloned()
            .collect();

        self.with_data(data)
    }

    /// Column names in first-seen order across all rows
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for r in &self.data {
            for key in r.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }
}
