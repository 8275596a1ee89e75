//! Encoding of library documents per library type.

use super::kind::LibraryType;
use crate::error::Result;
use crate::sheet::{row, MultiSheet, Row, Sheet, SheetDocument, DATA_SHEET, OPTIONS_SHEET};

/// Style picker catalog written into fresh blocks documents
const DEFAULT_OPTIONS: &[(&str, &str)] = &[
    ("style", "light, dark, highlight"),
    ("spacing", "none, small, medium, large"),
    ("background", "none, grey, image"),
    ("template", "default, article, landing"),
];

/// The default `options` table for the blocks library
pub fn default_options_sheet() -> Sheet {
    Sheet::from_rows(
        DEFAULT_OPTIONS
            .iter()
            .map(|(key, values)| row([("key", *key), ("values", *values)]))
            .collect(),
    )
}

/// Encode rows for a library type.
///
/// Blocks become a multi-sheet document with `data` and `options`; a given
/// options sheet is carried verbatim. Every other type is a flat sheet.
pub fn encode_library_document(
    kind: &str,
    entries: Vec<Row>,
    options: Option<Sheet>,
) -> Result<SheetDocument> {
    let kind: LibraryType = kind.parse()?;
    Ok(encode_typed(kind, entries, options))
}

/// Typed form of [`encode_library_document`]
pub fn encode_typed(kind: LibraryType, entries: Vec<Row>, options: Option<Sheet>) -> SheetDocument {
    let props = kind.properties();
    if !props.is_multi_sheet {
        return SheetDocument::Flat(Sheet::from_rows(entries));
    }

    let options = match options {
        Some(sheet) => Some(sheet),
        None if props.has_options_default => Some(default_options_sheet()),
        None => None,
    };

    let mut multi = MultiSheet::new().with_sheet(DATA_SHEET, Sheet::from_rows(entries));
    if let Some(options) = options {
        multi.insert(OPTIONS_SHEET, options);
    }
    SheetDocument::Multi(multi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LibraryError;
    use crate::sheet::{decode_data_sheet, decode_options_sheet};

    #[test]
    fn test_blocks_get_default_options() {
        let doc = encode_library_document("blocks", vec![row([("name", "hero")])], None).unwrap();

        assert!(doc.is_multi_sheet());
        assert_eq!(decode_data_sheet(&doc).unwrap().len(), 1);
        let options = decode_options_sheet(&doc).unwrap();
        assert!(options.row_exists("style", "key"));
        assert!(options.row_exists("template", "key"));
    }

    #[test]
    fn test_blocks_carry_given_options_verbatim() {
        let mut custom = Sheet::from_rows(vec![row([("style", "brand")])]);
        custom.col_widths = Some(serde_json::json!([80]));

        let doc = encode_library_document("blocks", vec![], Some(custom.clone())).unwrap();
        assert_eq!(decode_options_sheet(&doc), Some(&custom));
    }

    #[test]
    fn test_other_types_are_flat() {
        for kind in ["templates", "icons", "placeholders"] {
            let doc = encode_library_document(kind, vec![], None).unwrap();
            assert!(!doc.is_multi_sheet(), "{} should be flat", kind);
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(matches!(
            encode_library_document("widgets", vec![], None),
            Err(LibraryError::UnknownLibraryType(_))
        ));
    }
}
