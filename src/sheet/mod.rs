//! Tabular JSON documents stored in the content service.
//!
//! Two shapes exist: a flat single-table sheet and a multi-sheet document
//! holding several named tables. Rows are identified by a key column.

pub mod document;
pub mod rows;

pub use document::{
    decode_data_sheet, decode_options_sheet, encode_multi_sheet, encode_sheet,
    is_empty_document, MultiSheet, SheetDocument, DATA_SHEET, LIBRARY_SHEET,
    MULTI_SHEET_VERSION, OPTIONS_SHEET,
};
pub use rows::{row, row_value, Row, Sheet};
