//! Block documentation: source analysis, live markup extraction and page
//! generation.

pub mod analysis;
pub mod extract;
pub mod template;

pub use analysis::{analyze_block, discover_blocks, BlockAnalysis};
pub use extract::{extract_block_content, fetch_block_content, fetch_page};
pub use template::{describe_block, generate_block_doc, BlockDoc, StructureFlags};
