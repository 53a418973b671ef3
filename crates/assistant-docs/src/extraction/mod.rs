//! Text extraction: PDF parsing, sanitizing and quality checks

mod pdf;
pub mod text;

pub use pdf::{extract_blocking, ExtractionResult, PdfExtractor, PdfMetadata, PAGE_SEPARATOR};
pub use text::{is_usable_extraction, preview, sanitize, ELLIPSIS, FAILURE_MARKERS};
