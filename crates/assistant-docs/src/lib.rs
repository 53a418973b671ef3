//! assistant-docs: document storage and prompt context for the business assistant
//!
//! Uploaded files are kept in an object store with a metadata row per
//! document. PDFs get their embedded text extracted, cleaned and quality
//! checked once at upload; the context builder turns a user's documents and
//! the company documents into a bounded text block for an AI prompt.

pub mod config;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use extraction::{sanitize, ExtractionResult, PdfExtractor};
pub use generation::ContextBuilder;
pub use pipeline::{DocumentService, UploadPipeline};
pub use types::{DocumentRecord, DocumentScope, UploadFile};
