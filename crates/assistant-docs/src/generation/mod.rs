//! Prompt context assembly

mod context;

pub use context::{ContextBuilder, CONTENT_UNAVAILABLE, CONTEXT_HEADER, NO_DOCUMENTS_CONTEXT};
