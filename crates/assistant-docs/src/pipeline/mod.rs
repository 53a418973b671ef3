//! Document pipeline: uploads and document management

mod documents;
mod upload;

pub use documents::DocumentService;
pub use upload::{storage_path, UploadPipeline};
