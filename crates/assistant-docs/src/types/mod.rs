//! Core types for the document service

pub mod document;
pub mod response;

pub use document::{
    DocumentFilter, DocumentRecord, DocumentScope, UploadFile, UploadState, COMPANY_OWNER,
    PDF_MIME,
};
pub use response::{
    ContextResponse, DocumentListResponse, DocumentSummary, ExtractPdfRequest,
    ExtractPdfResponse, ExtractTextResponse, UploadBatchResponse, UploadStatus,
};
