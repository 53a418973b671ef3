//! Provider abstractions for object storage and the document table
//!
//! This module provides trait-based abstractions that allow switching between
//! the local backend (filesystem + SQLite) and Supabase.

pub mod document_table;
pub mod local;
pub mod object_store;
pub mod supabase;

pub use document_table::DocumentTable;
pub use object_store::ObjectStore;
