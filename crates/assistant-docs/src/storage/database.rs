//! SQLite document table for the local backend

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{DocumentFilter, DocumentRecord, DocumentScope};

/// SQLite-based document table
pub struct DocumentDb {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#).map_err(|e| Error::database(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                filename TEXT NOT NULL,
                storage_path TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                mime_type TEXT NOT NULL,
                extracted_text TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_user_id ON documents(user_id);
            CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at);
        "#)
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

        tracing::debug!("Document table migrations complete");
        Ok(())
    }

    /// Insert a new record
    pub fn insert(&self, record: &DocumentRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO documents (
                id, user_id, filename, storage_path, file_size, mime_type,
                extracted_text, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.id.to_string(),
                record.user_id,
                record.filename,
                record.storage_path,
                record.file_size as i64,
                record.mime_type,
                record.extracted_text,
                format_timestamp(&record.created_at),
            ],
        ).map_err(|e| Error::database(format!("Failed to insert document: {}", e)))?;

        Ok(())
    }

    /// Get a record by ID
    pub fn get(&self, id: &Uuid) -> Result<Option<DocumentRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, user_id, filename, storage_path, file_size, mime_type, extracted_text, created_at
             FROM documents WHERE id = ?1"
        ).map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let record = stmt.query_row(params![id.to_string()], row_to_record)
            .optional()
            .map_err(|e| Error::database(format!("Failed to get document: {}", e)))?;

        Ok(record)
    }

    /// List records matching a filter, newest first
    pub fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>> {
        let conn = self.conn.lock();

        let mut sql = String::from(
            "SELECT id, user_id, filename, storage_path, file_size, mime_type, extracted_text, created_at
             FROM documents WHERE 1 = 1",
        );
        let mut values: Vec<Value> = Vec::new();

        match &filter.scope {
            Some(DocumentScope::User(user_id)) => {
                values.push(Value::Text(user_id.clone()));
                sql.push_str(&format!(" AND user_id = ?{}", values.len()));
            }
            Some(DocumentScope::Company) => sql.push_str(" AND user_id IS NULL"),
            None => {}
        }
        if let Some(mime_type) = &filter.mime_type {
            values.push(Value::Text(mime_type.clone()));
            sql.push_str(&format!(" AND mime_type = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC");
        if let Some(limit) = filter.limit {
            values.push(Value::Integer(limit as i64));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let mut stmt = conn.prepare(&sql)
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let records = stmt.query_map(params_from_iter(values.iter()), row_to_record)
            .map_err(|e| Error::database(format!("Failed to list documents: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::database(format!("Failed to read document row: {}", e)))?;

        Ok(records)
    }

    /// Store extracted text if none is stored yet
    ///
    /// Returns false when the record is missing or already has text.
    pub fn set_extracted_text(&self, id: &Uuid, text: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn.execute(
            "UPDATE documents SET extracted_text = ?1 WHERE id = ?2 AND extracted_text IS NULL",
            params![text, id.to_string()],
        ).map_err(|e| Error::database(format!("Failed to update extracted text: {}", e)))?;

        Ok(count > 0)
    }

    /// Delete a record
    pub fn delete(&self, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn.execute(
            "DELETE FROM documents WHERE id = ?1",
            params![id.to_string()],
        ).map_err(|e| Error::database(format!("Failed to delete document: {}", e)))?;

        Ok(count > 0)
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to count documents: {}", e)))?;

        Ok(total as usize)
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    // Fixed width so lexical order matches time order
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(7)?;

    Ok(DocumentRecord {
        id: Uuid::parse_str(&id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        user_id: row.get(1)?,
        filename: row.get(2)?,
        storage_path: row.get(3)?,
        file_size: row.get::<_, i64>(4)? as u64,
        mime_type: row.get(5)?,
        extracted_text: row.get(6)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
            })?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(scope: &DocumentScope, filename: &str, minutes_ago: i64) -> DocumentRecord {
        let mut record = DocumentRecord::new(
            Uuid::new_v4(),
            scope,
            filename,
            format!("{}/{}", scope.owner_segment(), filename),
            1234,
            "application/pdf",
            None,
        );
        record.created_at = Utc::now() - Duration::minutes(minutes_ago);
        record
    }

    #[test]
    fn test_insert_and_get() {
        let db = DocumentDb::in_memory().unwrap();
        let rec = record(&DocumentScope::User("alice".to_string()), "plan.pdf", 0);

        db.insert(&rec).unwrap();

        let fetched = db.get(&rec.id).unwrap().unwrap();
        assert_eq!(fetched.filename, "plan.pdf");
        assert_eq!(fetched.user_id.as_deref(), Some("alice"));
        assert_eq!(fetched.file_size, 1234);
        assert_eq!(fetched.created_at.timestamp_micros(), rec.created_at.timestamp_micros());
        assert!(db.get(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_filters_and_orders() {
        let db = DocumentDb::in_memory().unwrap();
        let alice = DocumentScope::User("alice".to_string());
        let bob = DocumentScope::User("bob".to_string());

        db.insert(&record(&alice, "old.pdf", 30)).unwrap();
        db.insert(&record(&alice, "new.pdf", 1)).unwrap();
        db.insert(&record(&bob, "bob.pdf", 5)).unwrap();
        db.insert(&record(&DocumentScope::Company, "handbook.pdf", 10)).unwrap();

        let alice_docs = db.list(&DocumentFilter::scope(alice)).unwrap();
        let names: Vec<_> = alice_docs.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["new.pdf", "old.pdf"]);

        let company = db.list(&DocumentFilter::scope(DocumentScope::Company)).unwrap();
        assert_eq!(company.len(), 1);
        assert_eq!(company[0].user_id, None);

        let all = db.list(&DocumentFilter::default()).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].filename, "new.pdf");

        let limited = db
            .list(&DocumentFilter {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_list_by_mime_type() {
        let db = DocumentDb::in_memory().unwrap();
        let scope = DocumentScope::Company;
        db.insert(&record(&scope, "a.pdf", 1)).unwrap();
        let mut image = record(&scope, "logo.png", 2);
        image.mime_type = "image/png".to_string();
        db.insert(&image).unwrap();

        let images = db
            .list(&DocumentFilter {
                mime_type: Some("image/png".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].filename, "logo.png");
    }

    #[test]
    fn test_extracted_text_set_at_most_once() {
        let db = DocumentDb::in_memory().unwrap();
        let rec = record(&DocumentScope::Company, "a.pdf", 0);
        db.insert(&rec).unwrap();

        assert!(db.set_extracted_text(&rec.id, "first").unwrap());
        assert!(!db.set_extracted_text(&rec.id, "second").unwrap());
        assert!(!db.set_extracted_text(&Uuid::new_v4(), "missing").unwrap());

        let fetched = db.get(&rec.id).unwrap().unwrap();
        assert_eq!(fetched.extracted_text.as_deref(), Some("first"));
    }

    #[test]
    fn test_delete() {
        let db = DocumentDb::in_memory().unwrap();
        let rec = record(&DocumentScope::Company, "a.pdf", 0);
        db.insert(&rec).unwrap();

        assert!(db.delete(&rec.id).unwrap());
        assert!(!db.delete(&rec.id).unwrap());
        assert_eq!(db.count().unwrap(), 0);
    }
}
