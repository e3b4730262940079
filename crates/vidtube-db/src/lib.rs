pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;

pub use error::StoreError;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

const READER_POOL_SIZE: usize = 4;

/// Document store on SQLite: one writer behind a mutex plus read-only readers.
/// Every mutation goes through the writer, so conditional writes are serialized.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(std::time::Duration::from_secs(5))?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Private in-memory database. Reads share the writer connection.
    pub fn open_in_memory() -> Result<Self> {
        let writer = Connection::open_in_memory()?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            reader_idx: AtomicUsize::new(0),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        if self.readers.is_empty() {
            let conn = self
                .writer
                .lock()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            return f(&conn);
        }

        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        f(&mut conn)
    }
}

#[cfg(test)]
mod tests {
    use vidtube_types::models::TargetKind;
    use vidtube_types::query::{Page, SortOrder};

    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn test_file_backed_readers_see_committed_writes() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("vidtube.db")).unwrap();
        let channel = fixtures::user(&db, "channel");
        let fan = fixtures::user(&db, "fan");
        let video = fixtures::video(&db, channel.id, "clip", 4);

        db.toggle_relation(fan.id, channel.id, TargetKind::Channel).unwrap();
        db.toggle_relation(fan.id, video.id, TargetKind::Video).unwrap();

        // Once per pooled reader.
        for _ in 0..READER_POOL_SIZE {
            let stats = db.channel_stats(channel.id).unwrap();
            assert_eq!(stats.video_count, 1);
            assert_eq!(stats.total_view_count, 4);
            assert_eq!(stats.subscriber_count, 1);
            assert_eq!(stats.like_count, 1);

            let subscribers = db.subscriber_list(channel.id, SortOrder::Desc).unwrap();
            assert_eq!(subscribers.len(), 1);
            assert_eq!(subscribers[0].user_id, fan.id);
        }
        assert_eq!(db.like_breakdown(fan.id).unwrap().video_likes.len(), 1);

        db.create_comment(fan.id, video.id, "first").unwrap();
        let last_page = Page::new(Some(u32::MAX), Some(100));
        for _ in 0..READER_POOL_SIZE {
            assert!(db.video_comments(video.id, last_page).unwrap().is_empty());
        }
        assert_eq!(db.video_comments(video.id, Page::default()).unwrap().len(), 1);

        db.toggle_relation(fan.id, channel.id, TargetKind::Channel).unwrap();
        assert_eq!(db.channel_stats(channel.id).unwrap().subscriber_count, 0);
    }
}
