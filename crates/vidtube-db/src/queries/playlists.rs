use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use vidtube_types::models::Playlist;

use crate::models::{now, timestamp_at, uuid_at};
use crate::queries::{guard_owned, user_exists};
use crate::{Database, StoreError};

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";

impl Database {
    pub fn create_playlist(
        &self,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Playlist, StoreError> {
        let id = Uuid::new_v4();
        self.with_conn_mut(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO playlists (id, owner_id, name, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id.to_string(), owner_id.to_string(), name, description, ts],
            )
            .map_err(StoreError::from_owner_insert)?;
            load_playlist(conn, id)?.ok_or(StoreError::NotFound("playlist"))
        })
    }

    pub fn get_playlist(&self, id: Uuid) -> Result<Option<Playlist>, StoreError> {
        self.with_conn(|conn| load_playlist(conn, id))
    }

    pub fn user_playlists(&self, owner_id: Uuid) -> Result<Vec<Playlist>, StoreError> {
        self.with_conn(|conn| {
            if !user_exists(conn, owner_id)? {
                return Err(StoreError::NotFound("user"));
            }
            let mut stmt = conn.prepare(
                "SELECT id FROM playlists WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )?;
            let ids = stmt
                .query_map([owner_id.to_string()], |row| uuid_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut playlists = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(playlist) = load_playlist(conn, id)? {
                    playlists.push(playlist);
                }
            }
            Ok(playlists)
        })
    }

    pub fn update_playlist(
        &self,
        id: Uuid,
        acting_user: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = guard_owned(load_playlist(&tx, id)?, "playlist", acting_user)?;

            tx.execute(
                "UPDATE playlists SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
                rusqlite::params![
                    id.to_string(),
                    name.unwrap_or(&current.name),
                    description.unwrap_or(&current.description),
                    now(),
                ],
            )?;
            let updated = load_playlist(&tx, id)?.ok_or(StoreError::NotFound("playlist"))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    pub fn delete_playlist(&self, id: Uuid, acting_user: Uuid) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            guard_owned(load_playlist(&tx, id)?, "playlist", acting_user)?;
            tx.execute("DELETE FROM playlists WHERE id = ?1", [id.to_string()])?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Appends a video. Fails with `AlreadyPresent` if it is already a member.
    pub fn add_playlist_video(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
        acting_user: Uuid,
    ) -> Result<Playlist, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            guard_owned(load_playlist(&tx, playlist_id)?, "playlist", acting_user)?;
            if super::videos::load_video(&tx, video_id)?.is_none() {
                return Err(StoreError::NotFound("video"));
            }

            let added = tx.execute(
                "INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id, position)
                 SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1
                 FROM playlist_videos WHERE playlist_id = ?1",
                rusqlite::params![playlist_id.to_string(), video_id.to_string()],
            )?;
            if added == 0 {
                return Err(StoreError::AlreadyPresent);
            }

            touch(&tx, playlist_id)?;
            let updated = load_playlist(&tx, playlist_id)?.ok_or(StoreError::NotFound("playlist"))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Removes a member video. Fails with `NotPresent` if it is not a member.
    pub fn remove_playlist_video(
        &self,
        playlist_id: Uuid,
        video_id: Uuid,
        acting_user: Uuid,
    ) -> Result<Playlist, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            guard_owned(load_playlist(&tx, playlist_id)?, "playlist", acting_user)?;

            let removed = tx.execute(
                "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
                rusqlite::params![playlist_id.to_string(), video_id.to_string()],
            )?;
            if removed == 0 {
                return Err(StoreError::NotPresent);
            }

            touch(&tx, playlist_id)?;
            let updated = load_playlist(&tx, playlist_id)?.ok_or(StoreError::NotFound("playlist"))?;
            tx.commit()?;
            Ok(updated)
        })
    }
}

fn touch(conn: &Connection, playlist_id: Uuid) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE playlists SET updated_at = ?2 WHERE id = ?1",
        rusqlite::params![playlist_id.to_string(), now()],
    )?;
    Ok(())
}

fn load_playlist(conn: &Connection, id: Uuid) -> Result<Option<Playlist>, StoreError> {
    let playlist = conn
        .query_row(
            &format!("SELECT {} FROM playlists WHERE id = ?1", PLAYLIST_COLUMNS),
            [id.to_string()],
            |row| {
                Ok(Playlist {
                    id: uuid_at(row, 0)?,
                    owner_id: uuid_at(row, 1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    videos: Vec::new(),
                    created_at: timestamp_at(row, 4)?,
                    updated_at: timestamp_at(row, 5)?,
                })
            },
        )
        .optional()?;

    let Some(mut playlist) = playlist else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT video_id FROM playlist_videos WHERE playlist_id = ?1 ORDER BY position",
    )?;
    playlist.videos = stmt
        .query_map([id.to_string()], |row| uuid_at(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Some(playlist))
}
