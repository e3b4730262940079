use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use vidtube_types::models::{MediaAsset, Video, Watched};
use vidtube_types::query::{Page, VideoListQuery};

use crate::models::{
    NewVideo, VIDEO_COLUMNS, VideoChanges, now, profile_fields_at, qualified, timestamp_at,
    video_at, video_from_row,
};
use crate::queries::{guard_owned, user_exists};
use crate::{Database, StoreError};

impl Database {
    pub fn insert_video(&self, owner_id: Uuid, new: NewVideo) -> Result<Video, StoreError> {
        let id = Uuid::new_v4();
        self.with_conn_mut(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO videos (id, owner_id, title, description, video_public_id, video_url,
                                     thumbnail_public_id, thumbnail_url, duration, is_published,
                                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                rusqlite::params![
                    id.to_string(),
                    owner_id.to_string(),
                    new.title,
                    new.description,
                    new.video_file.public_id,
                    new.video_file.url,
                    new.thumbnail.public_id,
                    new.thumbnail.url,
                    new.duration,
                    new.is_published,
                    ts,
                ],
            )
            .map_err(StoreError::from_owner_insert)?;
            load_video(conn, id)?.ok_or(StoreError::NotFound("video"))
        })
    }

    pub fn get_video(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        self.with_conn(|conn| load_video(conn, id))
    }

    /// Counts a view by `viewer` and returns the updated record, or `None` when
    /// the video is missing or unpublished and not owned by the viewer. The
    /// visibility check, the counter bump and the history entry commit together.
    pub fn record_view(&self, id: Uuid, viewer: Uuid) -> Result<Option<Video>, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let video = tx
                .query_row(
                    &format!(
                        "UPDATE videos SET views = views + 1
                         WHERE id = ?1 AND (is_published = 1 OR owner_id = ?2)
                         RETURNING {}",
                        VIDEO_COLUMNS
                    ),
                    [id.to_string(), viewer.to_string()],
                    video_from_row,
                )
                .optional()?;
            let Some(video) = video else {
                return Ok(None);
            };

            tx.execute(
                "INSERT INTO watch_history (user_id, video_id, watched_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = excluded.watched_at",
                rusqlite::params![viewer.to_string(), id.to_string(), now()],
            )
            .map_err(StoreError::from_owner_insert)?;
            tx.commit()?;
            Ok(Some(video))
        })
    }

    /// Videos a user has watched, most recent first, each with its owner's profile.
    /// Videos unpublished since are listed only when the user owns them.
    pub fn watch_history(&self, user_id: Uuid) -> Result<Vec<Watched>, StoreError> {
        self.with_conn(|conn| {
            if !user_exists(conn, user_id)? {
                return Err(StoreError::NotFound("user"));
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT h.watched_at, {}, u.username, u.full_name, u.avatar
                 FROM watch_history h
                 JOIN videos v ON v.id = h.video_id
                 JOIN users u ON u.id = v.owner_id
                 WHERE h.user_id = ?1 AND (v.is_published = 1 OR v.owner_id = ?1)
                 ORDER BY h.watched_at DESC, h.rowid DESC",
                qualified("v", VIDEO_COLUMNS)
            ))?;
            let rows = stmt
                .query_map([user_id.to_string()], |row| {
                    Ok(Watched {
                        watched_at: timestamp_at(row, 0)?,
                        video: video_at(row, 1)?,
                        owner: profile_fields_at(row, 14)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Applies the provided fields. Returns the updated video and, when the
    /// thumbnail was replaced, the previous descriptor so the caller can
    /// release it from media storage.
    pub fn update_video(
        &self,
        id: Uuid,
        acting_user: Uuid,
        changes: VideoChanges,
    ) -> Result<(Video, Option<MediaAsset>), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = guard_owned(load_video(&tx, id)?, "video", acting_user)?;

            let title = changes.title.unwrap_or(current.title);
            let description = changes.description.unwrap_or(current.description);
            let (thumbnail, replaced) = match changes.thumbnail {
                Some(new_thumb) if new_thumb != current.thumbnail => {
                    (new_thumb, Some(current.thumbnail))
                }
                _ => (current.thumbnail, None),
            };

            tx.execute(
                "UPDATE videos
                 SET title = ?2, description = ?3, thumbnail_public_id = ?4, thumbnail_url = ?5,
                     updated_at = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    id.to_string(),
                    title,
                    description,
                    thumbnail.public_id,
                    thumbnail.url,
                    now(),
                ],
            )?;
            let updated = load_video(&tx, id)?.ok_or(StoreError::NotFound("video"))?;
            tx.commit()?;
            Ok((updated, replaced))
        })
    }

    /// Removes the video and returns the removed record.
    pub fn delete_video(&self, id: Uuid, acting_user: Uuid) -> Result<Video, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let video = guard_owned(load_video(&tx, id)?, "video", acting_user)?;
            tx.execute("DELETE FROM videos WHERE id = ?1", [id.to_string()])?;
            tx.commit()?;
            Ok(video)
        })
    }

    pub fn toggle_publish(&self, id: Uuid, acting_user: Uuid) -> Result<Video, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            guard_owned(load_video(&tx, id)?, "video", acting_user)?;
            let video = tx.query_row(
                &format!(
                    "UPDATE videos SET is_published = NOT is_published, updated_at = ?2
                     WHERE id = ?1 RETURNING {}",
                    VIDEO_COLUMNS
                ),
                rusqlite::params![id.to_string(), now()],
                video_from_row,
            )?;
            tx.commit()?;
            Ok(video)
        })
    }

    /// Published videos filtered by owner and text, in the requested order.
    pub fn list_videos(&self, query: &VideoListQuery) -> Result<Vec<Video>, StoreError> {
        let page = Page::new(query.page, query.limit);
        let pattern = query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));
        let order = query.sort_type.keyword();

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM videos
                 WHERE is_published = 1
                   AND (?1 IS NULL OR owner_id = ?1)
                   AND (?2 IS NULL OR title LIKE ?2 ESCAPE '\\' OR description LIKE ?2 ESCAPE '\\')
                 ORDER BY {} {}, rowid {}
                 LIMIT ?3 OFFSET ?4",
                VIDEO_COLUMNS,
                query.sort_by.column(),
                order,
                order
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![
                        query.user_id.map(|u| u.to_string()),
                        pattern,
                        page.limit,
                        page.offset(),
                    ],
                    video_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Every video a channel owns, published or not, newest first.
    pub fn channel_videos(&self, owner_id: Uuid) -> Result<Vec<Video>, StoreError> {
        self.with_conn(|conn| {
            if !user_exists(conn, owner_id)? {
                return Err(StoreError::InvalidChannel);
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM videos WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC",
                VIDEO_COLUMNS
            ))?;
            let rows = stmt
                .query_map([owner_id.to_string()], video_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn load_video(conn: &Connection, id: Uuid) -> Result<Option<Video>, StoreError> {
    let video = conn
        .query_row(
            &format!("SELECT {} FROM videos WHERE id = ?1", VIDEO_COLUMNS),
            [id.to_string()],
            video_from_row,
        )
        .optional()?;
    Ok(video)
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
