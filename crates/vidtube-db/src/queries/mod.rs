mod comments;
mod playlists;
mod relations;
mod stats;
mod tweets;
mod users;
mod videos;

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use vidtube_types::models::TargetKind;
use vidtube_types::ownership::{Decision, DenyReason, Owned, authorize};

use crate::StoreError;

/// Runs the ownership guard over a freshly loaded record.
/// Must be called inside the same writer transaction as the mutation it protects.
pub(crate) fn guard_owned<R: Owned>(
    loaded: Option<R>,
    entity: &'static str,
    acting_user: Uuid,
) -> Result<R, StoreError> {
    let resource = loaded.ok_or(StoreError::NotFound(entity))?;
    match authorize(&resource, acting_user) {
        Decision::Allow => Ok(resource),
        Decision::Deny(DenyReason::NotOwner) => Err(StoreError::NotOwner),
    }
}

pub(crate) fn user_exists(conn: &Connection, id: Uuid) -> Result<bool, StoreError> {
    exists(conn, "users", id)
}

/// Whether `id` resolves to an entity of the given kind. Channels are users.
pub(crate) fn target_exists(
    conn: &Connection,
    id: Uuid,
    kind: TargetKind,
) -> Result<bool, StoreError> {
    let table = match kind {
        TargetKind::Video => "videos",
        TargetKind::Comment => "comments",
        TargetKind::Tweet => "tweets",
        TargetKind::Channel => "users",
    };
    exists(conn, table, id)
}

fn exists(conn: &Connection, table: &'static str, id: Uuid) -> Result<bool, StoreError> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", table),
            [id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use uuid::Uuid;
    use vidtube_types::models::{MediaAsset, User, Video};

    use crate::Database;
    use crate::models::NewVideo;

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn user(db: &Database, username: &str) -> User {
        db.create_user(username, &format!("{} Full", username), None, "hash")
            .unwrap()
    }

    pub fn video(db: &Database, owner: Uuid, title: &str, views: i64) -> Video {
        let video = db
            .insert_video(
                owner,
                NewVideo {
                    title: title.into(),
                    description: format!("{} description", title),
                    video_file: MediaAsset {
                        public_id: format!("{}-file", title),
                        url: format!("https://media.test/{}.mp4", title),
                    },
                    thumbnail: MediaAsset {
                        public_id: format!("{}-thumb", title),
                        url: format!("https://media.test/{}.jpg", title),
                    },
                    duration: 12.5,
                    is_published: true,
                },
            )
            .unwrap();
        db.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE videos SET views = ?2 WHERE id = ?1",
                rusqlite::params![video.id.to_string(), views],
            )?;
            Ok(())
        })
        .unwrap();
        db.get_video(video.id).unwrap().unwrap()
    }
}
