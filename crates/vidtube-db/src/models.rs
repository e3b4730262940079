//! Row mappers between SQLite rows and the shared domain types.
//! Column order for each mapper is fixed by the matching `*_COLUMNS` constant.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use vidtube_types::models::{
    Comment, MediaAsset, Profile, ProfileFields, Relation, TargetKind, Tweet, User, Video,
};

pub const USER_COLUMNS: &str = "id, username, full_name, avatar, created_at";

pub const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_public_id, video_url, \
     thumbnail_public_id, thumbnail_url, duration, views, is_published, created_at, updated_at";

pub const TWEET_COLUMNS: &str = "id, owner_id, content, created_at, updated_at";

pub const COMMENT_COLUMNS: &str = "id, owner_id, video_id, content, created_at, updated_at";

pub const RELATION_COLUMNS: &str = "id, subject_id, target_id, target_kind, created_at";

/// Fields for a new video row. Media descriptors come from the media service untouched.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    pub duration: f64,
    pub is_published: bool,
}

/// Partial update for a video; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaAsset>,
}

/// Timestamps are stored as fixed-width RFC 3339 text so they sort lexically.
pub fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now() -> String {
    timestamp(Utc::now())
}

pub fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn kind_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<TargetKind> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    user_at(row, 0)
}

/// Reads `USER_COLUMNS` starting at `offset`, for joins that prefix other columns.
pub fn user_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, offset)?,
        username: row.get(offset + 1)?,
        full_name: row.get(offset + 2)?,
        avatar: row.get(offset + 3)?,
        created_at: timestamp_at(row, offset + 4)?,
    })
}

pub fn profile_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Profile> {
    user_at(row, offset).map(Profile::from)
}

pub fn profile_fields_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<ProfileFields> {
    Ok(ProfileFields {
        username: row.get(offset)?,
        full_name: row.get(offset + 1)?,
        avatar: row.get(offset + 2)?,
    })
}

pub fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    video_at(row, 0)
}

pub fn video_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Video> {
    Ok(Video {
        id: uuid_at(row, offset)?,
        owner_id: uuid_at(row, offset + 1)?,
        title: row.get(offset + 2)?,
        description: row.get(offset + 3)?,
        video_file: MediaAsset {
            public_id: row.get(offset + 4)?,
            url: row.get(offset + 5)?,
        },
        thumbnail: MediaAsset {
            public_id: row.get(offset + 6)?,
            url: row.get(offset + 7)?,
        },
        duration: row.get(offset + 8)?,
        views: row.get(offset + 9)?,
        is_published: row.get(offset + 10)?,
        created_at: timestamp_at(row, offset + 11)?,
        updated_at: timestamp_at(row, offset + 12)?,
    })
}

pub fn tweet_from_row(row: &Row<'_>) -> rusqlite::Result<Tweet> {
    tweet_at(row, 0)
}

pub fn tweet_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        id: uuid_at(row, offset)?,
        owner_id: uuid_at(row, offset + 1)?,
        content: row.get(offset + 2)?,
        created_at: timestamp_at(row, offset + 3)?,
        updated_at: timestamp_at(row, offset + 4)?,
    })
}

pub fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    comment_at(row, 0)
}

pub fn comment_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_at(row, offset)?,
        owner_id: uuid_at(row, offset + 1)?,
        video_id: uuid_at(row, offset + 2)?,
        content: row.get(offset + 3)?,
        created_at: timestamp_at(row, offset + 4)?,
        updated_at: timestamp_at(row, offset + 5)?,
    })
}

pub fn relation_from_row(row: &Row<'_>) -> rusqlite::Result<Relation> {
    Ok(Relation {
        id: uuid_at(row, 0)?,
        subject_id: uuid_at(row, 1)?,
        target_id: uuid_at(row, 2)?,
        target_kind: kind_at(row, 3)?,
        created_at: timestamp_at(row, 4)?,
    })
}

/// Prefixes each column of a `*_COLUMNS` list with a table alias.
pub fn qualified(alias: &str, columns: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_columns() {
        assert_eq!(
            qualified("t", TWEET_COLUMNS),
            "t.id, t.owner_id, t.content, t.created_at, t.updated_at"
        );
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let a = Utc::now();
        let b = a + chrono::Duration::microseconds(1);
        assert!(timestamp(a) < timestamp(b));
        assert_eq!(timestamp(a).len(), timestamp(b).len());
    }
}
