//! Read-time aggregation over relations and owned resources.
//! Nothing here is cached or stored; every call recomputes from the tables.

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use vidtube_types::models::{
    ChannelProfile, ChannelStats, LikeBreakdown, Liked, SubscriptionEntry, TargetKind,
};
use vidtube_types::query::SortOrder;

use crate::models::{
    COMMENT_COLUMNS, TWEET_COLUMNS, USER_COLUMNS, VIDEO_COLUMNS, comment_at, profile_at,
    profile_fields_at, qualified, timestamp_at, tweet_at, uuid_at, video_at,
};
use crate::queries::user_exists;
use crate::{Database, StoreError};

impl Database {
    /// Video, view, subscriber and like totals for a channel.
    /// A channel with nothing yields all zeros.
    pub fn channel_stats(&self, owner_id: Uuid) -> Result<ChannelStats, StoreError> {
        self.with_conn(|conn| {
            // One read transaction so all four counts come from the same snapshot.
            let tx = conn.unchecked_transaction()?;
            if !user_exists(&tx, owner_id)? {
                return Err(StoreError::InvalidChannel);
            }
            let owner = owner_id.to_string();

            let (video_count, total_view_count): (i64, i64) = tx.query_row(
                "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM videos WHERE owner_id = ?1",
                [&owner],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let subscriber_count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM relations r
                 JOIN users u ON u.id = r.subject_id
                 WHERE r.target_kind = ?2 AND r.target_id = ?1",
                rusqlite::params![&owner, TargetKind::Channel.as_str()],
                |row| row.get(0),
            )?;

            let like_count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM relations r
                 JOIN videos v ON v.id = r.target_id
                 WHERE r.target_kind = ?2 AND v.owner_id = ?1",
                rusqlite::params![&owner, TargetKind::Video.as_str()],
                |row| row.get(0),
            )?;

            tx.finish()?;
            Ok(ChannelStats {
                video_count,
                total_view_count,
                subscriber_count,
                like_count,
            })
        })
    }

    /// A channel looked up by username, with both subscription counts and
    /// whether `viewer` is subscribed to it.
    pub fn channel_profile(
        &self,
        username: &str,
        viewer: Uuid,
    ) -> Result<ChannelProfile, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let profile = tx
                .query_row(
                    &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                    [username],
                    |row| profile_at(row, 0),
                )
                .optional()?
                .ok_or(StoreError::InvalidChannel)?;

            let (subscribers_count, channels_subscribed_to_count, is_subscribed): (i64, i64, bool) =
                tx.query_row(
                    "SELECT
                        (SELECT COUNT(*) FROM relations r JOIN users u ON u.id = r.subject_id
                          WHERE r.target_kind = ?2 AND r.target_id = ?1),
                        (SELECT COUNT(*) FROM relations r JOIN users u ON u.id = r.target_id
                          WHERE r.target_kind = ?2 AND r.subject_id = ?1),
                        EXISTS (SELECT 1 FROM relations
                          WHERE target_kind = ?2 AND target_id = ?1 AND subject_id = ?3)",
                    rusqlite::params![
                        profile.id.to_string(),
                        TargetKind::Channel.as_str(),
                        viewer.to_string()
                    ],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?;

            tx.finish()?;
            Ok(ChannelProfile {
                profile,
                subscribers_count,
                channels_subscribed_to_count,
                is_subscribed,
            })
        })
    }

    /// Everything a user has liked, grouped by target kind, most recent like first.
    /// Likes whose target has since been deleted are skipped.
    pub fn like_breakdown(&self, user_id: Uuid) -> Result<LikeBreakdown, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            if !user_exists(&tx, user_id)? {
                return Err(StoreError::NotFound("user"));
            }
            let subject = user_id.to_string();

            let video_likes = liked(&tx, &subject, TargetKind::Video, "videos", VIDEO_COLUMNS, |row| {
                video_at(row, 1)
            })?;
            let tweet_likes = liked(&tx, &subject, TargetKind::Tweet, "tweets", TWEET_COLUMNS, |row| {
                tweet_at(row, 1)
            })?;
            let comment_likes =
                liked(&tx, &subject, TargetKind::Comment, "comments", COMMENT_COLUMNS, |row| {
                    comment_at(row, 1)
                })?;

            tx.finish()?;
            Ok(LikeBreakdown {
                video_likes,
                tweet_likes,
                comment_likes,
            })
        })
    }

    /// Users subscribed to a channel, ordered by subscription time.
    pub fn subscriber_list(
        &self,
        channel_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<SubscriptionEntry>, StoreError> {
        self.with_conn(|conn| {
            if !user_exists(conn, channel_id)? {
                return Err(StoreError::InvalidChannel);
            }
            subscriptions(conn, "r.target_id", "r.subject_id", channel_id, order)
        })
    }

    /// Channels a user is subscribed to, ordered by subscription time.
    pub fn subscribed_channels(
        &self,
        subscriber_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<SubscriptionEntry>, StoreError> {
        self.with_conn(|conn| {
            if !user_exists(conn, subscriber_id)? {
                return Err(StoreError::NotFound("user"));
            }
            subscriptions(conn, "r.subject_id", "r.target_id", subscriber_id, order)
        })
    }
}

fn liked<T>(
    conn: &Connection,
    subject: &str,
    kind: TargetKind,
    table: &'static str,
    columns: &'static str,
    map: impl Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<Liked<T>>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT r.created_at, {} FROM relations r
         JOIN {} t ON t.id = r.target_id
         WHERE r.subject_id = ?1 AND r.target_kind = ?2
         ORDER BY r.created_at DESC, r.rowid DESC",
        qualified("t", columns),
        table
    ))?;
    let rows = stmt
        .query_map(rusqlite::params![subject, kind.as_str()], |row| {
            Ok(Liked {
                liked_at: timestamp_at(row, 0)?,
                item: map(row)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Joins channel edges to the user on the `joined` side of the edge.
fn subscriptions(
    conn: &Connection,
    anchor: &'static str,
    joined: &'static str,
    id: Uuid,
    order: SortOrder,
) -> Result<Vec<SubscriptionEntry>, StoreError> {
    let dir = order.keyword();
    let mut stmt = conn.prepare(&format!(
        "SELECT u.id, u.username, u.full_name, u.avatar, r.created_at
         FROM relations r
         JOIN users u ON u.id = {}
         WHERE {} = ?1 AND r.target_kind = ?2
         ORDER BY r.created_at {}, r.rowid {}",
        joined, anchor, dir, dir
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![id.to_string(), TargetKind::Channel.as_str()],
            |row| {
                Ok(SubscriptionEntry {
                    user_id: uuid_at(row, 0)?,
                    profile: profile_fields_at(row, 1)?,
                    subscribed_at: timestamp_at(row, 4)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
