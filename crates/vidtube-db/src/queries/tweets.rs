use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use vidtube_types::models::Tweet;

use crate::models::{TWEET_COLUMNS, now, tweet_from_row};
use crate::queries::{guard_owned, user_exists};
use crate::{Database, StoreError};

impl Database {
    pub fn create_tweet(&self, owner_id: Uuid, content: &str) -> Result<Tweet, StoreError> {
        let id = Uuid::new_v4();
        self.with_conn_mut(|conn| {
            let ts = now();
            conn.execute(
                "INSERT INTO tweets (id, owner_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                rusqlite::params![id.to_string(), owner_id.to_string(), content, ts],
            )
            .map_err(StoreError::from_owner_insert)?;
            load_tweet(conn, id)?.ok_or(StoreError::NotFound("tweet"))
        })
    }

    pub fn get_tweet(&self, id: Uuid) -> Result<Option<Tweet>, StoreError> {
        self.with_conn(|conn| load_tweet(conn, id))
    }

    pub fn user_tweets(&self, owner_id: Uuid) -> Result<Vec<Tweet>, StoreError> {
        self.with_conn(|conn| {
            if !user_exists(conn, owner_id)? {
                return Err(StoreError::NotFound("user"));
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM tweets WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC",
                TWEET_COLUMNS
            ))?;
            let rows = stmt
                .query_map([owner_id.to_string()], tweet_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_tweet(
        &self,
        id: Uuid,
        acting_user: Uuid,
        content: Option<&str>,
    ) -> Result<Tweet, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = guard_owned(load_tweet(&tx, id)?, "tweet", acting_user)?;
            tx.execute(
                "UPDATE tweets SET content = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id.to_string(), content.unwrap_or(&current.content), now()],
            )?;
            let updated = load_tweet(&tx, id)?.ok_or(StoreError::NotFound("tweet"))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Likes pointing at the tweet are left in place.
    pub fn delete_tweet(&self, id: Uuid, acting_user: Uuid) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            guard_owned(load_tweet(&tx, id)?, "tweet", acting_user)?;
            tx.execute("DELETE FROM tweets WHERE id = ?1", [id.to_string()])?;
            tx.commit()?;
            Ok(())
        })
    }
}

fn load_tweet(conn: &Connection, id: Uuid) -> Result<Option<Tweet>, StoreError> {
    let tweet = conn
        .query_row(
            &format!("SELECT {} FROM tweets WHERE id = ?1", TWEET_COLUMNS),
            [id.to_string()],
            tweet_from_row,
        )
        .optional()?;
    Ok(tweet)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use vidtube_types::models::TargetKind;

    use crate::StoreError;
    use crate::queries::fixtures;

    #[test]
    fn test_tweet_lifecycle() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a");
        let b = fixtures::user(&db, "b");

        let t = db.create_tweet(a.id, "first").unwrap();
        assert_eq!(db.user_tweets(a.id).unwrap(), vec![t.clone()]);

        let err = db.update_tweet(t.id, b.id, Some("hijack")).unwrap_err();
        assert!(matches!(err, StoreError::NotOwner));
        assert_eq!(db.get_tweet(t.id).unwrap().unwrap().content, "first");

        let updated = db.update_tweet(t.id, a.id, Some("edited")).unwrap();
        assert_eq!(updated.content, "edited");
        assert_eq!(updated.created_at, t.created_at);

        assert!(matches!(db.delete_tweet(t.id, b.id), Err(StoreError::NotOwner)));
        db.delete_tweet(t.id, a.id).unwrap();
        assert!(db.get_tweet(t.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_leaves_orphaned_likes() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a");
        let b = fixtures::user(&db, "b");
        let t = db.create_tweet(a.id, "liked").unwrap();
        db.toggle_relation(b.id, t.id, TargetKind::Tweet).unwrap();

        db.delete_tweet(t.id, a.id).unwrap();
        assert_eq!(db.count_relations_to(t.id, TargetKind::Tweet).unwrap(), 1);
        // The orphan never shows up in the liker's breakdown.
        assert!(db.like_breakdown(b.id).unwrap().tweet_likes.is_empty());
    }

    #[test]
    fn test_create_by_unknown_user_is_invalid_subject() {
        let db = fixtures::db();
        let owner = fixtures::user(&db, "owner");
        let video = fixtures::video(&db, owner.id, "clip", 0);
        let ghost = Uuid::new_v4();

        assert!(matches!(db.create_tweet(ghost, "hi"), Err(StoreError::InvalidSubject)));
        assert!(matches!(
            db.create_playlist(ghost, "Favorites", ""),
            Err(StoreError::InvalidSubject)
        ));
        assert!(matches!(
            db.create_comment(ghost, video.id, "nice"),
            Err(StoreError::InvalidSubject)
        ));
        assert!(db.user_tweets(owner.id).unwrap().is_empty());
    }
}
