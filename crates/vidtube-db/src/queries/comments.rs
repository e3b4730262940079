use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use vidtube_types::models::{Comment, CommentWithAuthor};
use vidtube_types::query::Page;

use crate::models::{
    COMMENT_COLUMNS, USER_COLUMNS, comment_at, comment_from_row, now, profile_at, qualified,
};
use crate::queries::guard_owned;
use crate::{Database, StoreError};

impl Database {
    pub fn create_comment(
        &self,
        owner_id: Uuid,
        video_id: Uuid,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let id = Uuid::new_v4();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            if super::videos::load_video(&tx, video_id)?.is_none() {
                return Err(StoreError::NotFound("video"));
            }
            let ts = now();
            tx.execute(
                "INSERT INTO comments (id, owner_id, video_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![
                    id.to_string(),
                    owner_id.to_string(),
                    video_id.to_string(),
                    content,
                    ts
                ],
            )
            .map_err(StoreError::from_owner_insert)?;
            let comment = load_comment(&tx, id)?.ok_or(StoreError::NotFound("comment"))?;
            tx.commit()?;
            Ok(comment)
        })
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        self.with_conn(|conn| load_comment(conn, id))
    }

    /// A page of a video's comments, oldest first, each with its author's profile.
    pub fn video_comments(
        &self,
        video_id: Uuid,
        page: Page,
    ) -> Result<Vec<CommentWithAuthor>, StoreError> {
        self.with_conn(|conn| {
            if super::videos::load_video(conn, video_id)?.is_none() {
                return Err(StoreError::NotFound("video"));
            }
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, {} FROM comments c
                 JOIN users u ON u.id = c.owner_id
                 WHERE c.video_id = ?1
                 ORDER BY c.created_at ASC, c.rowid ASC
                 LIMIT ?2 OFFSET ?3",
                qualified("c", COMMENT_COLUMNS),
                qualified("u", USER_COLUMNS)
            ))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![video_id.to_string(), page.limit, page.offset()],
                    |row| {
                        Ok(CommentWithAuthor {
                            comment: comment_at(row, 0)?,
                            owner: profile_at(row, 6)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_comment(
        &self,
        id: Uuid,
        acting_user: Uuid,
        content: Option<&str>,
    ) -> Result<Comment, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = guard_owned(load_comment(&tx, id)?, "comment", acting_user)?;
            tx.execute(
                "UPDATE comments SET content = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![id.to_string(), content.unwrap_or(&current.content), now()],
            )?;
            let updated = load_comment(&tx, id)?.ok_or(StoreError::NotFound("comment"))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Likes pointing at the comment are left in place.
    pub fn delete_comment(&self, id: Uuid, acting_user: Uuid) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            guard_owned(load_comment(&tx, id)?, "comment", acting_user)?;
            tx.execute("DELETE FROM comments WHERE id = ?1", [id.to_string()])?;
            tx.commit()?;
            Ok(())
        })
    }
}

fn load_comment(conn: &Connection, id: Uuid) -> Result<Option<Comment>, StoreError> {
    let comment = conn
        .query_row(
            &format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLUMNS),
            [id.to_string()],
            comment_from_row,
        )
        .optional()?;
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use vidtube_types::query::Page;

    use crate::StoreError;
    use crate::queries::fixtures;

    #[test]
    fn test_comment_requires_video() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a");
        let err = db.create_comment(a.id, Uuid::new_v4(), "hi").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("video")));
    }

    #[test]
    fn test_video_comments_paged_with_author() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a");
        let b = fixtures::user(&db, "b");
        let v = fixtures::video(&db, a.id, "v", 0);

        for i in 0..5 {
            let author = if i % 2 == 0 { a.id } else { b.id };
            db.create_comment(author, v.id, &format!("c{}", i)).unwrap();
        }

        let first = db.video_comments(v.id, Page::new(Some(1), Some(2))).unwrap();
        let contents: Vec<_> = first.iter().map(|c| c.comment.content.as_str()).collect();
        assert_eq!(contents, vec!["c0", "c1"]);
        assert_eq!(first[1].owner.username, "b");

        let last = db.video_comments(v.id, Page::new(Some(3), Some(2))).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].comment.content, "c4");
    }

    #[test]
    fn test_comment_owner_guard() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a");
        let b = fixtures::user(&db, "b");
        let v = fixtures::video(&db, b.id, "v", 0);
        let c = db.create_comment(a.id, v.id, "mine").unwrap();

        // Owning the video does not grant rights over other people's comments.
        assert!(matches!(db.update_comment(c.id, b.id, Some("x")), Err(StoreError::NotOwner)));
        assert!(matches!(db.delete_comment(c.id, b.id), Err(StoreError::NotOwner)));
        assert_eq!(db.get_comment(c.id).unwrap().unwrap(), c);

        assert_eq!(db.update_comment(c.id, a.id, Some("edit")).unwrap().content, "edit");
        db.delete_comment(c.id, a.id).unwrap();
        assert!(db.get_comment(c.id).unwrap().is_none());
    }
}
