use rusqlite::OptionalExtension;
use uuid::Uuid;

use vidtube_types::models::User;

use crate::models::{USER_COLUMNS, now, user_from_row};
use crate::{Database, StoreError};

impl Database {
    pub fn create_user(
        &self,
        username: &str,
        full_name: &str,
        avatar: Option<&str>,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let id = Uuid::new_v4();
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, full_name, avatar, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id.to_string(), username, full_name, avatar, password_hash, now()],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if StoreError::is_unique_violation(&e) => {
                    return Err(StoreError::Duplicate("username"));
                }
                Err(e) => return Err(e.into()),
            }

            let user = conn.query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                [id.to_string()],
                user_from_row,
            )?;
            Ok(user)
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.with_conn(|conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                    [id.to_string()],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
    }

    /// Changes the provided profile fields; `None` keeps the stored value.
    pub fn update_account(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<User, StoreError> {
        self.with_conn_mut(|conn| {
            let user = conn
                .query_row(
                    &format!(
                        "UPDATE users
                         SET full_name = COALESCE(?2, full_name), avatar = COALESCE(?3, avatar)
                         WHERE id = ?1 RETURNING {}",
                        USER_COLUMNS
                    ),
                    rusqlite::params![id.to_string(), full_name, avatar],
                    user_from_row,
                )
                .optional()?;
            user.ok_or(StoreError::InvalidSubject)
        })
    }

    pub fn password_hash(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        self.with_conn(|conn| {
            let hash = conn
                .query_row("SELECT password FROM users WHERE id = ?1", [id.to_string()], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(hash)
        })
    }

    pub fn set_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2 WHERE id = ?1",
                rusqlite::params![id.to_string(), password_hash],
            )?;
            if changed == 0 {
                return Err(StoreError::InvalidSubject);
            }
            Ok(())
        })
    }

    /// Returns the user together with the stored password hash.
    pub fn get_user_credentials(&self, username: &str) -> Result<Option<(User, String)>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {}, password FROM users WHERE username = ?1", USER_COLUMNS),
                    [username],
                    |row| Ok((user_from_row(row)?, row.get(5)?)),
                )
                .optional()?;
            Ok(row)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::StoreError;
    use crate::queries::fixtures;

    #[test]
    fn test_create_and_fetch_user() {
        let db = fixtures::db();
        let user = db.create_user("alice", "Alice A", Some("https://a/img.png"), "h").unwrap();
        let fetched = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched, user);

        let (by_name, hash) = db.get_user_credentials("alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(hash, "h");
    }

    #[test]
    fn test_duplicate_username() {
        let db = fixtures::db();
        fixtures::user(&db, "bob");
        let err = db.create_user("bob", "Other Bob", None, "h").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("username")));
    }

    #[test]
    fn test_update_account_and_password() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "carol");

        let updated = db.update_account(user.id, None, Some("https://a/new.png")).unwrap();
        assert_eq!(updated.full_name, user.full_name);
        assert_eq!(updated.avatar.as_deref(), Some("https://a/new.png"));

        db.set_password(user.id, "new-hash").unwrap();
        assert_eq!(db.password_hash(user.id).unwrap().as_deref(), Some("new-hash"));

        let ghost = uuid::Uuid::new_v4();
        assert!(matches!(db.update_account(ghost, Some("x"), None), Err(StoreError::InvalidSubject)));
        assert!(matches!(db.set_password(ghost, "h"), Err(StoreError::InvalidSubject)));
        assert!(db.password_hash(ghost).unwrap().is_none());
    }
}
