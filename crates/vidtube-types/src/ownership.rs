//! Single authorization rule for every owned resource: only the owner mutates.

use uuid::Uuid;

use crate::models::{Comment, Playlist, Tweet, Video};

/// Any record carrying an immutable owning-user reference.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Allow iff the acting user is the resource owner (compared by value).
pub fn authorize<R: Owned + ?Sized>(resource: &R, acting_user: Uuid) -> Decision {
    if resource.owner_id() == acting_user {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::NotOwner)
    }
}

impl Owned for Video {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Playlist {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Tweet {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tweet(owner: Uuid) -> Tweet {
        Tweet {
            id: Uuid::new_v4(),
            owner_id: owner,
            content: "hello".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_allowed() {
        let owner = Uuid::new_v4();
        assert_eq!(authorize(&tweet(owner), owner), Decision::Allow);
    }

    #[test]
    fn test_other_user_denied() {
        let t = tweet(Uuid::new_v4());
        let decision = authorize(&t, Uuid::new_v4());
        assert_eq!(decision, Decision::Deny(DenyReason::NotOwner));
        assert!(!decision.is_allowed());
    }

    #[test]
    fn test_compared_by_value() {
        let owner = Uuid::new_v4();
        // A separately parsed copy of the same id must still match.
        let copy: Uuid = owner.to_string().parse().unwrap();
        assert!(authorize(&tweet(owner), copy).is_allowed());
    }
}
