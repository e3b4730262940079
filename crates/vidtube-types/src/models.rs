use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Users --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user, embedded in list and join results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            avatar: user.avatar,
        }
    }
}

// -- Owned resources --

/// Descriptor returned by the media storage service. Passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub public_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    /// Member video ids in insertion order. No duplicates.
    pub videos: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub owner: Profile,
}

// -- Relations --

/// What a relation edge points at. Channels are identified by their owning user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Video,
    Comment,
    Tweet,
    Channel,
}

/// The engagement an edge records. Derived from the target kind, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Like,
    Subscription,
}

impl TargetKind {
    pub const ALL: [TargetKind; 4] = [
        TargetKind::Video,
        TargetKind::Comment,
        TargetKind::Tweet,
        TargetKind::Channel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Comment => "comment",
            Self::Tweet => "tweet",
            Self::Channel => "channel",
        }
    }

    pub fn relation_type(&self) -> RelationType {
        match self {
            Self::Channel => RelationType::Subscription,
            Self::Video | Self::Comment | Self::Tweet => RelationType::Like,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTargetKind(pub String);

impl fmt::Display for UnknownTargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown target kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownTargetKind {}

impl FromStr for TargetKind {
    type Err = UnknownTargetKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTargetKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub target_id: Uuid,
    pub target_kind: TargetKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Active,
    Inactive,
}

/// Result of flipping a relation. `relation` is the created edge when active,
/// the removed edge when inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub state: ToggleState,
    pub relation: Option<Relation>,
}

// -- Aggregates --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub video_count: i64,
    pub total_view_count: i64,
    pub subscriber_count: i64,
    pub like_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liked<T> {
    pub liked_at: DateTime<Utc>,
    #[serde(flatten)]
    pub item: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeBreakdown {
    pub video_likes: Vec<Liked<Video>>,
    pub tweet_likes: Vec<Liked<Tweet>>,
    pub comment_likes: Vec<Liked<Comment>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub profile: ProfileFields,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
}

/// A channel as seen by one viewer: the owner's profile, both subscription
/// counts, and whether the viewer subscribes to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// A watch-history entry with the video's owner attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watched {
    pub watched_at: DateTime<Utc>,
    #[serde(flatten)]
    pub video: Video,
    pub owner: ProfileFields,
}
