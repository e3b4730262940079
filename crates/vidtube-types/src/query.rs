use serde::Deserialize;
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Sortable columns for video listings. Anything else is rejected at deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoSortField {
    #[default]
    CreatedAt,
    Views,
    Title,
    Duration,
}

impl VideoSortField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Views => "views",
            Self::Title => "title",
            Self::Duration => "duration",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Page/limit pair with defaults applied and limit clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Row offset for this page. Widened to `i64` so any `u32` page stays in range.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Case-insensitive substring matched against title and description.
    pub query: Option<String>,
    #[serde(default)]
    pub sort_by: VideoSortField,
    #[serde(default)]
    pub sort_type: SortOrder,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Subscriber lists are ordered by relation creation time; only the direction varies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListQuery {
    #[serde(default)]
    pub order: SortOrder,
}
