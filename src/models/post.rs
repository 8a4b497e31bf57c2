//! Post model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a post.
///
/// The backend sends ids as either numbers or strings; both normalise to
/// the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Users share the backend's id encoding with posts.
pub type UserId = PostId;

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for PostId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// Moderation status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The user who submitted a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Category a post was filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCategory {
    pub id: i64,
    pub name: String,
}

/// A submitted video as returned by the Talynk API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Media reference, relative to the media base URL unless absolute.
    #[serde(alias = "video_url")]
    pub video_url: String,

    pub status: PostStatus,

    pub user: PostAuthor,

    #[serde(default, alias = "approver_id")]
    pub approver_id: Option<UserId>,

    #[serde(default, alias = "admin_id")]
    pub admin_id: Option<UserId>,

    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,

    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "reviewed_at")]
    pub reviewed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub views: u64,

    #[serde(default)]
    pub likes: u64,

    #[serde(default)]
    pub shares: u64,

    #[serde(default, alias = "category_id")]
    pub category_id: Option<i64>,

    #[serde(default)]
    pub category: Option<PostCategory>,
}

impl Post {
    /// Whether the post is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        self.status == PostStatus::Pending
    }

    /// DOM element id of the post's queue card.
    pub fn element_id(&self) -> String {
        format!("post-{}", self.id)
    }

    /// Resolve the media reference against `media_base_url`.
    pub fn media_url(&self, media_base_url: &str) -> String {
        resolve_media_url(media_base_url, &self.video_url)
    }
}

/// Join a media reference onto a base URL.
///
/// Absolute `http(s)` references are returned unchanged.
pub fn resolve_media_url(media_base_url: &str, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return reference.to_string();
    }

    let base = media_base_url.trim_end_matches('/');
    let path = reference.trim_start_matches('/');
    if base.is_empty() {
        format!("/{}", path)
    } else {
        format!("{}/{}", base, path)
    }
}
