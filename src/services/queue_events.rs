//! Review queue event types.
//!
//! These events are emitted by the review queue engine so the host shell
//! can re-render, show toasts, and scroll the selected card into view.

use crate::models::{Decision, PostId};
use serde::Serialize;
use std::time::Duration;

/// Event emitted by the review queue engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    /// The queue snapshot changed; re-read it via the handle.
    StateChanged,

    /// Show a transient notification.
    Notify(Notification),

    /// Scroll the card with `element_id` into view and highlight it.
    FocusPost {
        post_id: PostId,
        element_id: String,
        #[serde(with = "duration_millis")]
        highlight: Duration,
    },

    /// The temporary highlight on a post ended.
    HighlightCleared { post_id: PostId },
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient, non-blocking notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// More posts are waiting than before the last refresh.
    NewPending { count: usize },

    /// A decision was accepted by the backend.
    DecisionApplied { post_id: PostId, decision: Decision },

    /// A decision was rejected by the backend.
    DecisionFailed { post_id: PostId, message: String },

    /// The selected post is not in the current pending set.
    NotInPendingList { post_id: PostId },

    /// A request failed because the session is no longer valid.
    SessionExpired,

    /// The queue refresh failed.
    FetchFailed { message: String },
}

impl Notification {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::NewPending { .. } | Self::NotInPendingList { .. } => NoticeLevel::Info,
            Self::DecisionApplied { .. } => NoticeLevel::Success,
            Self::DecisionFailed { .. } | Self::SessionExpired | Self::FetchFailed { .. } => {
                NoticeLevel::Error
            }
        }
    }

    /// User-facing text.
    pub fn message(&self) -> String {
        match self {
            Self::NewPending { count: 1 } => "1 pending video to review".to_string(),
            Self::NewPending { count } => format!("{} pending videos to review", count),
            Self::DecisionApplied { decision, .. } => match decision {
                Decision::Approved => "Post approved successfully".to_string(),
                Decision::Rejected { .. } => "Post rejected successfully".to_string(),
            },
            Self::DecisionFailed { message, .. } => format!("Failed to update post: {}", message),
            Self::NotInPendingList { .. } => "This post is not in the pending list".to_string(),
            Self::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            Self::FetchFailed { message } => format!("Failed to load pending posts: {}", message),
        }
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
