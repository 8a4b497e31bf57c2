//! Review queue state.
//!
//! `QueueState` is the single reducer behind the approver review screen. It
//! is owned by the review queue engine task; every poll result, optimistic
//! removal and stats reconciliation goes through it in order.
//!
//! Ordering between concurrent flows is resolved with a version counter:
//! each fetch, stats refresh and decision draws the next version. A fetch
//! result is applied only if no newer fetch has already landed, and it can
//! never bring back a post whose decision is in flight or was settled after
//! that fetch was issued.

use crate::error::AppError;
use crate::models::{ApproverDashboardStats, Post, PostId};
use crate::services::queue_events::Notification;
use serde::Serialize;
use std::collections::HashMap;

/// Token identifying one pending-posts + stats fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Token identifying one stats-only refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatsTicket(u64);

/// What to do with an optimistically removed post when its decision fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Leave the post out of the list; the next poll shows it again.
    #[default]
    KeepRemoved,
    /// Put the post back where it was.
    Restore,
}

/// What the review screen should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum QueueView {
    Loading,
    Error { message: String },
    Empty,
    Ready,
}

/// A post taken out of the list ahead of its decision landing.
#[derive(Debug, Clone)]
pub struct RemovedPost {
    pub post: Post,
    /// Position the post held when it was removed.
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
struct DecisionMark {
    /// Version at which the decision settled; `None` while in flight.
    settled: Option<u64>,
}

/// Client-side review queue state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueState {
    posts: Vec<Post>,
    stats: Option<ApproverDashboardStats>,
    loading: bool,
    error: Option<String>,
    highlighted: Option<PostId>,
    loaded_once: bool,

    #[serde(skip)]
    version: u64,
    #[serde(skip)]
    latest_fetch_issued: u64,
    #[serde(skip)]
    last_fetch_settled: u64,
    #[serde(skip)]
    last_stats_applied: u64,
    #[serde(skip)]
    highlight_generation: u64,
    #[serde(skip)]
    decided: HashMap<PostId, DecisionMark>,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn stats(&self) -> Option<&ApproverDashboardStats> {
        self.stats.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn highlighted(&self) -> Option<&PostId> {
        self.highlighted.as_ref()
    }

    pub fn pending_count(&self) -> usize {
        self.posts.len()
    }

    /// Find a post in the current pending set.
    pub fn locate(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| &p.id == id)
    }

    pub fn view(&self) -> QueueView {
        if self.loading && (!self.loaded_once || self.error.is_some()) {
            return QueueView::Loading;
        }
        if let Some(message) = &self.error {
            return QueueView::Error {
                message: message.clone(),
            };
        }
        if !self.loaded_once {
            QueueView::Loading
        } else if self.posts.is_empty() {
            QueueView::Empty
        } else {
            QueueView::Ready
        }
    }

    /// Start a full fetch of pending posts and stats.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let version = self.next_version();
        self.latest_fetch_issued = version;
        self.loading = true;
        FetchTicket(version)
    }

    /// Apply the outcome of a full fetch.
    pub fn apply_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<(Vec<Post>, ApproverDashboardStats), AppError>,
    ) -> Vec<Notification> {
        let FetchTicket(issued) = ticket;
        if issued <= self.last_fetch_settled {
            log::debug!("[queue] Dropping stale fetch result (ticket {})", issued);
            return Vec::new();
        }
        self.last_fetch_settled = issued;
        if issued >= self.latest_fetch_issued {
            self.loading = false;
        }

        let (posts, stats) = match result {
            Ok(fresh) => fresh,
            Err(e) => {
                log::warn!("[queue] Fetch failed: {}", e);
                self.error = Some(e.user_message().to_string());
                return if e.is_auth_required() {
                    vec![Notification::SessionExpired]
                } else {
                    vec![Notification::FetchFailed {
                        message: e.user_message().to_string(),
                    }]
                };
            }
        };

        // Decisions settled before this fetch was issued are reflected by
        // the server; forget them.
        self.decided
            .retain(|_, mark| !matches!(mark.settled, Some(at) if at < issued));

        let fetched = posts.len();
        let posts: Vec<Post> = posts
            .into_iter()
            .filter(|p| p.is_pending())
            .filter(|p| !self.decided.contains_key(&p.id))
            .collect();
        if posts.len() != fetched {
            log::debug!(
                "[queue] Filtered {} of {} fetched posts (not pending or already decided)",
                fetched - posts.len(),
                fetched
            );
        }

        let previous = self.posts.len();
        self.posts = posts;
        self.apply_stats_value(issued, stats);
        self.error = None;
        self.loaded_once = true;

        let highlight_gone = self
            .highlighted
            .as_ref()
            .is_some_and(|id| self.locate(id).is_none());
        if highlight_gone {
            self.highlighted = None;
        }

        if self.posts.len() > previous {
            vec![Notification::NewPending {
                count: self.posts.len(),
            }]
        } else {
            Vec::new()
        }
    }

    /// Start a stats-only refresh.
    pub fn begin_stats(&mut self) -> StatsTicket {
        StatsTicket(self.next_version())
    }

    /// Apply the outcome of a stats-only refresh. Never touches the list.
    pub fn apply_stats(
        &mut self,
        ticket: StatsTicket,
        result: Result<ApproverDashboardStats, AppError>,
    ) -> Vec<Notification> {
        let StatsTicket(issued) = ticket;
        match result {
            Ok(stats) => {
                self.apply_stats_value(issued, stats);
                Vec::new()
            }
            Err(e) => {
                log::warn!("[queue] Stats refresh failed: {}", e);
                if e.is_auth_required() {
                    vec![Notification::SessionExpired]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn apply_stats_value(&mut self, issued: u64, stats: ApproverDashboardStats) {
        if issued > self.last_stats_applied {
            self.last_stats_applied = issued;
            self.stats = Some(stats);
        } else {
            log::debug!("[queue] Dropping stale stats (version {})", issued);
        }
    }

    /// Take a post out of the list ahead of its decision request.
    ///
    /// Returns `None` if the post is not currently pending, in which case
    /// no decision should be sent.
    pub fn remove_optimistically(&mut self, id: &PostId) -> Option<RemovedPost> {
        let index = self.posts.iter().position(|p| &p.id == id)?;
        let post = self.posts.remove(index);
        self.next_version();
        self.decided
            .insert(id.clone(), DecisionMark { settled: None });
        if self.highlighted.as_ref() == Some(id) {
            self.highlighted = None;
        }
        Some(RemovedPost { post, index })
    }

    /// Record that the backend accepted the decision.
    pub fn decision_succeeded(&mut self, removed: &RemovedPost) {
        let at = self.next_version();
        if let Some(mark) = self.decided.get_mut(&removed.post.id) {
            mark.settled = Some(at);
        }
    }

    /// Record that the backend rejected the decision.
    ///
    /// Returns true if the post was put back into the list.
    pub fn decision_failed(&mut self, removed: RemovedPost, policy: RollbackPolicy) -> bool {
        let at = self.next_version();
        match policy {
            RollbackPolicy::KeepRemoved => {
                if let Some(mark) = self.decided.get_mut(&removed.post.id) {
                    mark.settled = Some(at);
                }
                false
            }
            RollbackPolicy::Restore => {
                self.decided.remove(&removed.post.id);
                if self.locate(&removed.post.id).is_some() {
                    return false;
                }
                let index = removed.index.min(self.posts.len());
                self.posts.insert(index, removed.post);
                true
            }
        }
    }

    /// Highlight a post if it is in the pending set.
    ///
    /// Returns the highlight generation, used to expire exactly this
    /// highlight later.
    pub fn highlight(&mut self, id: &PostId) -> Option<u64> {
        self.locate(id)?;
        self.highlight_generation += 1;
        self.highlighted = Some(id.clone());
        Some(self.highlight_generation)
    }

    /// Clear the highlight started at `generation`, if it is still current.
    pub fn clear_highlight(&mut self, id: &PostId, generation: u64) -> bool {
        if generation == self.highlight_generation && self.highlighted.as_ref() == Some(id) {
            self.highlighted = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostAuthor, PostStatus};
    use chrono::Utc;

    fn post(id: i64) -> Post {
        Post {
            id: PostId::from(id),
            title: format!("Video {}", id),
            description: None,
            video_url: format!("/uploads/{}.mp4", id),
            status: PostStatus::Pending,
            user: PostAuthor {
                username: "creator".to_string(),
                email: None,
            },
            approver_id: None,
            admin_id: None,
            created_at: Utc::now(),
            updated_at: None,
            reviewed_at: None,
            views: 0,
            likes: 0,
            shares: 0,
            category_id: None,
            category: None,
        }
    }

    fn stats(pending: u64) -> ApproverDashboardStats {
        ApproverDashboardStats {
            pending_count: pending,
            ..Default::default()
        }
    }

    fn loaded(ids: &[i64]) -> QueueState {
        let mut state = QueueState::new();
        let ticket = state.begin_fetch();
        state.apply_fetch(
            ticket,
            Ok((ids.iter().map(|&i| post(i)).collect(), stats(ids.len() as u64))),
        );
        state
    }

    fn ids(state: &QueueState) -> Vec<String> {
        state.posts().iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn test_initial_view_is_loading() {
        let mut state = QueueState::new();
        assert_eq!(state.view(), QueueView::Loading);
        state.begin_fetch();
        assert_eq!(state.view(), QueueView::Loading);
    }

    #[test]
    fn test_empty_list_is_empty_not_error() {
        let state = loaded(&[]);
        assert_eq!(state.view(), QueueView::Empty);
        assert!(state.error().is_none());
    }

    #[test]
    fn test_first_load_announces_pending() {
        let mut state = QueueState::new();
        let ticket = state.begin_fetch();
        let notes = state.apply_fetch(ticket, Ok((vec![post(1), post(2)], stats(2))));
        assert_eq!(notes, vec![Notification::NewPending { count: 2 }]);
        assert_eq!(state.view(), QueueView::Ready);
        assert_eq!(state.stats().unwrap().pending_count, 2);
    }

    #[test]
    fn test_same_or_fewer_posts_is_silent() {
        let mut state = loaded(&[1, 2]);
        let ticket = state.begin_fetch();
        let notes = state.apply_fetch(ticket, Ok((vec![post(2)], stats(1))));
        assert!(notes.is_empty());
        assert_eq!(ids(&state), vec!["2"]);
    }

    #[test]
    fn test_non_pending_posts_are_filtered() {
        let mut state = QueueState::new();
        let mut approved = post(2);
        approved.status = PostStatus::Approved;
        let ticket = state.begin_fetch();
        state.apply_fetch(ticket, Ok((vec![post(1), approved], stats(1))));
        assert_eq!(ids(&state), vec!["1"]);
    }

    #[test]
    fn test_fetch_failure_keeps_previous_data() {
        let mut state = loaded(&[1, 2]);
        let ticket = state.begin_fetch();
        let notes = state.apply_fetch(ticket, Err(AppError::network("Failed to connect to server")));
        assert_eq!(
            state.view(),
            QueueView::Error {
                message: "Failed to connect to server".to_string()
            }
        );
        assert_eq!(ids(&state), vec!["1", "2"]);
        assert!(matches!(notes[..], [Notification::FetchFailed { .. }]));

        // retry clears the error
        let ticket = state.begin_fetch();
        assert_eq!(state.view(), QueueView::Loading);
        state.apply_fetch(ticket, Ok((vec![post(1)], stats(1))));
        assert_eq!(state.view(), QueueView::Ready);
    }

    #[test]
    fn test_auth_failure_signals_session_expired() {
        let mut state = QueueState::new();
        let ticket = state.begin_fetch();
        let notes = state.apply_fetch(ticket, Err(AppError::authentication_expired("expired")));
        assert_eq!(notes, vec![Notification::SessionExpired]);
    }

    #[test]
    fn test_older_fetch_result_is_dropped() {
        let mut state = loaded(&[1]);
        let old = state.begin_fetch();
        let new = state.begin_fetch();
        state.apply_fetch(new, Ok((vec![post(1), post(2)], stats(2))));
        assert!(!state.is_loading());
        state.apply_fetch(old, Ok((vec![], stats(0))));
        assert_eq!(ids(&state), vec!["1", "2"]);
        assert_eq!(state.stats().unwrap().pending_count, 2);
    }

    #[test]
    fn test_optimistic_removal_removes_exactly_one() {
        let mut state = loaded(&[1, 2, 3]);
        let removed = state.remove_optimistically(&PostId::from(2)).unwrap();
        assert_eq!(removed.index, 1);
        assert_eq!(ids(&state), vec!["1", "3"]);
        assert!(state.remove_optimistically(&PostId::from(2)).is_none());
    }

    #[test]
    fn test_stale_poll_cannot_resurrect_removed_post() {
        let mut state = loaded(&[1, 2]);
        // poll issued before the decision, answered after it
        let poll = state.begin_fetch();
        let removed = state.remove_optimistically(&PostId::from(1)).unwrap();
        state.decision_succeeded(&removed);
        state.apply_fetch(poll, Ok((vec![post(1), post(2)], stats(2))));
        assert_eq!(ids(&state), vec!["2"]);
    }

    #[test]
    fn test_poll_during_inflight_decision_keeps_post_hidden() {
        let mut state = loaded(&[1, 2]);
        let _removed = state.remove_optimistically(&PostId::from(1)).unwrap();
        let poll = state.begin_fetch();
        state.apply_fetch(poll, Ok((vec![post(1), post(2)], stats(2))));
        assert_eq!(ids(&state), vec!["2"]);
    }

    #[test]
    fn test_failed_decision_keep_removed_then_next_poll_restores() {
        let mut state = loaded(&[1, 2]);
        let removed = state.remove_optimistically(&PostId::from(1)).unwrap();
        assert!(!state.decision_failed(removed, RollbackPolicy::KeepRemoved));
        assert_eq!(ids(&state), vec!["2"]);

        // the server still has it pending; a fresh poll shows it again
        let poll = state.begin_fetch();
        state.apply_fetch(poll, Ok((vec![post(1), post(2)], stats(2))));
        assert_eq!(ids(&state), vec!["1", "2"]);
    }

    #[test]
    fn test_failed_decision_restore_reinserts_in_place() {
        let mut state = loaded(&[1, 2, 3]);
        let removed = state.remove_optimistically(&PostId::from(2)).unwrap();
        assert!(state.decision_failed(removed, RollbackPolicy::Restore));
        assert_eq!(ids(&state), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_stats_refresh_leaves_list_alone() {
        let mut state = loaded(&[1, 2]);
        let ticket = state.begin_stats();
        state.apply_stats(ticket, Ok(stats(7)));
        assert_eq!(state.stats().unwrap().pending_count, 7);
        assert_eq!(ids(&state), vec!["1", "2"]);

        let ticket = state.begin_stats();
        let notes = state.apply_stats(ticket, Err(AppError::network("down")));
        assert!(notes.is_empty());
        assert_eq!(state.stats().unwrap().pending_count, 7);
        assert!(state.error().is_none());
    }

    #[test]
    fn test_older_stats_are_dropped() {
        let mut state = loaded(&[1]);
        let old = state.begin_stats();
        let new = state.begin_stats();
        state.apply_stats(new, Ok(stats(5)));
        state.apply_stats(old, Ok(stats(9)));
        assert_eq!(state.stats().unwrap().pending_count, 5);
    }

    #[test]
    fn test_highlight_generations() {
        let mut state = loaded(&[1, 2]);
        assert!(state.highlight(&PostId::from(9)).is_none());

        let first = state.highlight(&PostId::from(1)).unwrap();
        let second = state.highlight(&PostId::from(1)).unwrap();
        // expiry of the first highlight must not cut the second one short
        assert!(!state.clear_highlight(&PostId::from(1), first));
        assert_eq!(state.highlighted(), Some(&PostId::from(1)));
        assert!(state.clear_highlight(&PostId::from(1), second));
        assert!(state.highlighted().is_none());
    }
}
