//! Background review queue engine.
//!
//! Drives the approver review screen:
//! - Initial fetch on start, then a poll at the configured interval
//! - Manual refresh ("Try Again")
//! - Optimistic approve/reject with stats-only reconciliation
//! - Post selection with a temporary highlight
//!
//! The engine task is the only writer of [`QueueState`]. Network calls run
//! as separate tasks and report back to it, so several decisions can be in
//! flight at once while state updates still apply one at a time.

use crate::config::QueueConfig;
use crate::error::AppError;
use crate::models::{ApproverDashboardStats, Decision, Post, PostId};
use crate::services::api::ReviewApi;
use crate::services::queue_events::{Notification, QueueEvent};
use crate::services::review_queue::{FetchTicket, QueueState, RemovedPost, StatsTicket};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Commands that can be sent to the review queue engine.
#[derive(Debug)]
pub enum QueueCommand {
    /// Re-run the full fetch immediately.
    Refresh,

    /// Apply a decision to a pending post.
    Decide { post_id: PostId, decision: Decision },

    /// Bring a post into view.
    Select { post_id: PostId },
}

/// Events buffered for a host that is slow to read them.
pub const EVENT_BUFFER: usize = 256;

/// Result of a task spawned by the engine.
enum Completion {
    Fetch {
        ticket: FetchTicket,
        result: Result<(Vec<Post>, ApproverDashboardStats), AppError>,
    },
    Stats {
        ticket: StatsTicket,
        result: Result<ApproverDashboardStats, AppError>,
    },
    Decision {
        removed: RemovedPost,
        decision: Decision,
        result: Result<(), AppError>,
    },
    HighlightExpired {
        post_id: PostId,
        generation: u64,
    },
}

/// Lightweight handle for controlling the review queue engine.
///
/// Communicates with the engine task via an mpsc channel. Reading the
/// snapshot only takes a read lock.
#[derive(Clone)]
pub struct ReviewQueueHandle {
    command_tx: mpsc::Sender<QueueCommand>,
    state: Arc<RwLock<QueueState>>,
    cancel: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ReviewQueueHandle {
    async fn send(&self, command: QueueCommand) -> Result<(), AppError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| AppError::internal("Review queue not running"))
    }

    /// Re-fetch pending posts and stats now.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.send(QueueCommand::Refresh).await
    }

    pub async fn decide(&self, post_id: PostId, decision: Decision) -> Result<(), AppError> {
        self.send(QueueCommand::Decide { post_id, decision }).await
    }

    pub async fn approve(&self, post_id: PostId) -> Result<(), AppError> {
        self.decide(post_id, Decision::Approved).await
    }

    pub async fn reject(&self, post_id: PostId, reason: Option<String>) -> Result<(), AppError> {
        self.decide(post_id, Decision::Rejected { reason }).await
    }

    /// Scroll to and highlight a post, e.g. when chosen from the sidebar.
    pub async fn select(&self, post_id: PostId) -> Result<(), AppError> {
        self.send(QueueCommand::Select { post_id }).await
    }

    /// Current queue state.
    pub async fn snapshot(&self) -> QueueState {
        self.state.read().await.clone()
    }

    /// Stop polling and abort in-flight requests.
    ///
    /// Once this returns no further requests are issued.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                log::error!("[queue] Engine task ended abnormally: {}", e);
            }
        }
    }
}

/// Background review queue engine.
pub struct ReviewQueueEngine<A> {
    api: Arc<A>,
    config: QueueConfig,
    state: Arc<RwLock<QueueState>>,
    events: mpsc::Sender<QueueEvent>,
    tasks: JoinSet<Completion>,
}

impl<A: ReviewApi + 'static> ReviewQueueEngine<A> {
    /// Start the engine task.
    ///
    /// The first fetch is issued immediately. Returns the control handle and
    /// the receiving end of the event stream. Events that do not fit in
    /// [`EVENT_BUFFER`] are dropped; the snapshot stays authoritative.
    pub fn start_background(
        api: Arc<A>,
        config: QueueConfig,
    ) -> (ReviewQueueHandle, mpsc::Receiver<QueueEvent>) {
        let (command_tx, command_rx) = mpsc::channel::<QueueCommand>(32);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let state = Arc::new(RwLock::new(QueueState::new()));
        let cancel = CancellationToken::new();

        let engine = ReviewQueueEngine {
            api,
            config,
            state: state.clone(),
            events: event_tx,
            tasks: JoinSet::new(),
        };
        let task = tokio::spawn(engine.run(command_rx, cancel.clone()));

        let handle = ReviewQueueHandle {
            command_tx,
            state,
            cancel,
            task: Arc::new(Mutex::new(Some(task))),
        };
        (handle, event_rx)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<QueueCommand>, cancel: CancellationToken) {
        let period = self.config.refresh_interval;
        log::info!("[queue] Review queue started, refreshing every {}s", period.as_secs());

        self.spawn_fetch().await;

        // first tick one period from now; the initial fetch is already out
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // teardown wins over any ready tick or command
                biased;

                _ = cancel.cancelled() => {
                    log::info!("[queue] Review queue cancelled");
                    break;
                }
                _ = interval.tick() => {
                    log::debug!("[queue] Periodic refresh");
                    self.spawn_fetch().await;
                }
                cmd = commands.recv() => match cmd {
                    Some(QueueCommand::Refresh) => {
                        log::info!("[queue] Manual refresh");
                        self.spawn_fetch().await;
                    }
                    Some(QueueCommand::Decide { post_id, decision }) => {
                        self.start_decision(post_id, decision).await;
                    }
                    Some(QueueCommand::Select { post_id }) => {
                        self.select(post_id).await;
                    }
                    None => {
                        log::info!("[queue] All handles dropped, review queue stopping");
                        break;
                    }
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => match joined {
                    Ok(completion) => self.complete(completion).await,
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => log::error!("[queue] Background task failed: {}", e),
                },
            }
        }

        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        log::info!("[queue] Review queue stopped");
    }

    fn emit(&self, event: QueueEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                log::warn!("[queue] Event buffer full, dropping {:?}", event);
            }
            // nobody listening is fine
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn notify_all(&self, notes: Vec<Notification>) {
        for note in notes {
            self.emit(QueueEvent::Notify(note));
        }
    }

    async fn spawn_fetch(&mut self) {
        let ticket = self.state.write().await.begin_fetch();
        self.emit(QueueEvent::StateChanged);

        let api = self.api.clone();
        self.tasks.spawn(async move {
            let (posts, stats) =
                tokio::join!(api.fetch_pending_posts(), api.fetch_approver_stats());
            let result = match (posts, stats) {
                (Ok(posts), Ok(stats)) => Ok((posts, stats)),
                (Err(e), _) | (_, Err(e)) => Err(e),
            };
            Completion::Fetch { ticket, result }
        });
    }

    async fn spawn_stats(&mut self) {
        let ticket = self.state.write().await.begin_stats();

        let api = self.api.clone();
        self.tasks.spawn(async move {
            let result = api.fetch_approver_stats().await;
            Completion::Stats { ticket, result }
        });
    }

    async fn start_decision(&mut self, post_id: PostId, decision: Decision) {
        let removed = self.state.write().await.remove_optimistically(&post_id);
        let Some(removed) = removed else {
            log::warn!("[queue] Ignoring {} for post {}: not pending", decision, post_id);
            self.emit(QueueEvent::Notify(Notification::NotInPendingList { post_id }));
            return;
        };
        log::info!("[queue] Post {} {} (optimistic)", post_id, decision);
        self.emit(QueueEvent::StateChanged);

        let api = self.api.clone();
        self.tasks.spawn(async move {
            let result = match &decision {
                Decision::Approved => api.approve_post(&removed.post.id).await,
                Decision::Rejected { reason } => {
                    api.reject_post(&removed.post.id, reason.as_deref()).await
                }
            };
            Completion::Decision {
                removed,
                decision,
                result,
            }
        });
    }

    async fn select(&mut self, post_id: PostId) {
        let focus = {
            let mut state = self.state.write().await;
            state
                .highlight(&post_id)
                .zip(state.locate(&post_id).map(Post::element_id))
        };
        let Some((generation, element_id)) = focus else {
            log::debug!("[queue] Selected post {} is not pending", post_id);
            self.emit(QueueEvent::Notify(Notification::NotInPendingList { post_id }));
            return;
        };

        let highlight = self.config.highlight_duration;
        self.emit(QueueEvent::FocusPost {
            element_id,
            post_id: post_id.clone(),
            highlight,
        });
        self.emit(QueueEvent::StateChanged);

        self.tasks.spawn(async move {
            time::sleep(highlight).await;
            Completion::HighlightExpired {
                post_id,
                generation,
            }
        });
    }

    async fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Fetch { ticket, result } => {
                let notes = self.state.write().await.apply_fetch(ticket, result);
                self.emit(QueueEvent::StateChanged);
                self.notify_all(notes);
            }
            Completion::Stats { ticket, result } => {
                let notes = self.state.write().await.apply_stats(ticket, result);
                self.emit(QueueEvent::StateChanged);
                self.notify_all(notes);
            }
            Completion::Decision {
                removed,
                decision,
                result: Ok(()),
            } => {
                self.state.write().await.decision_succeeded(&removed);
                let post_id = removed.post.id;
                log::info!("[queue] Post {} {} confirmed", post_id, decision);
                self.spawn_stats().await;
                self.emit(QueueEvent::Notify(Notification::DecisionApplied {
                    post_id,
                    decision,
                }));
            }
            Completion::Decision {
                removed,
                decision,
                result: Err(e),
            } => {
                let post_id = removed.post.id.clone();
                log::warn!("[queue] Failed to mark post {} {}: {}", post_id, decision, e);
                let restored = self
                    .state
                    .write()
                    .await
                    .decision_failed(removed, self.config.rollback);
                if restored {
                    self.emit(QueueEvent::StateChanged);
                }
                self.emit(QueueEvent::Notify(Notification::DecisionFailed {
                    post_id,
                    message: e.user_message().to_string(),
                }));
                if e.is_auth_required() {
                    self.emit(QueueEvent::Notify(Notification::SessionExpired));
                }
            }
            Completion::HighlightExpired {
                post_id,
                generation,
            } => {
                let cleared = self
                    .state
                    .write()
                    .await
                    .clear_highlight(&post_id, generation);
                if cleared {
                    self.emit(QueueEvent::HighlightCleared { post_id });
                    self.emit(QueueEvent::StateChanged);
                }
            }
        }
    }
}
