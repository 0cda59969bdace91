//! Client-side notification feed.
//!
//! Keeps a local list of notifications for one scope in sync with a
//! [`NotificationStore`]. Fetches are triggered by a poll interval, by
//! change events from the store and by an explicit [`FeedWaker`]. Failed
//! fetches are retried with capped exponential backoff; once the retries
//! are spent the error is kept for display until the next trigger.
//!
//! Mutations are optimistic: the local list changes first, the store call
//! follows, and the previous list is restored if the call fails. When the
//! list was replaced while the call was in flight the feed re-fetches
//! instead of restoring.
//!
//! Every write of the local list claims a version; a fetch that completes
//! after a newer write is discarded.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::retry::RetryPolicy;
use super::store::{NotificationChange, NotificationStore};
use crate::config::NotificationSettings;
use crate::error::{AppError, AppResult};
use crate::models::{Decision, NewNotification, Notification, NotificationStatus};
use crate::repositories::Resolution;

/// Timing knobs of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOptions {
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&NotificationSettings> for FeedOptions {
    fn from(settings: &NotificationSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            request_timeout: settings.request_timeout(),
            retry: RetryPolicy::from(settings),
        }
    }
}

/// Point-in-time view of the feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub notifications: Vec<Notification>,
    pub loading: bool,
    /// User-visible message of the last failure, cleared by a good fetch
    pub error: Option<String>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl FeedSnapshot {
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| n.is_unread()).count()
    }
}

/// Handle that asks a running feed to re-fetch now, the "back online" signal.
#[derive(Clone)]
pub struct FeedWaker(Arc<Notify>);

impl FeedWaker {
    pub fn wake(&self) {
        // notify_one keeps a permit when the loop is busy, so no wake-up is lost
        self.0.notify_one();
    }
}

enum ChangeSignal {
    Event(NotificationChange),
    Lagged(u64),
    Closed,
}

pub struct NotificationFeed {
    store: Arc<dyn NotificationStore>,
    options: FeedOptions,
    scope: RwLock<Option<i32>>,
    state: RwLock<FeedSnapshot>,
    wake: Arc<Notify>,
    cancel: CancellationToken,
    /// Placeholder ids for optimistic inserts count down from -1
    next_placeholder_id: AtomicI64,
    /// Last version handed out to a fetch or a local write
    issued_version: AtomicU64,
    /// Version of the list currently in `state`; only written under its lock
    applied_version: AtomicU64,
}

impl NotificationFeed {
    /// Creates a feed for `scope` (`None` = admin inbox). Nothing is fetched
    /// until [`start`](Self::start) or [`refresh`](Self::refresh).
    pub fn new(
        store: Arc<dyn NotificationStore>,
        scope: Option<i32>,
        options: FeedOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            options,
            scope: RwLock::new(scope),
            state: RwLock::new(FeedSnapshot::default()),
            wake: Arc::new(Notify::new()),
            cancel: CancellationToken::new(),
            next_placeholder_id: AtomicI64::new(-1),
            issued_version: AtomicU64::new(0),
            applied_version: AtomicU64::new(0),
        })
    }

    /// Spawns the sync loop: an immediate fetch, then one fetch per trigger.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let feed = Arc::clone(self);
        tokio::spawn(async move { feed.run().await })
    }

    /// Stops the sync loop and any backoff in progress.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn waker(&self) -> FeedWaker {
        FeedWaker(Arc::clone(&self.wake))
    }

    pub async fn scope(&self) -> Option<i32> {
        *self.scope.read().await
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        self.state.read().await.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }

    /// Unread count derived from the local list
    pub async fn unread_count(&self) -> usize {
        self.state.read().await.unread_count()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    fn next_version(&self) -> u64 {
        self.issued_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a list of `version` may replace the current one.
    /// Call with the state lock held.
    fn is_current(&self, version: u64) -> bool {
        version >= self.applied_version.load(Ordering::SeqCst)
    }

    async fn run(&self) {
        let mut changes = self.store.subscribe();
        let mut ticker = tokio::time::interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            store = self.store.name(),
            poll_interval_secs = self.options.poll_interval.as_secs(),
            realtime = changes.is_some(),
            "Notification feed started"
        );

        loop {
            let trigger = tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => "poll",
                _ = self.wake.notified() => "wake",
                signal = next_change(&mut changes) => match signal {
                    ChangeSignal::Event(change) => {
                        if !change.concerns(self.scope().await) {
                            continue;
                        }
                        "change"
                    }
                    ChangeSignal::Lagged(skipped) => {
                        debug!(skipped, "Change stream lagged, re-fetching");
                        "lagged"
                    }
                    ChangeSignal::Closed => {
                        warn!("Change stream closed, falling back to polling");
                        changes = None;
                        continue;
                    }
                },
            };

            debug!(trigger, "Refreshing notifications");
            // Failures are recorded in the snapshot
            let _ = self.refresh().await;
        }

        info!(store = self.store.name(), "Notification feed stopped");
    }

    /// Fetches the scope, retrying failures with the configured backoff.
    ///
    /// Exactly `min(failures, max_retries)` retries run before giving up.
    ///
    /// # Errors
    /// The last fetch error once the retries are spent
    pub async fn refresh(&self) -> AppResult<()> {
        let scope = self.scope().await;
        self.state.write().await.loading = true;

        let mut retry = 0;
        loop {
            let version = self.next_version();
            let err = match self.bounded("fetch notifications", self.store.fetch(scope)).await {
                Ok(notifications) => {
                    if self.scope().await != scope {
                        // set_user ran meanwhile; its own fetch wins
                        return Ok(());
                    }
                    let mut state = self.state.write().await;
                    if !self.is_current(version) {
                        debug!(version, "Discarding fetch older than the local list");
                        return Ok(());
                    }
                    self.applied_version.store(version, Ordering::SeqCst);
                    state.notifications = notifications;
                    state.loading = false;
                    state.error = None;
                    state.last_synced = Some(Utc::now());
                    return Ok(());
                }
                Err(err) => err,
            };

            if retry >= self.options.retry.max_retries {
                warn!(retries = retry, error = %err, "Giving up on notification fetch");
                let mut state = self.state.write().await;
                if self.is_current(version) {
                    state.loading = false;
                    state.error = Some(format!("Failed to load notifications: {}", err));
                }
                return Err(err);
            }

            let delay = self.options.retry.delay(retry);
            retry += 1;
            warn!(
                attempt = retry,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Notification fetch failed, retrying"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.state.write().await.loading = false;
                    return Err(err);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Switches the feed to another scope and re-fetches.
    pub async fn set_user(&self, user_id: Option<i32>) -> AppResult<()> {
        *self.scope.write().await = user_id;
        {
            let mut state = self.state.write().await;
            self.applied_version
                .store(self.next_version(), Ordering::SeqCst);
            state.notifications.clear();
            state.error = None;
        }
        self.refresh().await
    }

    // ========================================================================
    // Optimistic mutations
    // ========================================================================

    pub async fn mark_read(&self, id: i64) -> AppResult<Notification> {
        let scope = self.scope().await;
        self.mutate(
            "mark notification as read",
            |list| set_status(list, id, NotificationStatus::Read),
            self.store.mark_read(id, scope),
        )
        .await
    }

    pub async fn mark_all_read(&self) -> AppResult<usize> {
        let scope = self.scope().await;
        self.mutate(
            "mark all notifications as read",
            |list| {
                for n in list.iter_mut().filter(|n| n.is_unread()) {
                    n.status = NotificationStatus::Read;
                }
            },
            self.store.mark_all_read(scope),
        )
        .await
    }

    pub async fn approve(&self, id: i64) -> AppResult<Resolution> {
        self.decide(id, Decision::Approve).await
    }

    pub async fn reject(&self, id: i64, comment: Option<String>) -> AppResult<Resolution> {
        self.decide(id, Decision::Reject { comment }).await
    }

    async fn decide(&self, id: i64, decision: Decision) -> AppResult<Resolution> {
        let next = decision.status();
        self.mutate(
            "resolve notification",
            |list| set_status(list, id, next),
            self.store.resolve(id, decision),
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.mutate(
            "delete notification",
            |list| list.retain(|n| n.id != id),
            self.store.delete(id),
        )
        .await
    }

    /// Adds a notification; a placeholder shows until the re-fetch replaces it.
    pub async fn add(&self, new: NewNotification) -> AppResult<Notification> {
        let placeholder = Notification {
            id: self.next_placeholder_id.fetch_sub(1, Ordering::Relaxed),
            kind: new.kind,
            title: new.title.clone(),
            message: new.message.clone(),
            created_at: Utc::now(),
            status: new.effective_status(),
            from_user_id: new.from_user_id,
            from_user_name: new.from_user_name.clone(),
            target_id: new.target_id.clone(),
            target_type: new.target_type.clone(),
            comment: new.comment.clone(),
            user_id: new.user_id,
        };

        self.mutate(
            "add notification",
            move |list| list.insert(0, placeholder),
            self.store.add(new),
        )
        .await
    }

    async fn mutate<T, Fut>(
        &self,
        operation: &'static str,
        apply: impl FnOnce(&mut Vec<Notification>),
        call: Fut,
    ) -> AppResult<T>
    where
        Fut: Future<Output = AppResult<T>>,
    {
        let (previous, version) = {
            let mut state = self.state.write().await;
            let previous = state.notifications.clone();
            apply(&mut state.notifications);
            let version = self.next_version();
            self.applied_version.store(version, Ordering::SeqCst);
            (previous, version)
        };

        match self.bounded(operation, call).await {
            Ok(value) => {
                if let Err(err) = self.refresh().await {
                    debug!(operation, error = %err, "Re-fetch after mutation failed");
                }
                Ok(value)
            }
            Err(err) => {
                let superseded = {
                    let mut state = self.state.write().await;
                    let superseded = self.applied_version.load(Ordering::SeqCst) != version;
                    if !superseded {
                        warn!(operation, error = %err, "Rolling back optimistic update");
                        state.notifications = previous;
                    }
                    superseded
                };

                if superseded {
                    // The snapshot predates a newer list; resync instead
                    warn!(operation, error = %err, "Optimistic update failed, re-fetching");
                    if let Err(refetch) = self.refresh().await {
                        debug!(operation, error = %refetch, "Re-fetch after failed mutation failed");
                    }
                }

                self.state.write().await.error =
                    Some(format!("Failed to {}: {}", operation, err));
                Err(err)
            }
        }
    }

    /// Bounds one store call by the request timeout.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        tokio::time::timeout(self.options.request_timeout, call)
            .await
            .map_err(|_| AppError::Timeout {
                operation: operation.to_string(),
                timeout_ms: self.options.request_timeout.as_millis() as u64,
            })?
    }
}

fn set_status(list: &mut [Notification], id: i64, next: NotificationStatus) {
    if let Some(n) = list.iter_mut().find(|n| n.id == id) {
        if n.status.can_transition_to(next) {
            n.status = next;
        }
    }
}

async fn next_change(
    changes: &mut Option<broadcast::Receiver<NotificationChange>>,
) -> ChangeSignal {
    let Some(rx) = changes.as_mut() else {
        return std::future::pending().await;
    };
    match rx.recv().await {
        Ok(change) => ChangeSignal::Event(change),
        Err(broadcast::error::RecvError::Lagged(skipped)) => ChangeSignal::Lagged(skipped),
        Err(broadcast::error::RecvError::Closed) => ChangeSignal::Closed,
    }
}
