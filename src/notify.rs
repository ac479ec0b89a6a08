//! Transient user-facing notifications with cancellable auto-dismiss.
//!
//! Every notification owns a dismiss timer; the timer handle is retained so
//! an early dismiss (or a full shutdown) aborts it instead of letting it
//! fire against removed state.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::{Id, Notification, NotificationKind};

pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct NotificationCenter {
    active: Arc<DashMap<Id, Notification>>,
    timers: Arc<DashMap<Id, JoinHandle<()>>>,
    next_id: Arc<AtomicI64>,
    dismiss_after: Duration,
}

impl NotificationCenter {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            active: Arc::new(DashMap::new()),
            timers: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(0)),
            dismiss_after,
        }
    }

    /// Show a notification and schedule its auto-dismiss. Outside a tokio
    /// runtime the notification still appears, but only a manual dismiss
    /// removes it.
    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) -> Notification {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let notification = Notification {
            id,
            message: message.into(),
            kind,
            created_at: Utc::now(),
        };
        self.active.insert(id, notification.clone());

        match Handle::try_current() {
            Ok(rt) => {
                // hold the timer slot while spawning; the task blocks on
                // this shard until the handle lands, so it cannot finish
                // and clear its key first
                let slot = self.timers.entry(id);
                let active = self.active.clone();
                let timers = self.timers.clone();
                let after = self.dismiss_after;
                let handle = rt.spawn(async move {
                    tokio::time::sleep(after).await;
                    active.remove(&id);
                    timers.remove(&id);
                    debug!(id, "notification auto-dismissed");
                });
                slot.or_insert(handle);
            }
            Err(_) => debug!(id, "no async runtime, auto-dismiss disabled"),
        }
        notification
    }

    /// Dismiss early, aborting the pending timer. Returns `false` for ids
    /// that are no longer active.
    pub fn dismiss(&self, id: Id) -> bool {
        if let Some((_, handle)) = self.timers.remove(&id) {
            handle.abort();
        }
        self.active.remove(&id).is_some()
    }

    /// Currently visible notifications, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        let mut v: Vec<_> = self.active.iter().map(|e| e.value().clone()).collect();
        v.sort_by_key(|n| n.id);
        v
    }

    /// Abort every pending timer and clear the center. Called on teardown so
    /// no timer outlives its target.
    pub fn shutdown(&self) {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
        self.timers.clear();
        self.active.clear();
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn auto_dismiss_removes_the_notification() {
        let center = NotificationCenter::new(Duration::from_secs(3));
        let n = center.push(NotificationKind::Success, "vote recorded");
        assert_eq!(center.active().len(), 1);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(center.active().is_empty());
        assert!(!center.dismiss(n.id));
    }

    #[tokio::test(start_paused = true)]
    async fn early_dismiss_aborts_the_timer() {
        let center = NotificationCenter::new(Duration::from_secs(3));
        let n = center.push(NotificationKind::Info, "hello");
        assert!(center.dismiss(n.id));
        assert!(center.active().is_empty());

        // nothing left to fire
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(center.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn notifications_list_oldest_first() {
        let center = NotificationCenter::default();
        center.push(NotificationKind::Info, "first");
        center.push(NotificationKind::Info, "second");
        let messages: Vec<_> = center.active().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn push_without_a_runtime_keeps_the_notification_until_dismissed() {
        let center = NotificationCenter::default();
        let n = center.push(NotificationKind::Info, "offline");
        assert_eq!(center.active().len(), 1);
        assert!(center.dismiss(n.id));
        assert!(center.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_clears_everything() {
        let center = NotificationCenter::default();
        center.push(NotificationKind::Warning, "a");
        center.push(NotificationKind::Error, "b");
        center.shutdown();
        assert!(center.active().is_empty());
    }
}
