//! The page controller. One [`Platform`] instance owns all interaction
//! state for a session and wires every handler to the store, the session
//! vote ledgers, the notification center, and the presentation seam.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::filter;
use crate::models::*;
use crate::notify::{NotificationCenter, DEFAULT_DISMISS_AFTER};
use crate::presenter::{
    ElementHandle, Presenter, RenderRecord, OPTION_PULSE, REVEAL, SLIDE_IN, VOTE_POP,
};
use crate::store::{PercentMode, Store};
use crate::votes::{transition, DiscussionVotes, VoteLedger};

pub const STORIES_CONTAINER: &str = "stories-grid";
pub const DISCUSSIONS_CONTAINER: &str = "discussion-threads";
pub const NOTIFICATIONS_CONTAINER: &str = "notifications";

/// Simulated latency before a "load more" request completes.
pub const DEFAULT_LOAD_DELAY: Duration = Duration::from_millis(1500);

const MSG_REQUIRED_FIELDS: &str = "Please fill in all required fields";
const MSG_STORY_PUBLISHED: &str = "Your story has been published!";
const MSG_DISCUSSION_STARTED: &str = "Discussion started!";
const MSG_VOTE_RECORDED: &str = "Your vote has been recorded!";
const MSG_ALREADY_VOTED: &str = "You have already voted in this poll!";
const MSG_INVALID_EMAIL: &str = "Please enter a valid email address";
const MSG_SUBSCRIBED: &str = "Thanks for subscribing!";
const MSG_MORE_LOADED: &str = "More content loaded!";

pub struct Platform {
    store: Arc<dyn Store>,
    presenter: Arc<dyn Presenter>,
    notifications: NotificationCenter,
    poll_votes: VoteLedger,
    discussion_votes: DiscussionVotes,
    pending_loads: Arc<DashMap<String, JoinHandle<()>>>,
    revealed: DashSet<ElementHandle>,
    percent_mode: PercentMode,
    load_delay: Duration,
}

impl Platform {
    pub fn new(store: Arc<dyn Store>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            store,
            presenter,
            notifications: NotificationCenter::new(DEFAULT_DISMISS_AFTER),
            poll_votes: VoteLedger::new(),
            discussion_votes: DiscussionVotes::new(),
            pending_loads: Arc::new(DashMap::new()),
            revealed: DashSet::new(),
            percent_mode: PercentMode::default(),
            load_delay: DEFAULT_LOAD_DELAY,
        }
    }

    /// Switch the poll display math (the legacy nudge is opt-in).
    pub fn with_percent_mode(mut self, mode: PercentMode) -> Self {
        self.percent_mode = mode;
        self
    }

    pub fn with_dismiss_after(mut self, dismiss_after: Duration) -> Self {
        self.notifications = NotificationCenter::new(dismiss_after);
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    // ---------------- record creation ----------------

    pub async fn create_story(&self, new: NewStory) -> Result<Story> {
        if let Err(err) = require("title", &new.title).and_then(|()| require("body", &new.body)) {
            self.notify(NotificationKind::Error, MSG_REQUIRED_FIELDS);
            return Err(err);
        }
        let story = self.store.add_story(new).await?;
        info!(id = story.id, category = story.category.slug(), "story published");
        let handle = self.presenter.render(STORIES_CONTAINER, RenderRecord::Story(&story));
        self.presenter.animate(handle, &REVEAL);
        self.notify(NotificationKind::Success, MSG_STORY_PUBLISHED);
        Ok(story)
    }

    pub async fn create_discussion(&self, new: NewDiscussion) -> Result<Discussion> {
        if let Err(err) = require("title", &new.title).and_then(|()| require("body", &new.body)) {
            self.notify(NotificationKind::Error, MSG_REQUIRED_FIELDS);
            return Err(err);
        }
        let discussion = self.store.add_discussion(new).await?;
        info!(id = discussion.id, "discussion started");
        let handle =
            self.presenter.render(DISCUSSIONS_CONTAINER, RenderRecord::Discussion(&discussion));
        self.presenter.animate(handle, &REVEAL);
        self.notify(NotificationKind::Success, MSG_DISCUSSION_STARTED);
        Ok(discussion)
    }

    // ---------------- voting ----------------

    /// Cast a poll vote from the clicked option element. A second vote on
    /// the same (poll, option) pair is rejected for the whole session.
    pub async fn cast_poll_vote(
        &self,
        poll: &str,
        option: &str,
        target: ElementHandle,
    ) -> Result<Poll> {
        // claim the ledger pair before the store write suspends; a second
        // in-flight duplicate must fail this claim, not a stale read
        if !self.poll_votes.record(poll, option) {
            warn!(poll, option, "duplicate vote attempt");
            self.notify(NotificationKind::Warning, MSG_ALREADY_VOTED);
            return Err(Error::AlreadyVoted);
        }
        let updated = match self.store.record_vote(poll, option, self.percent_mode).await {
            Ok(updated) => updated,
            Err(err) => {
                self.poll_votes.retract(poll, option);
                return Err(err.into());
            }
        };
        info!(poll, option, total = updated.total_votes, "poll vote recorded");
        self.presenter.animate(target, &OPTION_PULSE);
        self.notify(NotificationKind::Success, MSG_VOTE_RECORDED);
        Ok(updated)
    }

    /// One step of the three-state vote toggle on a discussion. Session
    /// state is committed only after the store accepts the tally delta.
    pub async fn toggle_discussion_vote(
        &self,
        discussion: Id,
        dir: VoteDirection,
        target: ElementHandle,
    ) -> Result<VoteState> {
        let (next, delta) = transition(self.discussion_votes.state(discussion), dir);
        let updated = self.store.apply_tally(discussion, delta.up, delta.down).await?;
        self.discussion_votes.set(discussion, next);
        debug!(discussion, ?next, score = updated.votes.score(), "vote toggled");
        self.presenter.animate(target, &VOTE_POP);
        Ok(next)
    }

    pub fn vote_state(&self, discussion: Id) -> VoteState {
        self.discussion_votes.state(discussion)
    }

    pub fn has_voted(&self, poll: &str, option: &str) -> bool {
        self.poll_votes.has_voted(poll, option)
    }

    // ---------------- content views ----------------

    pub async fn stories(&self) -> Result<Vec<Story>> {
        Ok(self.store.list_stories().await?)
    }

    pub async fn discussions(&self) -> Result<Vec<Discussion>> {
        Ok(self.store.list_discussions().await?)
    }

    pub async fn poll(&self, slug: &str) -> Result<Poll> {
        Ok(self.store.get_poll(slug).await?)
    }

    /// Stories visible under a category tag (`"all"` shows everything).
    pub async fn filter_stories(&self, tag: &str) -> Result<Vec<Story>> {
        let mut stories = self.store.list_stories().await?;
        stories.retain(|s| filter::matches_category(s, tag));
        Ok(stories)
    }

    /// Stories matching a free-text query on title or summary.
    pub async fn search_stories(&self, query: &str) -> Result<Vec<Story>> {
        let mut stories = self.store.list_stories().await?;
        stories.retain(|s| filter::matches_text(s, query));
        Ok(stories)
    }

    // ---------------- ambient interactions ----------------

    pub fn signup_newsletter(&self, email: &str) -> Result<()> {
        if email.trim().is_empty() || !email.contains('@') {
            self.notify(NotificationKind::Error, MSG_INVALID_EMAIL);
            return Err(Error::Validation("email"));
        }
        info!("newsletter signup accepted");
        self.notify(NotificationKind::Success, MSG_SUBSCRIBED);
        Ok(())
    }

    /// Kick off a simulated "load more" for a section. Returns `false` while
    /// a load for that section is already in flight (the trigger stays
    /// disabled until the pending one completes), or when no async runtime
    /// is available to schedule it.
    pub fn load_more(&self, section: &str) -> bool {
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            warn!(section, "no async runtime, load more unavailable");
            return false;
        };
        // reserve the slot before spawning; the task blocks on this shard
        // until the handle is stored, so it cannot clear the key first
        let slot = match self.pending_loads.entry(section.to_string()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => slot,
        };
        debug!(section, "load more requested");
        let key = section.to_string();
        let pending = Arc::clone(&self.pending_loads);
        let center = self.notifications.clone();
        let presenter = Arc::clone(&self.presenter);
        let delay = self.load_delay;
        let handle = rt.spawn(async move {
            tokio::time::sleep(delay).await;
            push_and_render(&center, presenter.as_ref(), NotificationKind::Success, MSG_MORE_LOADED);
            pending.remove(&key);
        });
        slot.insert(handle);
        true
    }

    pub fn load_pending(&self, section: &str) -> bool {
        self.pending_loads.contains_key(section)
    }

    /// Surface which discussions a trending topic would filter by. The
    /// original only simulates this, so an info notification is all there is.
    pub fn trending_topic_selected(&self, topic: &str, target: ElementHandle) {
        self.presenter.animate(target, &OPTION_PULSE);
        self.notify(NotificationKind::Info, format!("Filtering discussions by: {topic}"));
    }

    /// Reveal elements that just scrolled into view, once each, with a small
    /// random stagger.
    pub fn reveal_visible(&self, visible: &[ElementHandle]) {
        let mut rng = rand::thread_rng();
        for &handle in visible {
            if self.revealed.insert(handle) {
                let delay = rng.gen_range(0..200);
                self.presenter.animate(handle, &REVEAL.clone().with_delay(delay));
            }
        }
    }

    // ---------------- notifications ----------------

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.active()
    }

    pub fn dismiss_notification(&self, id: Id) -> bool {
        self.notifications.dismiss(id)
    }

    fn notify(&self, kind: NotificationKind, message: impl Into<String>) {
        push_and_render(&self.notifications, self.presenter.as_ref(), kind, message);
    }

    /// Abort every pending timer. Called automatically on drop; no timer
    /// outlives the controller that scheduled it.
    pub fn teardown(&self) {
        for entry in self.pending_loads.iter() {
            entry.value().abort();
        }
        self.pending_loads.clear();
        self.notifications.shutdown();
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn push_and_render(
    center: &NotificationCenter,
    presenter: &dyn Presenter,
    kind: NotificationKind,
    message: impl Into<String>,
) {
    let notification = center.push(kind, message);
    let handle =
        presenter.render(NOTIFICATIONS_CONTAINER, RenderRecord::Notification(&notification));
    presenter.animate(handle, &SLIDE_IN);
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank_values() {
        assert_eq!(require("title", "  "), Err(Error::Validation("title")));
        assert!(require("title", "x").is_ok());
    }
}
