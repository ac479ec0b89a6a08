use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::models::*;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")] NotFound,
}

pub type StoreResult<T> = Result<T, StoreError>;

use async_trait::async_trait;

#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Stories in display order, newest first.
    async fn list_stories(&self) -> StoreResult<Vec<Story>>;
    async fn add_story(&self, new: NewStory) -> StoreResult<Story>;
}

#[async_trait]
pub trait DiscussionStore: Send + Sync {
    /// Discussions in display order, newest first.
    async fn list_discussions(&self) -> StoreResult<Vec<Discussion>>;
    async fn add_discussion(&self, new: NewDiscussion) -> StoreResult<Discussion>;
    async fn get_discussion(&self, id: Id) -> StoreResult<Discussion>;
    /// Apply up/down deltas to a discussion's tally (deltas may be negative
    /// when a vote is retracted).
    async fn apply_tally(&self, id: Id, up: i64, down: i64) -> StoreResult<Discussion>;
}

/// How display percentages are maintained when a poll vote lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PercentMode {
    /// Recompute from the raw vote counts.
    #[default]
    Recompute,
    /// The original ±1-point nudge; display drifts from the counts.
    LegacyNudge,
}

#[async_trait]
pub trait PollStore: Send + Sync {
    async fn get_poll(&self, slug: &str) -> StoreResult<Poll>;
    async fn put_poll(&self, poll: Poll) -> StoreResult<()>;
    /// Increment the option's count and the total, then refresh display
    /// percentages per `mode`. Returns the updated poll.
    async fn record_vote(&self, slug: &str, option: &str, mode: PercentMode) -> StoreResult<Poll>;
}

pub trait Store: StoryStore + DiscussionStore + PollStore {}

impl<T> Store for T where T: StoryStore + DiscussionStore + PollStore {}

pub mod inmem {
    use super::*;

    #[derive(Default)]
    struct State {
        stories: HashMap<Id, Story>,
        discussions: HashMap<Id, Discussion>,
        polls: HashMap<String, Poll>,
        next_id: Id,
    }

    /// Process-memory store. State lives for the session only; nothing is
    /// ever persisted or deleted.
    #[derive(Clone)]
    pub struct InMemStore {
        state: Arc<RwLock<State>>,
    }

    impl InMemStore {
        pub fn new() -> Self {
            Self { state: Arc::new(RwLock::new(State::default())) }
        }

        fn next_id(state: &mut State) -> Id {
            state.next_id += 1;
            state.next_id
        }
    }

    impl Default for InMemStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl StoryStore for InMemStore {
        async fn list_stories(&self) -> StoreResult<Vec<Story>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.stories.values().cloned().collect();
            v.sort_by(|a, b| b.id.cmp(&a.id)); // ids are monotonic, so newest first
            Ok(v)
        }

        async fn add_story(&self, new: NewStory) -> StoreResult<Story> {
            let mut s = self.state.write().unwrap();
            let id = Self::next_id(&mut s);
            let story = Story {
                id,
                read_minutes: read_minutes(&new.body),
                title: new.title,
                category: new.category,
                summary: new.summary,
                body: new.body,
                author: new.author,
                created_at: Utc::now(),
            };
            s.stories.insert(id, story.clone());
            Ok(story)
        }
    }

    #[async_trait]
    impl DiscussionStore for InMemStore {
        async fn list_discussions(&self) -> StoreResult<Vec<Discussion>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.discussions.values().cloned().collect();
            v.sort_by(|a, b| b.id.cmp(&a.id));
            Ok(v)
        }

        async fn add_discussion(&self, new: NewDiscussion) -> StoreResult<Discussion> {
            let mut s = self.state.write().unwrap();
            let id = Self::next_id(&mut s);
            let discussion = Discussion {
                id,
                title: new.title,
                topic: new.topic,
                body: new.body,
                author: new.author,
                created_at: Utc::now(),
                votes: VoteTally::default(),
                replies: 0,
            };
            s.discussions.insert(id, discussion.clone());
            Ok(discussion)
        }

        async fn get_discussion(&self, id: Id) -> StoreResult<Discussion> {
            let s = self.state.read().unwrap();
            s.discussions.get(&id).cloned().ok_or(StoreError::NotFound)
        }

        async fn apply_tally(&self, id: Id, up: i64, down: i64) -> StoreResult<Discussion> {
            let mut s = self.state.write().unwrap();
            let d = s.discussions.get_mut(&id).ok_or(StoreError::NotFound)?;
            d.votes = crate::votes::apply_delta(d.votes, crate::votes::TallyDelta { up, down });
            Ok(d.clone())
        }
    }

    #[async_trait]
    impl PollStore for InMemStore {
        async fn get_poll(&self, slug: &str) -> StoreResult<Poll> {
            let s = self.state.read().unwrap();
            s.polls.get(slug).cloned().ok_or(StoreError::NotFound)
        }

        async fn put_poll(&self, poll: Poll) -> StoreResult<()> {
            let mut s = self.state.write().unwrap();
            s.polls.insert(poll.slug.clone(), poll);
            Ok(())
        }

        async fn record_vote(
            &self,
            slug: &str,
            option: &str,
            mode: PercentMode,
        ) -> StoreResult<Poll> {
            let mut s = self.state.write().unwrap();
            let poll = s.polls.get_mut(slug).ok_or(StoreError::NotFound)?;
            let opt = poll
                .options
                .iter_mut()
                .find(|o| o.key == option)
                .ok_or(StoreError::NotFound)?;
            opt.votes += 1;
            poll.total_votes += 1;
            match mode {
                PercentMode::Recompute => poll.recompute_percentages(),
                PercentMode::LegacyNudge => poll.nudge_percentages(option),
            }
            Ok(poll.clone())
        }
    }
}
