use std::sync::Arc;
use std::time::Duration;

use hikayat::controller::{Platform, NOTIFICATIONS_CONTAINER, STORIES_CONTAINER};
use hikayat::models::{
    Category, Discussion, Id, NewDiscussion, NewStory, NotificationKind, Poll, Story,
    VoteDirection, VoteState,
};
use hikayat::presenter::{ElementHandle, RecordingPresenter};
use hikayat::store::{
    inmem::InMemStore, DiscussionStore, PercentMode, PollStore, StoreResult, StoryStore,
};
use hikayat::{seed, Error};

/// Fresh seeded platform with a recording presenter, for every test run.
async fn platform() -> (Platform, Arc<RecordingPresenter>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let store = Arc::new(InMemStore::new());
    seed::seed(store.as_ref()).await.unwrap();
    let presenter = Arc::new(RecordingPresenter::new());
    let p = Platform::new(store, presenter.clone());
    (p, presenter)
}

fn valid_story() -> NewStory {
    NewStory {
        title: "Cordoba at night".into(),
        category: Category::Cultural,
        summary: "street lamps centuries early".into(),
        body: "Cordoba's streets were lit at a time when much of Europe went dark.".into(),
        author: "you".into(),
    }
}

fn valid_discussion() -> NewDiscussion {
    NewDiscussion {
        title: "Most underrated scholar?".into(),
        topic: "scientists".into(),
        body: "Name one figure who deserves far more attention.".into(),
        author: "you".into(),
    }
}

#[tokio::test]
async fn create_story_rejects_missing_fields_and_leaves_state_alone() {
    let (p, _) = platform().await;
    let before = p.stories().await.unwrap().len();

    let mut blank_title = valid_story();
    blank_title.title = "  ".into();
    assert_eq!(p.create_story(blank_title).await.unwrap_err(), Error::Validation("title"));

    let mut blank_body = valid_story();
    blank_body.body = String::new();
    assert_eq!(p.create_story(blank_body).await.unwrap_err(), Error::Validation("body"));

    assert_eq!(p.stories().await.unwrap().len(), before);
    // both attempts surfaced an error notification
    let kinds: Vec<_> = p.notifications().into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Error, NotificationKind::Error]);
}

#[tokio::test]
async fn create_story_prepends_and_renders() {
    let (p, presenter) = platform().await;
    let before = p.stories().await.unwrap().len();

    let story = p.create_story(valid_story()).await.unwrap();
    assert_eq!(story.read_minutes, 1);

    let stories = p.stories().await.unwrap();
    assert_eq!(stories.len(), before + 1);
    assert_eq!(stories[0].id, story.id);

    assert_eq!(presenter.rendered_into(STORIES_CONTAINER), vec!["story:Cordoba at night"]);
    let kinds: Vec<_> = p.notifications().into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Success]);
}

#[tokio::test]
async fn create_discussion_starts_with_zero_counters() {
    let (p, _) = platform().await;
    let d = p.create_discussion(valid_discussion()).await.unwrap();
    assert_eq!(d.votes.score(), 0);
    assert_eq!(d.replies, 0);
    assert_eq!(p.discussions().await.unwrap()[0].id, d.id);
}

#[tokio::test]
async fn double_poll_vote_is_rejected() {
    let (p, _) = platform().await;
    let target = ElementHandle::new();

    p.cast_poll_vote(seed::FEATURED_POLL, "science", target).await.unwrap();
    assert!(p.has_voted(seed::FEATURED_POLL, "science"));

    let err = p.cast_poll_vote(seed::FEATURED_POLL, "science", target).await.unwrap_err();
    assert_eq!(err, Error::AlreadyVoted);

    // success then warning
    let kinds: Vec<_> = p.notifications().into_iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Success, NotificationKind::Warning]);

    // the ledger blocks per option, not per poll
    p.cast_poll_vote(seed::FEATURED_POLL, "architecture", target).await.unwrap();
}

#[tokio::test]
async fn poll_percentages_stay_tied_to_counts_by_default() {
    let (p, _) = platform().await;
    let poll = p
        .cast_poll_vote(seed::FEATURED_POLL, "science", ElementHandle::new())
        .await
        .unwrap();
    assert_eq!(poll.total_votes, 4214);
    assert_eq!(poll.option("science").unwrap().percentage, 52);
}

#[tokio::test]
async fn legacy_nudge_mode_reproduces_the_old_drift() {
    let store = Arc::new(InMemStore::new());
    seed::seed(store.as_ref()).await.unwrap();
    let p = Platform::new(store, Arc::new(RecordingPresenter::new()))
        .with_percent_mode(PercentMode::LegacyNudge);

    let poll = p
        .cast_poll_vote(seed::FEATURED_POLL, "literature", ElementHandle::new())
        .await
        .unwrap();
    assert_eq!(poll.option("literature").unwrap().percentage, 21);
    assert_eq!(poll.option("science").unwrap().percentage, 51);
    assert_eq!(poll.option("architecture").unwrap().percentage, 27);
}

#[tokio::test]
async fn vote_toggle_retracts_and_switches() {
    let (p, _) = platform().await;
    let d = p.create_discussion(valid_discussion()).await.unwrap();
    let target = ElementHandle::new();

    // up then up again: back to neutral, net zero
    assert_eq!(
        p.toggle_discussion_vote(d.id, VoteDirection::Up, target).await.unwrap(),
        VoteState::UpVoted
    );
    assert_eq!(
        p.toggle_discussion_vote(d.id, VoteDirection::Up, target).await.unwrap(),
        VoteState::Neutral
    );
    assert_eq!(p.discussions().await.unwrap()[0].votes.score(), 0);
    assert_eq!(p.vote_state(d.id), VoteState::Neutral);

    // up then down: single-step switch
    p.toggle_discussion_vote(d.id, VoteDirection::Up, target).await.unwrap();
    assert_eq!(
        p.toggle_discussion_vote(d.id, VoteDirection::Down, target).await.unwrap(),
        VoteState::DownVoted
    );
    assert_eq!(p.discussions().await.unwrap()[0].votes.score(), -1);
}

#[tokio::test]
async fn vote_toggle_on_unknown_discussion_leaves_session_state_alone() {
    let (p, _) = platform().await;
    let err = p
        .toggle_discussion_vote(404, VoteDirection::Up, ElementHandle::new())
        .await
        .unwrap_err();
    assert_eq!(err, Error::NotFound);
    assert_eq!(p.vote_state(404), VoteState::Neutral);
}

#[tokio::test]
async fn category_filter_and_search() {
    let (p, _) = platform().await;
    p.create_story(valid_story()).await.unwrap();

    let all = p.filter_stories("all").await.unwrap();
    assert_eq!(all.len(), 2);

    let islamic = p.filter_stories("islamic").await.unwrap();
    assert_eq!(islamic.len(), 1);
    assert_eq!(islamic[0].category, Category::Islamic);

    // case-insensitive, title or summary
    assert_eq!(p.search_stories("CORDOBA").await.unwrap().len(), 1);
    assert_eq!(p.search_stories("street lamps").await.unwrap().len(), 1);
    assert!(p.search_stories("went dark").await.unwrap().is_empty()); // body is not searched
}

#[tokio::test]
async fn newsletter_signup_validates_the_address() {
    let (p, _) = platform().await;
    assert!(p.signup_newsletter("reader@example.com").is_ok());
    assert_eq!(p.signup_newsletter("not-an-address").unwrap_err(), Error::Validation("email"));
    assert_eq!(p.signup_newsletter("  ").unwrap_err(), Error::Validation("email"));
}

#[tokio::test(start_paused = true)]
async fn load_more_completes_after_the_simulated_delay() {
    let (p, presenter) = platform().await;

    assert!(p.load_more("stories"));
    assert!(p.load_pending("stories"));
    assert!(!p.load_more("stories")); // disabled while in flight

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!p.load_pending("stories"));
    let messages: Vec<_> = p.notifications().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["More content loaded!"]);
    assert_eq!(presenter.rendered_into(NOTIFICATIONS_CONTAINER).len(), 1);

    // trigger re-enabled
    assert!(p.load_more("stories"));
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_pending_timers() {
    let (p, presenter) = platform().await;
    p.load_more("discussions");
    p.teardown();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(p.notifications().is_empty());
    assert!(presenter.rendered_into(NOTIFICATIONS_CONTAINER).is_empty());
}

#[tokio::test(start_paused = true)]
async fn notifications_auto_dismiss() {
    let (p, _) = platform().await;
    p.signup_newsletter("reader@example.com").unwrap();
    assert_eq!(p.notifications().len(), 1);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(p.notifications().is_empty());
}

#[tokio::test]
async fn scroll_reveal_animates_each_element_once() {
    let (p, presenter) = platform().await;
    let a = ElementHandle::new();
    let b = ElementHandle::new();

    p.reveal_visible(&[a, b]);
    assert_eq!(presenter.animation_count(), 2);

    // already-revealed elements are not animated again
    p.reveal_visible(&[a, b]);
    assert_eq!(presenter.animation_count(), 2);
}

/// Store wrapper that suspends inside the poll write, widening the window
/// between the ledger check and the store update.
struct SlowPollStore(InMemStore);

#[async_trait::async_trait]
impl StoryStore for SlowPollStore {
    async fn list_stories(&self) -> StoreResult<Vec<Story>> {
        self.0.list_stories().await
    }
    async fn add_story(&self, new: NewStory) -> StoreResult<Story> {
        self.0.add_story(new).await
    }
}

#[async_trait::async_trait]
impl DiscussionStore for SlowPollStore {
    async fn list_discussions(&self) -> StoreResult<Vec<Discussion>> {
        self.0.list_discussions().await
    }
    async fn add_discussion(&self, new: NewDiscussion) -> StoreResult<Discussion> {
        self.0.add_discussion(new).await
    }
    async fn get_discussion(&self, id: Id) -> StoreResult<Discussion> {
        self.0.get_discussion(id).await
    }
    async fn apply_tally(&self, id: Id, up: i64, down: i64) -> StoreResult<Discussion> {
        self.0.apply_tally(id, up, down).await
    }
}

#[async_trait::async_trait]
impl PollStore for SlowPollStore {
    async fn get_poll(&self, slug: &str) -> StoreResult<Poll> {
        self.0.get_poll(slug).await
    }
    async fn put_poll(&self, poll: Poll) -> StoreResult<()> {
        self.0.put_poll(poll).await
    }
    async fn record_vote(&self, slug: &str, option: &str, mode: PercentMode) -> StoreResult<Poll> {
        tokio::task::yield_now().await;
        self.0.record_vote(slug, option, mode).await
    }
}

#[tokio::test]
async fn concurrent_duplicate_votes_only_count_once() {
    let inner = InMemStore::new();
    seed::seed(&inner).await.unwrap();
    let store = Arc::new(SlowPollStore(inner));
    let p = Platform::new(store.clone(), Arc::new(RecordingPresenter::new()));
    let target = ElementHandle::new();

    let (a, b) = tokio::join!(
        p.cast_poll_vote(seed::FEATURED_POLL, "science", target),
        p.cast_poll_vote(seed::FEATURED_POLL, "science", target),
    );

    let oks = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(oks, 1, "exactly one of two identical in-flight votes may land");
    let errs: Vec<_> = [a, b].into_iter().filter_map(|r| r.err()).collect();
    assert_eq!(errs, vec![Error::AlreadyVoted]);

    let poll = store.get_poll(seed::FEATURED_POLL).await.unwrap();
    assert_eq!(poll.total_votes, 4214);
    assert!(p.has_voted(seed::FEATURED_POLL, "science"));
}

#[tokio::test]
async fn failed_store_write_releases_the_ledger_claim() {
    let (p, _) = platform().await;
    let err = p
        .cast_poll_vote(seed::FEATURED_POLL, "calligraphy", ElementHandle::new())
        .await
        .unwrap_err();
    assert_eq!(err, Error::NotFound);
    // the rejected vote must not block a later, valid retry path
    assert!(!p.has_voted(seed::FEATURED_POLL, "calligraphy"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completed_loads_always_clear_their_pending_flag() {
    // an instant load completing on another worker must never leave the
    // section stuck in the pending state
    for _ in 0..200 {
        let store = Arc::new(InMemStore::new());
        let p = Platform::new(store, Arc::new(RecordingPresenter::new()))
            .with_load_delay(Duration::ZERO);
        assert!(p.load_more("stories"));
        tokio::time::timeout(Duration::from_secs(1), async {
            while p.load_pending("stories") {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("completed load must clear its pending flag");
        assert!(p.load_more("stories"));
    }
}

#[test]
fn sync_handlers_survive_without_a_runtime() {
    let store = Arc::new(InMemStore::new());
    let p = Platform::new(store, Arc::new(RecordingPresenter::new()));

    p.signup_newsletter("reader@example.com").unwrap();
    p.trending_topic_selected("The Abbasid era", ElementHandle::new());
    assert_eq!(p.notifications().len(), 2);
    assert!(p.dismiss_notification(p.notifications()[0].id));

    // no runtime to schedule the simulated delay on
    assert!(!p.load_more("stories"));
    assert!(!p.load_pending("stories"));
}

#[tokio::test]
async fn trending_topic_tap_surfaces_an_info_notice() {
    let (p, _) = platform().await;
    p.trending_topic_selected("The Abbasid era", ElementHandle::new());
    let n = &p.notifications()[0];
    assert_eq!(n.kind, NotificationKind::Info);
    assert!(n.message.contains("The Abbasid era"));
}
