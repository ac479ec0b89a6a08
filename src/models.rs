use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i64;

/// The five fixed story categories of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Islamic,
    Scientists,
    Cultural,
    Leaders,
    Healthcare,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Islamic,
        Category::Scientists,
        Category::Cultural,
        Category::Leaders,
        Category::Healthcare,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Category::Islamic => "islamic",
            Category::Scientists => "scientists",
            Category::Cultural => "cultural",
            Category::Leaders => "leaders",
            Category::Healthcare => "healthcare",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Islamic => "The Islamic Era",
            Category::Scientists => "Arab Scientists",
            Category::Cultural => "Cultural Heritage",
            Category::Leaders => "Great Leaders",
            Category::Healthcare => "Arab Medicine",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.slug() == slug)
    }
}

/// Display label for a category tag, falling back to a generic label for
/// tags outside the fixed set.
pub fn category_label(tag: &str) -> &'static str {
    Category::from_slug(tag).map(Category::label).unwrap_or("General")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: Id,
    pub title: String,
    pub category: Category,
    pub summary: String,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Estimated reading time in minutes, derived from the body at creation.
    pub read_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStory {
    pub title: String,
    pub category: Category,
    pub summary: String,
    pub body: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    pub id: Id,
    pub title: String,
    pub topic: String,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub votes: VoteTally,
    pub replies: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiscussion {
    pub title: String,
    pub topic: String,
    pub body: String,
    pub author: String,
}

/// Up/down counters for a discussion. The displayed score is the net value;
/// a downvote counts against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub up: i64,
    pub down: i64,
}

impl VoteTally {
    pub fn score(self) -> i64 {
        self.up - self.down
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

/// Per-(discussion, session) vote state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteState {
    #[default]
    Neutral,
    UpVoted,
    DownVoted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub slug: String,
    pub options: Vec<PollOption>,
    pub total_votes: i64,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub key: String,
    pub votes: i64,
    /// Displayed percentage. Derived from the raw counts by
    /// [`Poll::recompute_percentages`], or drifted by the legacy
    /// [`Poll::nudge_percentages`] mode.
    pub percentage: u8,
}

impl Poll {
    pub fn option(&self, key: &str) -> Option<&PollOption> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.option(key).is_some()
    }

    /// Derive display percentages from the raw vote counts.
    pub fn recompute_percentages(&mut self) {
        for opt in &mut self.options {
            let pct = if self.total_votes <= 0 {
                0.0
            } else {
                opt.votes as f64 / self.total_votes as f64 * 100.0
            };
            opt.percentage = pct.round().min(100.0) as u8;
        }
    }

    /// Legacy display behavior: bump the chosen option one point (capped at
    /// 100) and drop every other option one point (floored at 0). The sum is
    /// not kept at 100, so repeated votes drift away from the raw counts.
    pub fn nudge_percentages(&mut self, chosen: &str) {
        for opt in &mut self.options {
            if opt.key == chosen {
                opt.percentage = opt.percentage.saturating_add(1).min(100);
            } else {
                opt.percentage = opt.percentage.saturating_sub(1);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Id,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
}

/// Reading time estimate: one minute per 200 words, rounded up, never zero.
pub fn read_minutes(body: &str) -> u32 {
    const WORDS_PER_MINUTE: usize = 200;
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}
