//! Initial content matching what the platform boots with: one featured poll
//! and one featured story.

use crate::models::{Category, NewStory, Poll, PollOption};
use crate::store::{Store, StoreResult};

pub const FEATURED_POLL: &str = "islamic-achievements";

/// The featured poll. Option counts are sized so the derived percentages
/// come out at the platform's advertised 52/28/20 split.
pub fn featured_poll() -> Poll {
    let mut poll = Poll {
        slug: FEATURED_POLL.to_string(),
        options: vec![
            PollOption { key: "science".into(), votes: 2191, percentage: 0 },
            PollOption { key: "architecture".into(), votes: 1180, percentage: 0 },
            PollOption { key: "literature".into(), votes: 842, percentage: 0 },
        ],
        total_votes: 4213,
        active: true,
    };
    poll.recompute_percentages();
    poll
}

pub fn featured_story() -> NewStory {
    NewStory {
        title: "The Islamic Golden Age: achievements that changed the course of history"
            .to_string(),
        category: Category::Islamic,
        summary: "Discover how Islamic civilization shaped the development of science, \
                  philosophy, and medicine..."
            .to_string(),
        body: "From the House of Wisdom in Baghdad to the observatories of Samarkand, \
               scholars of the Islamic Golden Age translated, preserved, and extended \
               the knowledge of the ancient world."
            .to_string(),
        author: "Dr. Ahmad Al-Zahrawi".to_string(),
    }
}

/// Load the boot content into a store.
pub async fn seed(store: &dyn Store) -> StoreResult<()> {
    store.put_poll(featured_poll()).await?;
    store.add_story(featured_story()).await?;
    Ok(())
}
