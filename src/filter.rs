//! Pure visibility predicates over the story collection. No ranking, no
//! pagination; these decide which records the presentation layer shows.

use crate::models::Story;

pub const ALL_CATEGORIES: &str = "all";

/// `"all"` selects every story; any other tag is an exact match against the
/// story's category slug. Tags outside the fixed set match nothing.
pub fn matches_category(story: &Story, tag: &str) -> bool {
    tag == ALL_CATEGORIES || story.category.slug() == tag
}

/// Case-insensitive substring match on title or summary. The body is not
/// searched. An empty query matches everything.
pub fn matches_text(story: &Story, query: &str) -> bool {
    let needle = query.to_lowercase();
    story.title.to_lowercase().contains(&needle)
        || story.summary.to_lowercase().contains(&needle)
}

pub fn by_category<'a>(stories: &'a [Story], tag: &str) -> Vec<&'a Story> {
    stories.iter().filter(|s| matches_category(s, tag)).collect()
}

pub fn by_text<'a>(stories: &'a [Story], query: &str) -> Vec<&'a Story> {
    stories.iter().filter(|s| matches_text(s, query)).collect()
}
