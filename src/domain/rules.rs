//! Field-level and cross-entity rules checked on top of the typed schemas.
//!
//! Every check returns `Err(ApiError::RuleViolation)` naming the field that failed.

use crate::domain::model::{Comment, ItemId, Story};
use crate::utils::error::{ApiError, Result};
use std::collections::HashSet;

/// 2007-01-01T00:00:00Z. No item predates the service.
pub const HN_LAUNCH_TIMESTAMP: i64 = 1_167_609_600;
pub const FUTURE_SKEW_SECS: i64 = 3_600;
pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 300;
pub const AUTHOR_MAX_CHARS: usize = 50;
pub const COMMENT_TEXT_MAX_CHARS: usize = 10_000;

pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// True when the text has cased letters and all of them are uppercase.
pub fn is_all_uppercase(text: &str) -> bool {
    let mut cased = text
        .chars()
        .filter(|c| c.is_uppercase() || c.is_lowercase())
        .peekable();
    cased.peek().is_some() && cased.all(char::is_uppercase)
}

fn check_trimmed(field: &str, value: &str) -> Result<()> {
    if value.trim() != value {
        return Err(ApiError::rule(
            field,
            "must not have leading/trailing whitespace",
        ));
    }
    Ok(())
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min {
        return Err(ApiError::rule(
            field,
            format!("must be at least {} characters, got {}", min, len),
        ));
    }
    if len > max {
        return Err(ApiError::rule(
            field,
            format!("must be at most {} characters, got {}", max, len),
        ));
    }
    Ok(())
}

pub fn check_title(title: &str) -> Result<()> {
    check_length("title", title, TITLE_MIN_CHARS, TITLE_MAX_CHARS)?;
    check_trimmed("title", title)?;
    if is_all_uppercase(title) {
        return Err(ApiError::rule("title", "must not be all uppercase"));
    }
    Ok(())
}

pub fn check_author(author: &str) -> Result<()> {
    check_length("by", author, 1, AUTHOR_MAX_CHARS)?;
    check_trimmed("by", author)
}

/// Comment bodies are HTML; tags count toward the length.
pub fn check_comment_text(text: &str) -> Result<()> {
    check_length("text", text, 1, COMMENT_TEXT_MAX_CHARS)
}

fn check_not_in_future(time: i64, now: i64) -> Result<()> {
    if time > now + FUTURE_SKEW_SECS {
        return Err(ApiError::rule(
            "time",
            format!(
                "{} is in the future (now {}, allowed skew {}s)",
                time, now, FUTURE_SKEW_SECS
            ),
        ));
    }
    Ok(())
}

pub fn check_story_timestamp(time: i64, now: i64) -> Result<()> {
    if time < HN_LAUNCH_TIMESTAMP {
        return Err(ApiError::rule(
            "time",
            format!("{} is before the service launched", time),
        ));
    }
    check_not_in_future(time, now)
}

pub fn check_comment_timestamp(comment_time: i64, parent_time: i64, now: i64) -> Result<()> {
    if comment_time < parent_time {
        return Err(ApiError::rule(
            "time",
            format!(
                "comment posted at {} predates its parent at {}",
                comment_time, parent_time
            ),
        ));
    }
    check_not_in_future(comment_time, now)
}

/// The comment points at the story and the story lists the comment.
pub fn check_parent_link(story: &Story, comment: &Comment) -> Result<()> {
    if comment.parent != story.id {
        return Err(ApiError::rule(
            "parent",
            format!(
                "comment {} points at {}, expected story {}",
                comment.id, comment.parent, story.id
            ),
        ));
    }
    if !story.kids().contains(&comment.id) {
        return Err(ApiError::rule(
            "kids",
            format!("story {} does not list comment {}", story.id, comment.id),
        ));
    }
    Ok(())
}

pub fn check_story(story: &Story, now: i64) -> Result<()> {
    check_title(&story.title)?;
    check_author(&story.by)?;
    check_story_timestamp(story.time, now)
}

pub fn check_comment(comment: &Comment, story: &Story, now: i64) -> Result<()> {
    check_comment_text(&comment.text)?;
    check_author(&comment.by)?;
    check_comment_timestamp(comment.time, story.time, now)?;
    check_parent_link(story, comment)
}

pub fn check_unique_ids(ids: &[ItemId]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            return Err(ApiError::rule("stories", format!("duplicate id {}", id)));
        }
    }
    Ok(())
}

/// `limited` must be exactly the first `limited.len()` entries of `full`.
pub fn check_prefix(limited: &[ItemId], full: &[ItemId]) -> Result<()> {
    if !full.starts_with(limited) {
        return Err(ApiError::rule(
            "stories",
            format!(
                "limited listing of {} is not a prefix of the full listing of {}",
                limited.len(),
                full.len()
            ),
        ));
    }
    Ok(())
}

/// Share of `first` that also appears in `second`.
pub fn overlap_ratio(first: &[ItemId], second: &[ItemId]) -> f64 {
    if first.is_empty() {
        return 1.0;
    }
    let second: HashSet<_> = second.iter().collect();
    let common: HashSet<_> = first.iter().filter(|id| second.contains(id)).collect();
    common.len() as f64 / first.len() as f64
}
