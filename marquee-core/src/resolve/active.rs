//! Active-content resolution: which item should be playing right now.

use chrono::NaiveDateTime;

use crate::models::{ContentItem, PlayerConfig, ScheduleRule};

/// Resolves the item that should be playing at `now`.
///
/// When scheduling is enabled, the first rule in table order whose window
/// covers `now` wins; overlapping rules are not ranked beyond table order.
/// A matching rule whose target is missing from the playlist yields `None`
/// rather than silently falling back, so the caller keeps fallback policy.
/// With no matching rule (or scheduling disabled), the playlist item named
/// by `config.current_item_id` is returned if present, else the first
/// playlist item, else `None`.
///
/// Pure over its inputs; re-run on every tick and every bundle change.
pub fn resolve<'a>(
    now: NaiveDateTime,
    config: &PlayerConfig,
    schedules: &[ScheduleRule],
    playlist: &'a [ContentItem],
) -> Option<&'a ContentItem> {
    if config.use_schedule {
        if let Some(rule) = schedules.iter().find(|rule| rule.matches(now)) {
            // Dangling target: no silent fallback
            return playlist.iter().find(|item| item.id == rule.target_item_id);
        }
    }

    fallback(config, playlist)
}

fn fallback<'a>(config: &PlayerConfig, playlist: &'a [ContentItem]) -> Option<&'a ContentItem> {
    if let Some(current) = config.current_item_id {
        if let Some(item) = playlist.iter().find(|item| item.id == current) {
            return Some(item);
        }
    }
    playlist.first()
}
