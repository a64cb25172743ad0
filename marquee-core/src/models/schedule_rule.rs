use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A day/time window bound to a specific content item.
///
/// Rules reference playlist items by ID (live lookup) rather than embedding
/// them; removing an item does not remove rules that point at it, so a
/// rule's target may dangle and resolve to nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleRule {
    pub id: Uuid,
    pub name: String,
    /// Target playlist item (resolved at evaluation time, may dangle)
    pub target_item_id: Uuid,
    /// Days of week this rule applies to, 0 = Sunday .. 6 = Saturday
    pub days: Vec<u8>,
    /// Window start, minute precision, inclusive
    pub start: NaiveTime,
    /// Window end, minute precision, inclusive; same-day only
    pub end: NaiveTime,
    pub active: bool,
}

impl ScheduleRule {
    pub fn new(
        name: impl Into<String>,
        target_item_id: Uuid,
        days: Vec<u8>,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target_item_id,
            days,
            start,
            end,
            active: true,
        }
    }

    /// Whether this rule's window covers the given instant.
    ///
    /// Times are compared at minute precision, inclusive on both ends.
    /// A rule with `start > end` never matches (no overnight wraparound).
    pub fn matches(&self, at: NaiveDateTime) -> bool {
        if !self.active {
            return false;
        }

        let weekday = at.weekday().num_days_from_sunday() as u8;
        if !self.days.contains(&weekday) {
            return false;
        }

        let minute = at
            .time()
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or_else(|| at.time());

        self.start <= minute && minute <= self.end
    }
}

impl fmt::Display for ScheduleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<&str> = self.days.iter().map(|d| day_name(*d)).collect();
        write!(
            f,
            "{} [{}] {}-{} ({})",
            self.name,
            days.join(","),
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            if self.active { "active" } else { "disabled" }
        )
    }
}

/// Short name for a 0-based day-of-week (0 = Sunday).
pub fn day_name(day: u8) -> &'static str {
    match day {
        0 => "sun",
        1 => "mon",
        2 => "tue",
        3 => "wed",
        4 => "thu",
        5 => "fri",
        6 => "sat",
        _ => "?",
    }
}
