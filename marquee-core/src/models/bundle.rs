use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content_item::ContentItem;
use super::player_config::PlayerConfig;
use super::schedule_rule::ScheduleRule;

/// The unit of replication: one record holding everything a player needs.
///
/// Bundles are replaced whole, never patched. Conflicts between writers are
/// resolved by last-writer-wins on `last_update`; an incoming bundle with an
/// older or equal timestamp is discarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Bundle {
    #[serde(default)]
    pub config: PlayerConfig,
    #[serde(default)]
    pub playlist: Vec<ContentItem>,
    #[serde(default)]
    pub schedules: Vec<ScheduleRule>,
    /// Epoch milliseconds of the last authoring write
    #[serde(default)]
    pub last_update: i64,
}

impl Bundle {
    /// Looks up a playlist item by ID.
    ///
    /// Schedule rules and `current_item_id` reference items this way; an
    /// absent ID is a dangling reference and yields `None`.
    pub fn find_item(&self, id: &Uuid) -> Option<&ContentItem> {
        self.playlist.iter().find(|item| item.id == *id)
    }

    pub fn find_rule(&self, id: &Uuid) -> Option<&ScheduleRule> {
        self.schedules.iter().find(|rule| rule.id == *id)
    }

    /// True if this bundle wins last-writer-wins against `other`.
    pub fn supersedes(&self, other: &Bundle) -> bool {
        self.last_update > other.last_update
    }

    /// Stamps this bundle as newly written.
    ///
    /// Strictly increases `last_update` even if the wall clock lags behind
    /// the previous write, so a client with a skewed clock still produces
    /// monotonic timestamps for its own writes.
    pub fn touch(&mut self) {
        let now = Utc::now().timestamp_millis();
        self.last_update = now.max(self.last_update + 1);
    }

    /// Picks the startup winner between cached and remote copies.
    ///
    /// The remote copy wins ties; missing-both resolves to the empty default.
    pub fn newest(local: Option<Bundle>, remote: Option<Bundle>) -> Bundle {
        match (local, remote) {
            (Some(local), Some(remote)) => {
                if remote.last_update >= local.last_update {
                    remote
                } else {
                    local
                }
            }
            (Some(local), None) => local,
            (None, Some(remote)) => remote,
            (None, None) => Bundle::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content_item::ContentKind;
    use chrono::NaiveTime;

    fn item(title: &str) -> ContentItem {
        ContentItem::new(
            title,
            ContentKind::Direct {
                url: format!("https://example.com/{}.mp4", title),
            },
        )
    }

    fn stamped(last_update: i64) -> Bundle {
        Bundle {
            last_update,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_default() {
        let bundle = Bundle::default();
        assert!(bundle.playlist.is_empty());
        assert!(bundle.schedules.is_empty());
        assert_eq!(bundle.last_update, 0);
    }

    #[test]
    fn test_find_item() {
        let a = item("a");
        let id = a.id;
        let bundle = Bundle {
            playlist: vec![a, item("b")],
            ..Default::default()
        };

        assert!(bundle.find_item(&id).is_some());
        assert!(bundle.find_item(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_find_rule() {
        let rule = ScheduleRule::new(
            "r",
            Uuid::new_v4(),
            vec![1],
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        );
        let id = rule.id;
        let bundle = Bundle {
            schedules: vec![rule],
            ..Default::default()
        };

        assert!(bundle.find_rule(&id).is_some());
        assert!(bundle.find_rule(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_supersedes() {
        let older = stamped(100);
        let newer = stamped(105);

        assert!(newer.supersedes(&older));
        assert!(!older.supersedes(&newer));
        // Equal timestamps never supersede
        assert!(!older.supersedes(&older.clone()));
    }

    #[test]
    fn test_touch_is_strictly_monotonic() {
        // Simulate a clock far ahead of the wall clock
        let mut bundle = stamped(i64::MAX - 10);

        bundle.touch();
        assert_eq!(bundle.last_update, i64::MAX - 9);

        let before = bundle.last_update;
        bundle.touch();
        assert!(bundle.last_update > before);
    }

    #[test]
    fn test_touch_uses_wall_clock_when_ahead() {
        let mut bundle = Bundle::default();
        bundle.touch();
        assert!(bundle.last_update > 1_700_000_000_000); // past 2023
    }

    #[test]
    fn test_newest_prefers_remote_on_tie() {
        let mut local = stamped(100);
        local.config.language = "local".to_string();
        let mut remote = stamped(100);
        remote.config.language = "remote".to_string();

        let winner = Bundle::newest(Some(local), Some(remote));
        assert_eq!(winner.config.language, "remote");
    }

    #[test]
    fn test_newest_keeps_newer_local() {
        let winner = Bundle::newest(Some(stamped(200)), Some(stamped(100)));
        assert_eq!(winner.last_update, 200);
    }

    #[test]
    fn test_newest_with_single_source() {
        assert_eq!(Bundle::newest(Some(stamped(50)), None).last_update, 50);
        assert_eq!(Bundle::newest(None, Some(stamped(50))).last_update, 50);
        assert_eq!(Bundle::newest(None, None), Bundle::default());
    }

    #[test]
    fn test_bundle_json_roundtrip() {
        let a = item("a");
        let target = a.id;
        let mut bundle = Bundle {
            playlist: vec![a, item("b")],
            schedules: vec![ScheduleRule::new(
                "Weekday mornings",
                target,
                vec![1, 2, 3, 4, 5],
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            )],
            ..Default::default()
        };
        bundle.config.current_item_id = Some(target);
        bundle.touch();

        let json = serde_json::to_string(&bundle).unwrap();
        let parsed: Bundle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let bundle: Bundle = serde_json::from_str("{}").unwrap();
        assert_eq!(bundle, Bundle::default());
    }
}
