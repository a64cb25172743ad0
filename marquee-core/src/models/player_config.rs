use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerMode {
    Standard,
    Kiosk,
}

impl fmt::Display for PlayerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerMode::Standard => write!(f, "standard"),
            PlayerMode::Kiosk => write!(f, "kiosk"),
        }
    }
}

impl FromStr for PlayerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(PlayerMode::Standard),
            "kiosk" => Ok(PlayerMode::Kiosk),
            _ => Err(format!(
                "Invalid player mode '{}'. Valid options: standard, kiosk",
                s
            )),
        }
    }
}

/// Per-player playback settings, replicated with the bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    pub autoplay: bool,
    pub muted: bool,
    pub loop_playback: bool,
    /// Last-played item; a weak reference that may dangle
    pub current_item_id: Option<Uuid>,
    /// Whether schedule rules are consulted before the playlist fallback
    pub use_schedule: bool,
    /// BCP 47 language tag passed to embed players
    pub language: String,
    pub mode: PlayerMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            muted: true,
            loop_playback: false,
            current_item_id: None,
            use_schedule: true,
            language: "en".to_string(),
            mode: PlayerMode::Standard,
        }
    }
}

impl fmt::Display for PlayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "autoplay:      {}", self.autoplay)?;
        writeln!(f, "muted:         {}", self.muted)?;
        writeln!(f, "loop:          {}", self.loop_playback)?;
        writeln!(f, "use-schedule:  {}", self.use_schedule)?;
        writeln!(f, "language:      {}", self.language)?;
        writeln!(f, "mode:          {}", self.mode)?;
        match self.current_item_id {
            Some(id) => writeln!(f, "current-item:  {}", id),
            None => writeln!(f, "current-item:  (none)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert!(config.autoplay);
        assert!(config.muted);
        assert!(!config.loop_playback);
        assert!(config.use_schedule);
        assert_eq!(config.language, "en");
        assert_eq!(config.mode, PlayerMode::Standard);
        assert!(config.current_item_id.is_none());
    }

    #[test]
    fn test_player_mode_from_str() {
        assert_eq!(PlayerMode::from_str("kiosk").unwrap(), PlayerMode::Kiosk);
        assert_eq!(
            PlayerMode::from_str("Standard").unwrap(),
            PlayerMode::Standard
        );
        assert!(PlayerMode::from_str("cinema").is_err());
    }

    #[test]
    fn test_player_mode_json() {
        let json = serde_json::to_string(&PlayerMode::Kiosk).unwrap();
        assert_eq!(json, "\"kiosk\"");
        let parsed: PlayerMode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, PlayerMode::Kiosk);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = PlayerConfig {
            current_item_id: Some(Uuid::new_v4()),
            language: "de".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: PlayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_display() {
        let config = PlayerConfig::default();
        let output = format!("{}", config);
        assert!(output.contains("autoplay:      true"));
        assert!(output.contains("current-item:  (none)"));
    }
}
