//! Playback-related type definitions

use serde::{Deserialize, Serialize};

/// Playback state enumeration
///
/// `Idle` covers both "nothing selected" and "selected but not loaded";
/// the snapshot's `current_track` tells the two apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Session requested, not yet confirmed playing
    Loading,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Loading => write!(f, "loading"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_state_serde_lowercase() {
        let json = serde_json::to_string(&PlaybackState::Loading).unwrap();
        assert_eq!(json, "\"loading\"");

        let parsed: PlaybackState = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(parsed, PlaybackState::Paused);
    }

    #[test]
    fn test_playback_state_default_is_idle() {
        assert_eq!(PlaybackState::default(), PlaybackState::Idle);
        assert!(!PlaybackState::default().is_playing());
        assert!(PlaybackState::Playing.is_playing());
    }
}
