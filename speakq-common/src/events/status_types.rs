//! Playback status type definitions
//!
//! Supporting types for the status notification broadcast after every
//! (debounced) playback state change.

use serde::{Deserialize, Serialize};

/// Externally observable playback phase
///
/// Exactly one phase is in effect at any time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// Nothing requested from the engine
    Idle,
    /// Utterance requested, engine has not reported start yet
    Queued,
    /// Engine is speaking
    Playing,
    /// Speech suspended (genuinely or synthetically)
    Paused,
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPhase::Idle => write!(f, "idle"),
            PlaybackPhase::Queued => write!(f, "queued"),
            PlaybackPhase::Playing => write!(f, "playing"),
            PlaybackPhase::Paused => write!(f, "paused"),
        }
    }
}

/// Snapshot of playback state and queue contents
///
/// Pure projection of the controller's state; carries only the text of
/// each queued item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub is_playing: bool,
    pub can_play: bool,
    pub can_pause: bool,
    pub can_reset: bool,
    pub has_next: bool,
    pub has_previous: bool,
    /// Text of every queued item, in playback order
    pub queue: Vec<String>,
    /// Current queue position (0 when the queue is empty)
    pub index: usize,
}

impl StatusSnapshot {
    /// Build a snapshot from the playing flag and the queue view
    pub fn new(is_playing: bool, queue: Vec<String>, index: usize) -> Self {
        let non_empty = !queue.is_empty();
        Self {
            is_playing,
            can_play: non_empty && !is_playing,
            can_pause: is_playing,
            can_reset: non_empty,
            has_next: non_empty && index + 1 < queue.len(),
            has_previous: non_empty && index > 0,
            queue,
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_disables_everything() {
        let snapshot = StatusSnapshot::new(false, Vec::new(), 0);
        assert!(!snapshot.can_play);
        assert!(!snapshot.can_pause);
        assert!(!snapshot.can_reset);
        assert!(!snapshot.has_next);
        assert!(!snapshot.has_previous);
    }

    #[test]
    fn test_snapshot_neighbours() {
        let queue = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let snapshot = StatusSnapshot::new(true, queue, 1);
        assert!(snapshot.has_next);
        assert!(snapshot.has_previous);
        assert!(snapshot.can_pause);
        assert!(!snapshot.can_play);
        assert!(snapshot.can_reset);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = StatusSnapshot::new(false, vec!["hi".to_string()], 0);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["canPlay"], true);
        assert_eq!(json["isPlaying"], false);
        assert_eq!(json["queue"][0], "hi");
    }
}
