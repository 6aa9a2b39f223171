//! Event types for the speakq event system
//!
//! Provides shared event definitions and the EventBus used to broadcast
//! controller notifications to external listeners.

// Sub-modules (supporting types)
mod status_types;
mod voice_types;

pub use status_types::{PlaybackPhase, StatusSnapshot};
pub use voice_types::VoiceInfo;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// speakq event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to whatever layer adapts the controller to the outside world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpeakqEvent {
    /// Playback status changed
    ///
    /// Emitted once at controller construction, then at most once per
    /// quiet period while state keeps changing.
    StatusChanged {
        /// Snapshot of playback state and queue
        status: StatusSnapshot,
        /// When the snapshot was broadcast
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Engine voice catalog became available
    ///
    /// Emitted exactly once per controller.
    VoicesLoaded {
        /// Voices reported by the engine
        voices: Vec<VoiceInfo>,
        /// When the catalog resolved
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SpeakqEvent {
    /// Event name as used by external listeners
    pub fn name(&self) -> &'static str {
        match self {
            SpeakqEvent::StatusChanged { .. } => "status",
            SpeakqEvent::VoicesLoaded { .. } => "voices",
        }
    }
}

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use speakq_common::events::{EventBus, SpeakqEvent, StatusSnapshot};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(SpeakqEvent::StatusChanged {
///     status: StatusSnapshot::default(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SpeakqEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events;
    ///   must be non-zero
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SpeakqEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SpeakqEvent) {
        let _ = self.tx.send(event);
    }
}
