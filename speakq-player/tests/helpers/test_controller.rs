//! Controller wrapper for integration tests
//!
//! Spawns a controller over a `FakeEngine` with default timing and keeps a
//! receiver subscribed from before construction, so the initial status
//! snapshot is observable.

use super::fake_engine::FakeEngine;
use speakq_common::events::{EventBus, PlaybackPhase, SpeakqEvent, StatusSnapshot};
use speakq_player::config::TimingConfig;
use speakq_player::playback::{AddOptions, InsertionPolicy};
use speakq_player::{Controller, ControllerHandle};
use std::time::Duration;
use tokio::sync::broadcast;

/// Let spawned tasks run; advances the paused clock by one millisecond
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub struct TestController {
    pub engine: FakeEngine,
    pub handle: ControllerHandle,
    pub events: broadcast::Receiver<SpeakqEvent>,
}

impl TestController {
    /// Controller over an engine with a populated catalog, gate already open
    pub async fn start() -> Self {
        Self::with_engine(FakeEngine::new()).await
    }

    pub async fn with_engine(engine: FakeEngine) -> Self {
        let bus = EventBus::new(256);
        let events = bus.subscribe();
        let handle = Controller::spawn(engine.as_engine(), TimingConfig::default(), bus)
            .expect("controller should start");
        settle().await;
        Self {
            engine,
            handle,
            events,
        }
    }

    pub async fn add(&self, text: &str) {
        self.add_with(text, InsertionPolicy::Append).await;
    }

    pub async fn add_with(&self, text: &str, queue: InsertionPolicy) {
        self.handle
            .add(
                text,
                AddOptions {
                    queue,
                    ..AddOptions::default()
                },
            )
            .await
            .expect("add should succeed");
    }

    /// Snapshot after every callback posted so far has been applied
    pub async fn status(&self) -> StatusSnapshot {
        self.handle.status().await.expect("controller running")
    }

    pub async fn phase(&self) -> PlaybackPhase {
        self.handle.phase().await.expect("controller running")
    }

    pub async fn queue(&self) -> Vec<String> {
        self.status().await.queue
    }

    /// Fire the start callback of the latest utterance and let it apply
    pub async fn start_speaking(&self) {
        self.engine.fire_start();
        self.status().await;
    }

    /// Drain every received status notification
    pub fn take_statuses(&mut self) -> Vec<StatusSnapshot> {
        let mut statuses = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let SpeakqEvent::StatusChanged { status, .. } = event {
                statuses.push(status);
            }
        }
        statuses
    }

    /// Drain and count voices-loaded notifications
    pub fn take_voice_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events.try_recv() {
            if matches!(event, SpeakqEvent::VoicesLoaded { .. }) {
                count += 1;
            }
        }
        count
    }
}
