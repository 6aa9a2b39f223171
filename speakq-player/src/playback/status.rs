//! Debounced status emitter
//!
//! Coalesces bursts of state changes into a single `StatusChanged`
//! broadcast carrying the last snapshot of the burst. The very first
//! snapshot bypasses the debounce so listeners get an initial state at
//! construction.

use speakq_common::events::{EventBus, SpeakqEvent, StatusSnapshot};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

pub struct StatusEmitter {
    bus: EventBus,
    tx: mpsc::UnboundedSender<StatusSnapshot>,
    primed: bool,
}

impl StatusEmitter {
    /// Create the emitter and spawn its debounce task
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(bus: EventBus, quiet_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(debounce(rx, bus.clone(), quiet_period));
        Self {
            bus,
            tx,
            primed: false,
        }
    }

    /// Record a new snapshot
    ///
    /// The first call broadcasts immediately; later calls are broadcast once
    /// `quiet_period` passes with no newer snapshot.
    pub fn notify(&mut self, snapshot: StatusSnapshot) {
        if !self.primed {
            self.primed = true;
            broadcast(&self.bus, snapshot);
            return;
        }
        let _ = self.tx.send(snapshot);
    }
}

async fn debounce(
    mut rx: mpsc::UnboundedReceiver<StatusSnapshot>,
    bus: EventBus,
    quiet_period: Duration,
) {
    while let Some(mut latest) = rx.recv().await {
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(snapshot) => {
                        trace!("Status superseded within quiet period");
                        latest = snapshot;
                    }
                    None => break,
                },
                _ = tokio::time::sleep(quiet_period) => break,
            }
        }
        broadcast(&bus, latest);
    }
    debug!("Status emitter closed");
}

fn broadcast(bus: &EventBus, status: StatusSnapshot) {
    bus.emit_lossy(SpeakqEvent::StatusChanged {
        status,
        timestamp: chrono::Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn snapshot(index: usize) -> StatusSnapshot {
        StatusSnapshot::new(true, vec!["a".into(), "b".into(), "c".into()], index)
    }

    fn status_of(event: SpeakqEvent) -> StatusSnapshot {
        match event {
            SpeakqEvent::StatusChanged { status, .. } => status,
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_notify_is_immediate() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let mut emitter = StatusEmitter::new(bus, Duration::from_millis(8));

        emitter.notify(snapshot(0));

        assert_eq!(status_of(rx.try_recv().unwrap()).index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_last_snapshot_once() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let mut emitter = StatusEmitter::new(bus, Duration::from_millis(8));
        emitter.notify(snapshot(0));
        rx.try_recv().unwrap();

        for index in [1, 2, 1, 2] {
            emitter.notify(snapshot(index));
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(status_of(rx.try_recv().unwrap()).index, 2);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_emit_separately() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let mut emitter = StatusEmitter::new(bus, Duration::from_millis(8));
        emitter.notify(snapshot(0));
        rx.try_recv().unwrap();

        emitter.notify(snapshot(1));
        tokio::time::sleep(Duration::from_millis(50)).await;
        emitter.notify(snapshot(2));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(status_of(rx.try_recv().unwrap()).index, 1);
        assert_eq!(status_of(rx.try_recv().unwrap()).index, 2);
    }
}
