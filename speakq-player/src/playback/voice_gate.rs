//! Voice catalog gate
//!
//! One-shot gate that opens once the engine's voice catalog is available.
//! Nothing is dispatched to the engine before it opens.
//!
//! **Responsibilities:**
//! - Resolve at most once, always one scheduler tick after the catalog is seen
//! - Hand every waiter the same voice list
//! - Broadcast `VoicesLoaded` on resolution

use crate::engine::{SpeechEngine, Voice};
use speakq_common::events::{EventBus, SpeakqEvent};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::info;

type Catalog = Option<Arc<Vec<Voice>>>;

#[derive(Clone)]
pub struct VoiceCatalogGate {
    tx: Arc<watch::Sender<Catalog>>,
    rx: watch::Receiver<Catalog>,
}

impl VoiceCatalogGate {
    /// Create the gate and arm it against `engine`
    ///
    /// Must be called from within a tokio runtime. The engine may fire its
    /// voices-changed listener from any thread.
    pub fn new(engine: &Arc<dyn SpeechEngine>, bus: EventBus) -> Self {
        let (tx, rx) = watch::channel(None);
        let gate = Self {
            tx: Arc::new(tx),
            rx,
        };

        let runtime = Handle::current();
        let voices = engine.voices();
        if !voices.is_empty() {
            let tx = Arc::clone(&gate.tx);
            runtime.spawn(async move {
                tokio::task::yield_now().await;
                resolve(&tx, voices, &bus);
            });
        } else {
            let tx = Arc::clone(&gate.tx);
            let weak_engine = Arc::downgrade(engine);
            engine.on_voices_changed(Box::new(move || {
                runtime.spawn(async move {
                    tokio::task::yield_now().await;
                    let voices = weak_engine
                        .upgrade()
                        .map(|engine| engine.voices())
                        .unwrap_or_default();
                    resolve(&tx, voices, &bus);
                });
            }));
        }

        gate
    }

    /// Wait until the catalog is available
    pub async fn ready(&self) -> Arc<Vec<Voice>> {
        let mut rx = self.rx.clone();
        let voices = match rx.wait_for(Option::is_some).await {
            Ok(catalog) => (*catalog).clone(),
            Err(_) => None,
        };
        voices.unwrap_or_default()
    }

    /// Catalog if the gate has already opened
    pub fn voices(&self) -> Option<Arc<Vec<Voice>>> {
        self.rx.borrow().clone()
    }
}

fn resolve(tx: &watch::Sender<Catalog>, voices: Vec<Voice>, bus: &EventBus) {
    let voices = Arc::new(voices);
    let opened = tx.send_if_modified(|catalog| {
        if catalog.is_some() {
            return false;
        }
        *catalog = Some(Arc::clone(&voices));
        true
    });

    if opened {
        info!("Voice catalog loaded with {} voices", voices.len());
        bus.emit_lossy(SpeakqEvent::VoicesLoaded {
            voices: voices.as_ref().clone(),
            timestamp: chrono::Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::SimulatedEngine;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_populated_catalog_resolves_after_a_tick() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let engine: Arc<dyn SpeechEngine> = Arc::new(SimulatedEngine::new(&EngineConfig::default()));

        let gate = VoiceCatalogGate::new(&engine, bus);
        assert!(gate.voices().is_none());

        let voices = gate.ready().await;
        assert!(!voices.is_empty());
        assert!(gate.voices().is_some());
        assert!(matches!(rx.recv().await.unwrap(), SpeakqEvent::VoicesLoaded { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_catalog_resolves_once_for_all_waiters() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let engine: Arc<dyn SpeechEngine> = Arc::new(
            SimulatedEngine::new(&EngineConfig::default())
                .with_catalog_delay(Duration::from_millis(100)),
        );

        let gate = VoiceCatalogGate::new(&engine, bus);
        let first = tokio::spawn({
            let gate = gate.clone();
            async move { gate.ready().await }
        });
        let second = tokio::spawn({
            let gate = gate.clone();
            async move { gate.ready().await }
        });

        let first = first.await.unwrap();
        let second = second.await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(matches!(rx.recv().await.unwrap(), SpeakqEvent::VoicesLoaded { .. }));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }
}
