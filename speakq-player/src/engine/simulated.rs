//! Simulated speech engine
//!
//! Stands in for a platform synthesizer: "speaking" is a timer whose length
//! follows word count and rate. Can be configured to ignore pause requests,
//! as some runtimes do, and to deliver its voice catalog late.

use super::{SpeechEngine, Utterance, UtteranceHandlers, Voice};
use crate::config::EngineConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Shortest simulated utterance
const MIN_UTTERANCE: Duration = Duration::from_millis(200);

struct Active {
    handlers: UtteranceHandlers,
    task: Option<JoinHandle<()>>,
    remaining: Duration,
    resumed_at: Instant,
}

struct SimState {
    active: Option<Active>,
    catalog_loaded: bool,
}

/// Timer-driven engine used by the `speakq` binary
#[derive(Clone)]
pub struct SimulatedEngine {
    state: Arc<Mutex<SimState>>,
    voices: Arc<Vec<Voice>>,
    supports_pause: bool,
    words_per_minute: u32,
    catalog_delay: Option<Duration>,
}

impl SimulatedEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                active: None,
                catalog_loaded: true,
            })),
            voices: Arc::new(default_voices()),
            supports_pause: config.supports_pause,
            words_per_minute: config.words_per_minute.max(1),
            catalog_delay: None,
        }
    }

    /// Deliver the voice catalog only after `delay`, announced via the
    /// voices-changed listener
    pub fn with_catalog_delay(mut self, delay: Duration) -> Self {
        self.state.lock().unwrap().catalog_loaded = false;
        self.catalog_delay = Some(delay);
        self
    }

    fn speaking_time(&self, utterance: &Utterance) -> Duration {
        let words = utterance.text.split_whitespace().count().max(1) as f64;
        let rate = f64::from(utterance.rate).max(0.1);
        let minutes = words / (f64::from(self.words_per_minute) * rate);
        Duration::from_secs_f64(minutes * 60.0).max(MIN_UTTERANCE)
    }

    fn spawn_finish(&self, handlers: UtteranceHandlers, after: Duration) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let finished = {
                let mut state = state.lock().unwrap();
                match &state.active {
                    Some(active) if active.handlers.utterance_id() == handlers.utterance_id() => {
                        state.active = None;
                        true
                    }
                    _ => false,
                }
            };
            if finished {
                handlers.on_end();
            }
        })
    }
}

impl SpeechEngine for SimulatedEngine {
    fn speak(&self, utterance: Utterance, handlers: UtteranceHandlers) {
        // A new utterance replaces whatever was active
        self.cancel();

        let duration = self.speaking_time(&utterance);
        debug!(
            "Simulated engine speaking {} ({:?}): {:?}",
            utterance.id, duration, utterance.text
        );

        handlers.on_start();
        let task = self.spawn_finish(handlers.clone(), duration);
        self.state.lock().unwrap().active = Some(Active {
            handlers,
            task: Some(task),
            remaining: duration,
            resumed_at: Instant::now(),
        });
    }

    fn cancel(&self) {
        let active = self.state.lock().unwrap().active.take();
        if let Some(active) = active {
            if let Some(task) = active.task {
                task.abort();
            }
            active.handlers.on_error("interrupted");
        }
    }

    fn pause(&self) {
        if !self.supports_pause {
            debug!("Simulated engine ignoring pause request");
            return;
        }
        let handlers = {
            let mut state = self.state.lock().unwrap();
            match state.active.as_mut() {
                Some(active) => match active.task.take() {
                    Some(task) => {
                        task.abort();
                        active.remaining =
                            active.remaining.saturating_sub(active.resumed_at.elapsed());
                        Some(active.handlers.clone())
                    }
                    None => None,
                },
                None => None,
            }
        };
        if let Some(handlers) = handlers {
            handlers.on_pause();
        }
    }

    fn resume(&self) {
        let resumed = {
            let mut state = self.state.lock().unwrap();
            match state.active.as_mut() {
                Some(active) if active.task.is_none() => {
                    active.resumed_at = Instant::now();
                    Some((active.handlers.clone(), active.remaining))
                }
                _ => None,
            }
        };
        if let Some((handlers, remaining)) = resumed {
            handlers.on_resume();
            let task = self.spawn_finish(handlers, remaining);
            if let Some(active) = self.state.lock().unwrap().active.as_mut() {
                active.task = Some(task);
            }
        }
    }

    fn voices(&self) -> Vec<Voice> {
        if self.state.lock().unwrap().catalog_loaded {
            self.voices.as_ref().clone()
        } else {
            Vec::new()
        }
    }

    fn on_voices_changed(&self, listener: Box<dyn FnOnce() + Send>) {
        let delay = self.catalog_delay.unwrap_or_default();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.lock().unwrap().catalog_loaded = true;
            listener();
        });
    }
}

fn default_voices() -> Vec<Voice> {
    [("Samantha", "en-US", true), ("Daniel", "en-GB", false), ("Amélie", "fr-CA", false), ("Anna", "de-DE", false)]
        .into_iter()
        .map(|(name, lang, default)| Voice {
            name: name.to_string(),
            lang: lang.to_string(),
            default,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{UtteranceEvent, UtteranceEventKind};
    use uuid::Uuid;

    fn recording_handlers() -> (UtteranceHandlers, Arc<Mutex<Vec<UtteranceEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handlers =
            UtteranceHandlers::new(Uuid::new_v4(), move |event| sink.lock().unwrap().push(event));
        (handlers, seen)
    }

    fn utterance(text: &str) -> Utterance {
        Utterance {
            id: Uuid::new_v4(),
            text: text.to_string(),
            lang: None,
            voice: None,
            pitch: 1.0,
            rate: 1.0,
            volume: 1.0,
        }
    }

    fn kinds(seen: &Arc<Mutex<Vec<UtteranceEvent>>>) -> Vec<UtteranceEventKind> {
        seen.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_utterance_runs_to_end() {
        let engine = SimulatedEngine::new(&EngineConfig::default());
        let (handlers, seen) = recording_handlers();

        engine.speak(utterance("hello there"), handlers);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(kinds(&seen), vec![UtteranceEventKind::Start, UtteranceEventKind::End]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reports_interrupted() {
        let engine = SimulatedEngine::new(&EngineConfig::default());
        let (handlers, seen) = recording_handlers();

        engine.speak(utterance("one two three four five six"), handlers);
        engine.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(kinds(&seen), vec![UtteranceEventKind::Start, UtteranceEventKind::Error]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_ignored_when_unsupported() {
        let config = EngineConfig {
            supports_pause: false,
            ..EngineConfig::default()
        };
        let engine = SimulatedEngine::new(&config);
        let (handlers, seen) = recording_handlers();

        engine.speak(utterance("hello"), handlers);
        engine.pause();

        assert_eq!(kinds(&seen), vec![UtteranceEventKind::Start]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume() {
        let engine = SimulatedEngine::new(&EngineConfig::default());
        let (handlers, seen) = recording_handlers();

        engine.speak(utterance("hello"), handlers);
        engine.pause();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(kinds(&seen), vec![UtteranceEventKind::Start, UtteranceEventKind::Pause]);

        engine.resume();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            kinds(&seen),
            vec![
                UtteranceEventKind::Start,
                UtteranceEventKind::Pause,
                UtteranceEventKind::Resume,
                UtteranceEventKind::End
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_catalog() {
        let engine =
            SimulatedEngine::new(&EngineConfig::default()).with_catalog_delay(Duration::from_millis(50));
        assert!(engine.voices().is_empty());

        let (tx, rx) = tokio::sync::oneshot::channel();
        engine.on_voices_changed(Box::new(move || {
            let _ = tx.send(());
        }));
        rx.await.unwrap();

        assert!(!engine.voices().is_empty());
    }
}
