//! Scripted speech engine
//!
//! Records every call the controller makes and keeps the handler set of
//! each submitted utterance so tests decide when callbacks fire. The only
//! callbacks fired automatically are the ones a real engine fires
//! synchronously: `error("interrupted")` on cancel, and `pause`/`resume`
//! when pause support is enabled.

use speakq_player::engine::{SpeechEngine, Utterance, UtteranceHandlers, Voice};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Speak(String),
    Cancel,
    Pause,
    Resume,
}

struct FakeState {
    calls: Vec<EngineCall>,
    utterances: Vec<(Utterance, UtteranceHandlers)>,
    voices: Vec<Voice>,
    listener: Option<Box<dyn FnOnce() + Send>>,
    supports_pause: bool,
}

#[derive(Clone)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
    available: bool,
}

impl FakeEngine {
    /// Engine with a populated catalog that honours pause
    pub fn new() -> Self {
        Self::with_voices(sample_voices())
    }

    /// Engine whose catalog starts out as `voices`
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                utterances: Vec::new(),
                voices,
                listener: None,
                supports_pause: true,
            })),
            available: true,
        }
    }

    /// Engine that reports synthesis as unavailable
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Silently ignore pause and resume requests
    pub fn without_pause_support(self) -> Self {
        self.state.lock().unwrap().supports_pause = false;
        self
    }

    pub fn as_engine(&self) -> Arc<dyn SpeechEngine> {
        Arc::new(self.clone())
    }

    // ========================================
    // Inspection
    // ========================================

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == call)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Texts submitted to `speak`, in order
    pub fn spoken(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .utterances
            .iter()
            .map(|(u, _)| u.text.clone())
            .collect()
    }

    pub fn last_utterance(&self) -> Option<Utterance> {
        self.state
            .lock()
            .unwrap()
            .utterances
            .last()
            .map(|(u, _)| u.clone())
    }

    // ========================================
    // Callbacks
    // ========================================

    fn last_handlers(&self) -> UtteranceHandlers {
        self.state
            .lock()
            .unwrap()
            .utterances
            .last()
            .map(|(_, h)| h.clone())
            .expect("no utterance has been submitted")
    }

    /// Handlers of the `n`th submitted utterance
    pub fn handlers(&self, n: usize) -> UtteranceHandlers {
        self.state.lock().unwrap().utterances[n].1.clone()
    }

    pub fn fire_start(&self) {
        self.last_handlers().on_start();
    }

    pub fn fire_end(&self) {
        self.last_handlers().on_end();
    }

    pub fn fire_error(&self, detail: &str) {
        self.last_handlers().on_error(detail);
    }

    /// Publish a new catalog and notify the registered listener
    pub fn load_voices(&self, voices: Vec<Voice>) {
        let listener = {
            let mut state = self.state.lock().unwrap();
            state.voices = voices;
            state.listener.take()
        };
        if let Some(listener) = listener {
            listener();
        }
    }
}

impl SpeechEngine for FakeEngine {
    fn is_available(&self) -> bool {
        self.available
    }

    fn speak(&self, utterance: Utterance, handlers: UtteranceHandlers) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Speak(utterance.text.clone()));
        state.utterances.push((utterance, handlers));
    }

    fn cancel(&self) {
        let handlers = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(EngineCall::Cancel);
            state.utterances.last().map(|(_, h)| h.clone())
        };
        if let Some(handlers) = handlers {
            handlers.on_error("interrupted");
        }
    }

    fn pause(&self) {
        let handlers = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(EngineCall::Pause);
            if state.supports_pause {
                state.utterances.last().map(|(_, h)| h.clone())
            } else {
                None
            }
        };
        if let Some(handlers) = handlers {
            handlers.on_pause();
        }
    }

    fn resume(&self) {
        let handlers = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(EngineCall::Resume);
            if state.supports_pause {
                state.utterances.last().map(|(_, h)| h.clone())
            } else {
                None
            }
        };
        if let Some(handlers) = handlers {
            handlers.on_resume();
        }
    }

    fn voices(&self) -> Vec<Voice> {
        self.state.lock().unwrap().voices.clone()
    }

    fn on_voices_changed(&self, listener: Box<dyn FnOnce() + Send>) {
        self.state.lock().unwrap().listener = Some(listener);
    }
}

pub fn sample_voices() -> Vec<Voice> {
    vec![
        Voice {
            name: "Samantha".to_string(),
            lang: "en-US".to_string(),
            default: true,
        },
        Voice {
            name: "Daniel".to_string(),
            lang: "en-GB".to_string(),
            default: false,
        },
    ]
}
