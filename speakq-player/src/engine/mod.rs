//! Speech engine boundary
//!
//! The engine is an external, callback-driven collaborator. The controller
//! submits one `Utterance` at a time together with a fresh set of
//! `UtteranceHandlers`; the engine reports progress only through those
//! handlers, never through global listeners.
//!
//! **Responsibilities:**
//! - `SpeechEngine` trait (submit, cancel, pause, resume, voice catalog)
//! - Utterance descriptor and per-utterance callback set
//! - Simulated engine for the binary and manual testing

pub mod simulated;

use std::sync::Arc;
use uuid::Uuid;

pub use simulated::SimulatedEngine;
pub use speakq_common::events::VoiceInfo as Voice;

/// Description of one unit of text submitted for vocalization
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Identifies the dispatch this utterance belongs to
    pub id: Uuid,
    pub text: String,
    /// Language tag; drives default voice selection when `voice` is None
    pub lang: Option<String>,
    pub voice: Option<Voice>,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

/// Kinds of callback an engine may fire for an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceEventKind {
    Start,
    Resume,
    Pause,
    End,
    Error,
}

/// Callback fired by the engine, tagged with the utterance it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceEvent {
    pub utterance_id: Uuid,
    pub kind: UtteranceEventKind,
    /// Engine-supplied detail for `Error`
    pub detail: Option<String>,
}

/// Handler set registered on a single dispatched utterance
///
/// Cloneable so an engine can move copies into its own tasks. Every call
/// posts an `UtteranceEvent` to whoever created the handlers.
#[derive(Clone)]
pub struct UtteranceHandlers {
    utterance_id: Uuid,
    sink: Arc<dyn Fn(UtteranceEvent) + Send + Sync>,
}

impl UtteranceHandlers {
    pub fn new<F>(utterance_id: Uuid, sink: F) -> Self
    where
        F: Fn(UtteranceEvent) + Send + Sync + 'static,
    {
        Self {
            utterance_id,
            sink: Arc::new(sink),
        }
    }

    pub fn utterance_id(&self) -> Uuid {
        self.utterance_id
    }

    pub fn on_start(&self) {
        self.fire(UtteranceEventKind::Start, None);
    }

    pub fn on_resume(&self) {
        self.fire(UtteranceEventKind::Resume, None);
    }

    pub fn on_pause(&self) {
        self.fire(UtteranceEventKind::Pause, None);
    }

    pub fn on_end(&self) {
        self.fire(UtteranceEventKind::End, None);
    }

    pub fn on_error(&self, detail: impl Into<String>) {
        self.fire(UtteranceEventKind::Error, Some(detail.into()));
    }

    fn fire(&self, kind: UtteranceEventKind, detail: Option<String>) {
        (self.sink)(UtteranceEvent {
            utterance_id: self.utterance_id,
            kind,
            detail,
        });
    }
}

impl std::fmt::Debug for UtteranceHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UtteranceHandlers")
            .field("utterance_id", &self.utterance_id)
            .finish_non_exhaustive()
    }
}

/// External speech engine contract
///
/// All methods must return promptly; any real work happens inside the
/// engine and is reported back through the utterance handlers.
pub trait SpeechEngine: Send + Sync + 'static {
    /// Whether speech synthesis exists in this runtime at all
    fn is_available(&self) -> bool {
        true
    }

    /// Submit an utterance for playback
    fn speak(&self, utterance: Utterance, handlers: UtteranceHandlers);

    /// Abandon the active utterance, if any
    fn cancel(&self);

    /// Ask the engine to suspend the active utterance
    ///
    /// Some engines silently ignore this; the controller detects that.
    fn pause(&self);

    /// Resume a suspended utterance
    fn resume(&self);

    /// Current voice catalog (may be empty until the engine has loaded it)
    fn voices(&self) -> Vec<Voice>;

    /// Register a one-shot listener for the next catalog change
    fn on_voices_changed(&self, listener: Box<dyn FnOnce() + Send>);
}
