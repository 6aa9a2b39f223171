//! Playback state machine
//!
//! `PlaybackState` is an owned record mutated only through the transition
//! methods below. Each transition is pure: it updates the flags and returns
//! the `Effect`s the controller must carry out against the engine and
//! timers. This keeps the machine testable without any engine at all.
//!
//! ```text
//! Idle -> Queued -> Playing <-> Paused
//!                   Playing -> Idle        (end, nothing next)
//!                   Playing -> Queued      (end, natural pause, next item)
//! any  -> Idle                             (stop)
//! ```

use speakq_common::events::PlaybackPhase;

/// Whether the engine can genuinely suspend an utterance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PauseCapability {
    /// Not yet observed
    #[default]
    Unknown,
    /// Engine fired its own pause callback
    Supported,
    /// Engine ignored a pause request; pause means cancel
    Unsupported,
}

/// Work requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Cancel natural-pause, pause-probe and gate-wait tasks
    CancelTimers,
    /// Cancel only the pause-probe task
    CancelPauseProbe,
    /// Tell the engine to abandon the active utterance
    CancelUtterance,
    /// Ask the engine to pause
    PauseUtterance,
    /// Ask the engine to resume
    ResumeUtterance,
    /// Start the pause-capability probe timer
    SchedulePauseProbe,
    /// Start the inter-item delay, then dispatch the next item
    ScheduleNaturalPause,
    /// Wait for the voice catalog, then submit the current item
    Speak,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    is_playing: bool,
    is_paused: bool,
    /// Engine request issued, no start/resume callback yet
    is_queued: bool,
    pause_capability: PauseCapability,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_queued(&self) -> bool {
        self.is_queued
    }

    /// Something has been requested from or is running in the engine
    pub fn is_active(&self) -> bool {
        self.is_playing || self.is_queued
    }

    pub fn pause_capability(&self) -> PauseCapability {
        self.pause_capability
    }

    /// The single effective phase
    pub fn phase(&self) -> PlaybackPhase {
        if self.is_queued {
            PlaybackPhase::Queued
        } else if self.is_playing {
            PlaybackPhase::Playing
        } else if self.is_paused {
            PlaybackPhase::Paused
        } else {
            PlaybackPhase::Idle
        }
    }

    /// Dispatch the current item
    ///
    /// A forced dispatch first cancels whatever the engine holds. `is_playing`
    /// is left alone so a restart of a playing item does not flicker to idle.
    pub fn dispatch(&mut self, force: bool) -> Vec<Effect> {
        let mut effects = vec![Effect::CancelTimers];
        if force && (self.is_playing || self.is_queued || self.is_paused) {
            effects.push(Effect::CancelUtterance);
        }
        if self.is_paused {
            self.is_paused = false;
            self.is_playing = false;
        }
        self.is_queued = true;
        effects.push(Effect::Speak);
        effects
    }

    /// Ask a genuinely paused engine to continue
    pub fn resume(&mut self) -> Vec<Effect> {
        self.is_paused = false;
        self.is_queued = true;
        vec![Effect::CancelTimers, Effect::ResumeUtterance]
    }

    /// Engine start or resume callback
    pub fn started(&mut self) -> Vec<Effect> {
        self.is_queued = false;
        self.is_paused = false;
        self.is_playing = true;
        Vec::new()
    }

    /// Engine pause callback: the engine can pause
    pub fn paused_by_engine(&mut self) -> Vec<Effect> {
        self.pause_capability = PauseCapability::Supported;
        self.is_queued = false;
        self.set_paused();
        vec![Effect::CancelPauseProbe]
    }

    /// Caller asked to pause
    ///
    /// Only an utterance the engine has started can be paused; while a
    /// request is queued there is nothing to suspend yet.
    pub fn request_pause(&mut self) -> Vec<Effect> {
        if self.phase() != PlaybackPhase::Playing {
            return Vec::new();
        }
        match self.pause_capability {
            PauseCapability::Unknown => vec![Effect::PauseUtterance, Effect::SchedulePauseProbe],
            PauseCapability::Supported => vec![Effect::PauseUtterance],
            PauseCapability::Unsupported => {
                self.set_paused();
                vec![Effect::CancelUtterance]
            }
        }
    }

    /// Pause probe elapsed without a pause callback
    pub fn pause_probe_expired(&mut self) -> Vec<Effect> {
        if self.pause_capability != PauseCapability::Unknown
            || self.phase() != PlaybackPhase::Playing
        {
            return Vec::new();
        }
        self.pause_capability = PauseCapability::Unsupported;
        self.set_paused();
        vec![Effect::CancelUtterance]
    }

    /// Engine end or error callback for the active utterance
    ///
    /// Advances after the natural pause unless paused. A caller's pause is
    /// never cleared here. Callbacks from superseded utterances never reach
    /// this point, so a re-queued request cannot be overtaken here.
    pub fn ended(&mut self, has_next: bool) -> Vec<Effect> {
        self.is_playing = false;
        // Ended before it started or resumed; nothing is left in the engine
        self.is_queued = false;
        if !self.is_paused && has_next {
            vec![Effect::ScheduleNaturalPause]
        } else {
            Vec::new()
        }
    }

    /// Explicit stop
    pub fn stop(&mut self) -> Vec<Effect> {
        self.is_playing = false;
        self.is_paused = false;
        self.is_queued = false;
        vec![Effect::CancelTimers, Effect::CancelUtterance]
    }

    fn set_paused(&mut self) {
        self.is_playing = false;
        self.is_paused = true;
    }
}
