//! Playback control: queue, state machine and the controller task

pub mod controller;
pub mod queue_manager;
pub mod settings;
pub mod state;
pub mod status;
pub mod timers;
pub mod voice_gate;

pub use controller::{validate_text, AddOptions, Controller, ControllerHandle};
pub use queue_manager::{InsertionPolicy, ItemOptions, QueueItem, QueueManager, MAX_TEXT_LENGTH};
pub use settings::{ConfigureOptions, SpeechSettings, VoiceSelector, PREFER_LANGUAGE};
pub use state::{PauseCapability, PlaybackState};
