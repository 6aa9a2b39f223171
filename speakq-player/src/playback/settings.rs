//! Speech settings applied to every dispatched utterance
//!
//! Numeric fields are clamped into the engine's accepted ranges rather than
//! rejected.

use crate::engine::Voice;

/// Voice selector sentinel: let the utterance language pick the voice
pub const PREFER_LANGUAGE: &str = "prefer-language";

pub const PITCH_RANGE: (f32, f32) = (0.0, 2.0);
pub const RATE_RANGE: (f32, f32) = (0.1, 10.0);
pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

/// Voice requested by a caller, before resolution against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelector {
    /// Match a catalog voice by name
    Named(String),
    /// Ignore the configured voice; the language tag drives selection
    PreferLanguage,
}

impl VoiceSelector {
    pub fn parse(value: &str) -> Self {
        if value == PREFER_LANGUAGE {
            VoiceSelector::PreferLanguage
        } else {
            VoiceSelector::Named(value.to_string())
        }
    }
}

/// Process-wide speech parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
    pub voice: Option<Voice>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            rate: 1.0,
            volume: 1.0,
            voice: None,
        }
    }
}

/// Options accepted by `configure`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigureOptions {
    pub pitch: Option<f32>,
    pub rate: Option<f32>,
    pub volume: Option<f32>,
    pub voice: Option<VoiceSelector>,
}

impl SpeechSettings {
    /// Apply the numeric part of `options`
    ///
    /// Returns true if any stored value changed.
    pub fn apply_numeric(&mut self, options: &ConfigureOptions) -> bool {
        let before = (self.pitch, self.rate, self.volume);
        if let Some(pitch) = options.pitch {
            self.pitch = clamp(pitch, PITCH_RANGE, self.pitch);
        }
        if let Some(rate) = options.rate {
            self.rate = clamp(rate, RATE_RANGE, self.rate);
        }
        if let Some(volume) = options.volume {
            self.volume = clamp(volume, VOLUME_RANGE, self.volume);
        }
        before != (self.pitch, self.rate, self.volume)
    }
}

/// Clamp into `range`; NaN keeps `current`
fn clamp(value: f32, range: (f32, f32), current: f32) -> f32 {
    if value.is_nan() {
        current
    } else {
        value.clamp(range.0, range.1)
    }
}

/// Find a catalog voice by name
pub fn find_voice<'a>(voices: &'a [Voice], name: &str) -> Option<&'a Voice> {
    voices.iter().find(|v| v.name == name)
}
