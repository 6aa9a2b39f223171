//! Voice catalog type definitions

use serde::{Deserialize, Serialize};

/// Voice description as broadcast in the catalog-loaded notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Engine-specific voice name (unique within a catalog)
    pub name: String,
    /// BCP 47 language tag
    pub lang: String,
    /// Whether the engine treats this voice as its default
    #[serde(default)]
    pub default: bool,
}
