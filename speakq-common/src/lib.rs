//! # speakq Common Library
//!
//! Shared code for the speakq speech queue:
//! - Event types (SpeakqEvent enum) and the EventBus
//! - Status and voice payload types
//! - Configuration file resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
