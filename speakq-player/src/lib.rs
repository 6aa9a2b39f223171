//! # speakq player library
//!
//! Sequential speech playback controller.
//!
//! **Purpose:** Hold an ordered queue of text items, feed them one at a time
//! to a callback-driven speech engine, and broadcast a debounced status
//! snapshot whenever playback state changes.
//!
//! **Architecture:** A single tokio task owns queue, playback state and
//! settings; `ControllerHandle` talks to it over a channel. Engine quirks
//! (silently ignored pause, late voice catalog) are absorbed inside.

pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
pub use playback::{Controller, ControllerHandle};
