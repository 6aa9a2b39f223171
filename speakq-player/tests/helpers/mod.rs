//! Test helper modules for speakq-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - FakeEngine: scripted speech engine that records calls
//! - TestController: controller wired to a FakeEngine and an event receiver

#![allow(dead_code)]

pub mod fake_engine;
pub mod test_controller;

pub use fake_engine::{sample_voices, EngineCall, FakeEngine};
pub use test_controller::{settle, TestController};
