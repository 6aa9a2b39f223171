//! Action binding
//!
//! Converts a named action with a plain JSON payload into a controller call.
//! All input validation happens here, before anything reaches the
//! controller, so a rejected action never mutates the queue.

use crate::error::{Error, Result};
use crate::playback::{AddOptions, ConfigureOptions, ControllerHandle, InsertionPolicy, VoiceSelector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

// ============================================================================
// Request/Response Types
// ============================================================================

/// One control request, as read from the wire
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

/// Outcome of a request, as written back to the wire
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionResponse {
    Ok { action: String },
    Error { action: String, error: String },
}

// ============================================================================
// Actions
// ============================================================================

/// A validated controller call
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add { text: String, options: AddOptions },
    Configure(ConfigureOptions),
    Next,
    Previous,
    Play(Option<usize>),
    Pause,
    Remove(Option<usize>),
    Reset,
}

impl Action {
    /// Validate `payload` for the action called `name`
    pub fn from_json(name: &str, payload: &Value) -> Result<Self> {
        match name {
            "add" => parse_add(payload),
            "configure" => Ok(Action::Configure(parse_configure(payload)?)),
            "next" => Ok(Action::Next),
            "previous" => Ok(Action::Previous),
            "play" => Ok(Action::Play(parse_index(payload))),
            "pause" => Ok(Action::Pause),
            "remove" => Ok(Action::Remove(parse_index(payload))),
            "reset" => Ok(Action::Reset),
            other => Err(Error::InvalidActionName(other.to_string())),
        }
    }

    /// Carry out the action against a running controller
    pub async fn perform(self, controller: &ControllerHandle) -> Result<()> {
        debug!("Performing {:?}", self);
        match self {
            Action::Add { text, options } => controller.add(&text, options).await,
            Action::Configure(options) => controller.configure(options).await,
            Action::Next => controller.next().await,
            Action::Previous => controller.previous().await,
            Action::Play(index) => controller.play(index).await,
            Action::Pause => controller.pause().await,
            Action::Remove(index) => controller.remove(index).await,
            Action::Reset => controller.reset().await,
        }
    }
}

/// Parse and perform a request, folding the result into a response
pub async fn handle_request(request: ActionRequest, controller: &ControllerHandle) -> ActionResponse {
    let result = match Action::from_json(&request.action, &request.payload) {
        Ok(action) => action.perform(controller).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => ActionResponse::Ok {
            action: request.action,
        },
        Err(e) => ActionResponse::Error {
            action: request.action,
            error: e.to_string(),
        },
    }
}

fn parse_add(payload: &Value) -> Result<Action> {
    let text = match payload.get("text") {
        Some(Value::String(text)) => text.clone(),
        Some(_) => return Err(Error::InvalidInputType("text must be a string".to_string())),
        None => return Err(Error::InvalidInputType("text is missing".to_string())),
    };

    let options = match payload.get("options") {
        None | Some(Value::Null) => AddOptions::default(),
        Some(Value::Object(map)) => parse_add_options(map)?,
        Some(_) => return Err(Error::InvalidOptionsType),
    };

    Ok(Action::Add { text, options })
}

fn parse_add_options(map: &Map<String, Value>) -> Result<AddOptions> {
    let lang = match map.get("lang") {
        None | Some(Value::Null) => None,
        Some(Value::String(lang)) => Some(lang.clone()),
        Some(_) => return Err(Error::InvalidLanguageType),
    };
    let voice = map
        .get("voice")
        .and_then(Value::as_str)
        .map(VoiceSelector::parse);
    let queue = map
        .get("queue")
        .and_then(Value::as_str)
        .map(InsertionPolicy::parse)
        .unwrap_or_default();

    Ok(AddOptions { lang, voice, queue })
}

fn parse_configure(payload: &Value) -> Result<ConfigureOptions> {
    let map = match payload {
        Value::Null => return Ok(ConfigureOptions::default()),
        Value::Object(map) => map,
        _ => return Err(Error::InvalidOptionsType),
    };

    // Non-numeric values are ignored like unrecognized keys
    let number = |key: &str| map.get(key).and_then(Value::as_f64).map(|v| v as f32);
    Ok(ConfigureOptions {
        pitch: number("pitch"),
        rate: number("rate"),
        volume: number("volume"),
        voice: map
            .get("voice")
            .and_then(Value::as_str)
            .map(VoiceSelector::parse),
    })
}

fn parse_index(payload: &Value) -> Option<usize> {
    payload
        .get("index")
        .and_then(Value::as_u64)
        .and_then(|i| usize::try_from(i).ok())
}
