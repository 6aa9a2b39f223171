//! Controller facade and control task
//!
//! **Responsibilities:**
//! - Public operation surface (`ControllerHandle`)
//! - Single control task owning queue, playback state and settings
//! - Executing state-machine effects against the engine and timers
//! - Filtering callbacks from superseded utterances
//!
//! # Architecture
//!
//! The handle sends commands over an mpsc channel and waits for an
//! acknowledgement, so state is consistent whenever a call returns. Engine
//! callbacks, timer expiries and voice-gate resolution are posted to the same
//! channel; every mutation therefore happens on one task, in arrival order.

use super::queue_manager::{
    InsertionPolicy, ItemOptions, QueueItem, QueueManager, RemoveOutcome, MAX_TEXT_LENGTH,
};
use super::settings::{find_voice, ConfigureOptions, SpeechSettings, VoiceSelector};
use super::state::{Effect, PauseCapability, PlaybackState};
use super::status::StatusEmitter;
use super::timers::TaskSlot;
use super::voice_gate::VoiceCatalogGate;
use crate::config::TimingConfig;
use crate::engine::{
    SpeechEngine, Utterance, UtteranceEvent, UtteranceEventKind, UtteranceHandlers, Voice,
};
use crate::error::{Error, Result};
use speakq_common::events::{EventBus, PlaybackPhase, SpeakqEvent, StatusSnapshot};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Options accepted by `add`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOptions {
    pub lang: Option<String>,
    pub voice: Option<VoiceSelector>,
    pub queue: InsertionPolicy,
}

enum Command {
    Add {
        item: QueueItem,
        policy: InsertionPolicy,
    },
    Configure(ConfigureOptions),
    Next,
    Previous,
    Play(Option<usize>),
    Pause,
    Remove(Option<usize>),
    Reset,
}

enum Message {
    Command {
        command: Command,
        ack: oneshot::Sender<()>,
    },
    Status(oneshot::Sender<(StatusSnapshot, PlaybackPhase)>),
    Utterance(UtteranceEvent),
    GateOpened {
        generation: u64,
        utterance_id: Uuid,
        voices: Arc<Vec<Voice>>,
    },
    VoiceResolved {
        generation: u64,
        selector: VoiceSelector,
        voices: Arc<Vec<Voice>>,
    },
    PauseProbeExpired {
        generation: u64,
    },
    NaturalPauseElapsed {
        generation: u64,
    },
    Shutdown,
}

/// Cloneable handle to a running controller
///
/// Dropping every handle shuts the controller down.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Message>,
    bus: EventBus,
}

impl ControllerHandle {
    /// Queue `text` according to `options.queue`
    ///
    /// Text is trimmed; empty or over-long text is rejected before the
    /// queue is touched.
    pub async fn add(&self, text: &str, options: AddOptions) -> Result<()> {
        let text = validate_text(text)?;
        let item = QueueItem::new(
            text,
            ItemOptions {
                lang: options.lang,
                voice: options.voice,
            },
        );
        self.send(Command::Add {
            item,
            policy: options.queue,
        })
        .await
    }

    /// Update speech settings; restarts the active utterance when needed
    pub async fn configure(&self, options: ConfigureOptions) -> Result<()> {
        self.send(Command::Configure(options)).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(Command::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.send(Command::Previous).await
    }

    /// Jump to `index` and restart, or resume/start at the current position
    pub async fn play(&self, index: Option<usize>) -> Result<()> {
        self.send(Command::Play(index)).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn remove(&self, index: Option<usize>) -> Result<()> {
        self.send(Command::Remove(index)).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    /// Current (undebounced) status snapshot
    pub async fn status(&self) -> Result<StatusSnapshot> {
        Ok(self.query().await?.0)
    }

    /// Current effective playback phase
    pub async fn phase(&self) -> Result<PlaybackPhase> {
        Ok(self.query().await?.1)
    }

    /// Subscribe to status and voice notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SpeakqEvent> {
        self.bus.subscribe()
    }

    /// Stop playback and end the control task
    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }

    async fn query(&self) -> Result<(StatusSnapshot, PlaybackPhase)> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Message::Status(reply))
            .map_err(|_| Error::ControllerStopped)?;
        response.await.map_err(|_| Error::ControllerStopped)
    }

    async fn send(&self, command: Command) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Message::Command { command, ack })
            .map_err(|_| Error::ControllerStopped)?;
        done.await.map_err(|_| Error::ControllerStopped)
    }
}

/// Trim and bound-check caller text
pub fn validate_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInputType("text is empty".to_string()));
    }
    let length = trimmed.chars().count();
    if length > MAX_TEXT_LENGTH {
        return Err(Error::MaxLengthExceeded {
            length,
            max: MAX_TEXT_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

/// Playback controller
///
/// Owns every piece of mutable state; lives inside its own tokio task.
pub struct Controller {
    engine: Arc<dyn SpeechEngine>,
    timing: TimingConfig,
    queue: QueueManager,
    playback: PlaybackState,
    settings: SpeechSettings,
    gate: VoiceCatalogGate,
    status: StatusEmitter,
    /// Weak so that dropping every handle ends the task
    tx: mpsc::WeakUnboundedSender<Message>,
    /// Utterance whose callbacks are currently honoured
    active_utterance: Option<Uuid>,
    gate_wait: TaskSlot,
    voice_wait: TaskSlot,
    pause_probe: TaskSlot,
    natural_pause: TaskSlot,
}

impl Controller {
    /// Construct a controller and spawn its control task
    ///
    /// Subscribe to `bus` before calling to observe the initial status
    /// snapshot. Fails with `UnsupportedEngine` if the engine reports that
    /// speech synthesis is unavailable.
    pub fn spawn(
        engine: Arc<dyn SpeechEngine>,
        timing: TimingConfig,
        bus: EventBus,
    ) -> Result<ControllerHandle> {
        if !engine.is_available() {
            return Err(Error::UnsupportedEngine);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let gate = VoiceCatalogGate::new(&engine, bus.clone());
        let status = StatusEmitter::new(bus.clone(), timing.status_quiet_period());

        let mut controller = Controller {
            engine,
            timing,
            queue: QueueManager::new(),
            playback: PlaybackState::new(),
            settings: SpeechSettings::default(),
            gate,
            status,
            tx: tx.downgrade(),
            active_utterance: None,
            gate_wait: TaskSlot::new(),
            voice_wait: TaskSlot::new(),
            pause_probe: TaskSlot::new(),
            natural_pause: TaskSlot::new(),
        };

        // Initial snapshot, ahead of any queue activity
        controller.notify_status();
        tokio::spawn(controller.run(rx));
        info!("Speech controller started");

        Ok(ControllerHandle { tx, bus })
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        while let Some(message) = rx.recv().await {
            match message {
                Message::Command { command, ack } => {
                    self.handle_command(command);
                    let _ = ack.send(());
                }
                Message::Status(reply) => {
                    let _ = reply.send((self.snapshot(), self.playback.phase()));
                }
                Message::Utterance(event) => self.handle_utterance_event(event),
                Message::GateOpened {
                    generation,
                    utterance_id,
                    voices,
                } => {
                    if self.gate_wait.finish(generation) {
                        self.speak_current(utterance_id, &voices);
                    }
                }
                Message::VoiceResolved {
                    generation,
                    selector,
                    voices,
                } => {
                    if self.voice_wait.finish(generation) {
                        self.apply_voice(&selector, &voices);
                        self.restart_if_active();
                        self.notify_status();
                    }
                }
                Message::PauseProbeExpired { generation } => {
                    if self.pause_probe.finish(generation) {
                        let effects = self.playback.pause_probe_expired();
                        if !effects.is_empty() {
                            info!("Engine ignored pause request; pausing by cancellation");
                        }
                        self.apply(effects);
                        self.notify_status();
                    }
                }
                Message::NaturalPauseElapsed { generation } => {
                    if self.natural_pause.finish(generation) && self.queue.advance() {
                        debug!("Natural pause elapsed, advancing to {}", self.queue.index());
                        self.dispatch(false);
                        self.notify_status();
                    }
                }
                Message::Shutdown => break,
            }
        }

        let effects = self.playback.stop();
        self.apply(effects);
        self.voice_wait.cancel();
        info!("Speech controller stopped");
    }

    // ========================================
    // Facade operations
    // ========================================

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Add { item, policy } => self.add(item, policy),
            Command::Configure(options) => self.configure(options),
            Command::Next => {
                self.next();
            }
            Command::Previous => self.previous(),
            Command::Play(index) => self.play(index),
            Command::Pause => self.pause(),
            Command::Remove(index) => self.remove(index),
            Command::Reset => self.reset(),
        }
    }

    fn add(&mut self, item: QueueItem, policy: InsertionPolicy) {
        let position = self.queue.insert(item, policy);
        debug!("Added item at {} ({:?}), queue length {}", position, policy, self.queue.len());

        if policy.forces_restart() {
            self.dispatch(true);
        } else if !self.playback.is_active() {
            if self.queue.len() == 1 {
                self.play(None);
            } else {
                self.next();
            }
        }
        self.notify_status();
    }

    fn configure(&mut self, options: ConfigureOptions) {
        let changed = self.settings.apply_numeric(&options);
        debug!(
            "Settings now pitch={} rate={} volume={}",
            self.settings.pitch, self.settings.rate, self.settings.volume
        );

        match options.voice {
            Some(selector) => match self.gate.voices() {
                Some(voices) => {
                    self.apply_voice(&selector, &voices);
                    self.restart_if_active();
                }
                None => {
                    // Numeric changes still take effect now
                    if changed {
                        self.restart_if_active();
                    }
                    let gate = self.gate.clone();
                    let tx = self.tx.clone();
                    self.voice_wait.start(move |generation| async move {
                        let voices = gate.ready().await;
                        if let Some(tx) = tx.upgrade() {
                            let _ = tx.send(Message::VoiceResolved {
                                generation,
                                selector,
                                voices,
                            });
                        }
                    });
                }
            },
            None => {
                if changed {
                    self.restart_if_active();
                }
            }
        }
        self.notify_status();
    }

    fn next(&mut self) -> bool {
        if !self.queue.advance() {
            return false;
        }
        self.dispatch(true);
        self.notify_status();
        true
    }

    fn previous(&mut self) {
        if !self.queue.retreat() {
            return;
        }
        self.dispatch(true);
        self.notify_status();
    }

    fn play(&mut self, index: Option<usize>) {
        match index.filter(|i| *i < self.queue.len()) {
            Some(index) => {
                self.queue.set_index(index);
                self.dispatch(true);
            }
            None => {
                if self.queue.is_empty() || self.playback.is_active() {
                    return;
                }
                if self.playback.is_paused()
                    && self.playback.pause_capability() == PauseCapability::Supported
                {
                    let effects = self.playback.resume();
                    self.apply(effects);
                } else {
                    self.dispatch(false);
                }
            }
        }
        self.notify_status();
    }

    fn pause(&mut self) {
        if self.playback.phase() != PlaybackPhase::Playing {
            debug!("Pause ignored while {}", self.playback.phase());
            return;
        }
        let effects = self.playback.request_pause();
        self.apply(effects);
        self.notify_status();
    }

    fn remove(&mut self, index: Option<usize>) {
        let Some(index) = index else {
            return;
        };
        let Some(outcome) = self.queue.remove(index) else {
            return;
        };
        debug!("Removed item {} ({:?})", index, outcome);

        match outcome {
            RemoveOutcome::CurrentRemoved { replacement: true } => self.dispatch(true),
            RemoveOutcome::CurrentRemoved { replacement: false } => self.stop(),
            RemoveOutcome::Shifted | RemoveOutcome::Unaffected => {}
        }
        self.notify_status();
    }

    fn reset(&mut self) {
        self.queue.clear();
        self.stop();
        self.notify_status();
    }

    // ========================================
    // Transitions and effects
    // ========================================

    fn dispatch(&mut self, force: bool) {
        let effects = self.playback.dispatch(force);
        self.apply(effects);
    }

    fn stop(&mut self) {
        let effects = self.playback.stop();
        self.active_utterance = None;
        self.apply(effects);
    }

    fn restart_if_active(&mut self) {
        if self.playback.is_active() {
            info!("Restarting current utterance with new settings");
            self.dispatch(true);
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CancelTimers => {
                    self.natural_pause.cancel();
                    self.pause_probe.cancel();
                    self.gate_wait.cancel();
                }
                Effect::CancelPauseProbe => self.pause_probe.cancel(),
                Effect::CancelUtterance => self.engine.cancel(),
                Effect::PauseUtterance => self.engine.pause(),
                Effect::ResumeUtterance => self.engine.resume(),
                Effect::SchedulePauseProbe => {
                    if let Some(tx) = self.tx.upgrade() {
                        self.pause_probe.schedule(self.timing.pause_probe_timeout(), tx, |generation| {
                            Message::PauseProbeExpired { generation }
                        });
                    }
                }
                Effect::ScheduleNaturalPause => {
                    if let Some(tx) = self.tx.upgrade() {
                        self.natural_pause.schedule(self.timing.natural_pause(), tx, |generation| {
                            Message::NaturalPauseElapsed { generation }
                        });
                    }
                }
                Effect::Speak => self.begin_speak(),
            }
        }
    }

    /// Issue the current item once the voice catalog is available
    fn begin_speak(&mut self) {
        let utterance_id = Uuid::new_v4();
        self.active_utterance = Some(utterance_id);

        if let Some(voices) = self.gate.voices() {
            self.speak_current(utterance_id, &voices);
            return;
        }

        debug!("Voice catalog not ready, deferring utterance {}", utterance_id);
        let gate = self.gate.clone();
        let tx = self.tx.clone();
        self.gate_wait.start(move |generation| async move {
            let voices = gate.ready().await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Message::GateOpened {
                    generation,
                    utterance_id,
                    voices,
                });
            }
        });
    }

    fn speak_current(&mut self, utterance_id: Uuid, voices: &[Voice]) {
        if self.active_utterance != Some(utterance_id) || !self.playback.is_queued() {
            debug!("Utterance {} superseded before dispatch", utterance_id);
            return;
        }
        let Some(item) = self.queue.current() else {
            warn!("Dispatch requested with an empty queue");
            self.stop();
            return;
        };

        let voice = match &item.options().voice {
            Some(VoiceSelector::PreferLanguage) => None,
            Some(VoiceSelector::Named(name)) => find_voice(voices, name)
                .cloned()
                .or_else(|| self.settings.voice.clone()),
            None => self.settings.voice.clone(),
        };
        let utterance = Utterance {
            id: utterance_id,
            text: item.text().to_string(),
            lang: item.options().lang.clone(),
            voice,
            pitch: self.settings.pitch,
            rate: self.settings.rate,
            volume: self.settings.volume,
        };

        info!("Speaking item {} ({} chars)", self.queue.index(), utterance.text.chars().count());
        let handlers = self.handlers_for(utterance_id);
        self.engine.speak(utterance, handlers);
    }

    fn handlers_for(&self, utterance_id: Uuid) -> UtteranceHandlers {
        let tx = self.tx.clone();
        UtteranceHandlers::new(utterance_id, move |event| {
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Message::Utterance(event));
            }
        })
    }

    fn handle_utterance_event(&mut self, event: UtteranceEvent) {
        if self.active_utterance != Some(event.utterance_id) {
            debug!("Ignoring {:?} from superseded utterance {}", event.kind, event.utterance_id);
            return;
        }

        let effects = match event.kind {
            UtteranceEventKind::Start | UtteranceEventKind::Resume => self.playback.started(),
            UtteranceEventKind::Pause => self.playback.paused_by_engine(),
            UtteranceEventKind::End => self.playback.ended(self.queue.has_next()),
            UtteranceEventKind::Error => {
                if !self.playback.is_paused() {
                    warn!(
                        "Utterance {} failed: {}",
                        event.utterance_id,
                        event.detail.as_deref().unwrap_or("unknown error")
                    );
                }
                self.playback.ended(self.queue.has_next())
            }
        };
        self.apply(effects);
        self.notify_status();
    }

    fn apply_voice(&mut self, selector: &VoiceSelector, voices: &[Voice]) {
        self.settings.voice = match selector {
            VoiceSelector::PreferLanguage => None,
            VoiceSelector::Named(name) => {
                let voice = find_voice(voices, name).cloned();
                if voice.is_none() {
                    warn!("Voice {:?} not found in catalog; using engine default", name);
                }
                voice
            }
        };
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::new(self.playback.is_playing(), self.queue.texts(), self.queue.index())
    }

    fn notify_status(&mut self) {
        let snapshot = self.snapshot();
        self.status.notify(snapshot);
    }
}
