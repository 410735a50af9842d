//! Top-level application state machine.
//!
//! `AppState` owns the recognizer, the note mapper, the debounce policy
//! and the output sinks, and consumes one hand frame at a time. `run`
//! wires it to a hand source and the visualizer and drives the loop.

use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use anyhow::{anyhow, Result};

use violin_gesture::{
    GestureRecognizer, GestureState, HandObservation, NotePolicy, NoteTransition,
};
use violin_log::{NoteRecord, SessionLogger};
use violin_model::{NoteMapper, NoteSpec};

use crate::config::Config;
use crate::hand_source::{spawn_hand_source, SimHandSource, TrackerHandSource};
use crate::player::Player;
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// Options
// ════════════════════════════════════════════════════════════════════════════

/// Where hand frames come from.
pub enum SourceMode {
    /// Keyboard simulation in the visualizer window.
    Sim,
    /// External tracker command streaming landmark JSON.
    Tracker(String),
}

/// Run-time switches from the command line.
pub struct RunOptions {
    pub source: SourceMode,
    pub use_midi: bool,
    pub use_log: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions { source: SourceMode::Sim, use_midi: true, use_log: true }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    recognizer: GestureRecognizer,
    mapper: NoteMapper,
    policy: NotePolicy,
    player: Option<Player>,
    logger: Option<SessionLogger>,
    velocity: u8,

    gesture: GestureState,
    current: Option<NoteSpec>,
    pub status: String,
}

impl AppState {
    pub fn new(config: &Config, player: Option<Player>, logger: Option<SessionLogger>) -> Self {
        AppState {
            recognizer: GestureRecognizer::new(config.gesture.clone()),
            mapper: NoteMapper::new(config.violin.to_tables()),
            policy: NotePolicy::new(config.debounce_ms()),
            player,
            logger,
            velocity: config.midi.velocity.min(127),
            gesture: GestureState::default(),
            current: None,
            status: "Ready".to_string(),
        }
    }

    /// Process one frame of hand observations at monotonic time `now_ms`.
    pub fn handle_frame(&mut self, hands: &[HandObservation], now_ms: u64) {
        let state = self.recognizer.recognize(hands);
        self.gesture = state;

        let candidate = match (state.bow_active, state.string_selected) {
            (true, Some(string)) => Some(self.mapper.get_note(
                string as i32,
                state.position as i32,
                state.finger_count as i32,
                state.pitch_offset as i32,
            )),
            _ => None,
        };

        match self.policy.update(candidate, now_ms) {
            Some(NoteTransition::Start(note)) => self.note_on(note, &state),
            Some(NoteTransition::Stop(note)) => self.note_off(note),
            Some(NoteTransition::Replace { off, on }) => {
                self.note_off(off);
                self.note_on(on, &state);
            }
            None => {}
        }
    }

    fn note_on(&mut self, note: u8, state: &GestureState) {
        if let Some(player) = &self.player {
            player.note_on(note);
        }

        let spec = self.mapper.note_info(
            state.string_selected.unwrap_or(0) as i32,
            state.position as i32,
            state.finger_count as i32,
            state.pitch_offset as i32,
        );
        self.status = format!(
            "{} ({})  {} string  pos {}  finger {}",
            spec.note_name, spec.midi_note, spec.string_name, spec.position, spec.finger
        );

        if let Some(logger) = &self.logger {
            logger.log_note(NoteRecord {
                at_ms: violin_log::now_ms(),
                midi_note: note,
                note_name: spec.note_name.clone(),
                string: state
                    .string_selected
                    .map(|s| self.mapper.tables().tuning.name(s as i32).to_string()),
                position: state.position,
                finger_count: state.finger_count,
                pitch_offset: state.pitch_offset,
                velocity: self.velocity,
            });
        }

        self.current = Some(spec);
    }

    fn note_off(&mut self, note: u8) {
        if let Some(player) = &self.player {
            player.note_off(note);
        }
        if self.policy.sounding().is_none() {
            self.current = None;
            self.status = "Silent".to_string();
        }
    }

    // ── Accessors for the render loop and tests ───────────────────────────

    pub fn gesture(&self) -> GestureState {
        self.gesture
    }

    pub fn current_note(&self) -> Option<&NoteSpec> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.policy.sounding().is_some()
    }

    /// Release everything and close the sinks.
    pub fn shutdown(&mut self) {
        if let Some(player) = &self.player {
            player.all_off();
            player.quit();
        }
        if let Some(logger) = self.logger.take() {
            logger.end_session();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application: hand source, sinks, visualizer, loop.
pub fn run(config: Config, options: RunOptions) -> Result<()> {
    let (sim_tx, sim_rx) = mpsc::channel();

    let hand_rx = match &options.source {
        SourceMode::Sim => spawn_hand_source(SimHandSource { rx: sim_rx }),
        SourceMode::Tracker(command) => spawn_hand_source(TrackerHandSource {
            command: command.clone(),
            min_confidence: config.tracker.min_confidence,
        }),
    };

    let mut vis = Visualizer::new(config.window_title(), sim_tx).map_err(|e| anyhow!(e))?;

    let player = options.use_midi.then(|| Player::spawn(&config.midi));
    let logger = (options.use_log && config.session.enabled).then(|| {
        SessionLogger::start(PathBuf::from(&config.session.dir), config.session.log_interval_ms)
    });

    let mut app = AppState::new(&config, player, logger);
    let started = Instant::now();

    while vis.is_open() {
        if !vis.poll_input() {
            break;
        }

        loop {
            match hand_rx.try_recv() {
                Ok(frame) => {
                    let now_ms = started.elapsed().as_millis() as u64;
                    app.handle_frame(&frame, now_ms);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("hand source ended");
                    app.shutdown();
                    return Ok(());
                }
            }
        }

        let gesture = app.gesture();
        let note = app.current_note().cloned();
        let status = app.status.clone();
        vis.render(&gesture, note.as_ref(), &status);
    }

    app.shutdown();
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
