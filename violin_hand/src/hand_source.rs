//! Hand-observation sources — keyboard simulation and the external
//! tracker bridge.
//!
//! The public interface is one `Vec<HandObservation>` frame per tick,
//! delivered over an `mpsc` channel. Consumers don't need to know whether
//! frames came from a real detector or the simulator; both feed the same
//! recognizer.
//!
//! ## Tracker wire protocol
//!
//! The tracker command is any process that owns the camera and writes one
//! JSON object per line on stdout (an optional `READY` line first):
//!
//! ```text
//! {"hands":[{"handedness":"Right","score":0.97,
//!            "landmarks":[{"x":0.5,"y":0.5,"z":0.0}, …21 points…]}]}
//! ```
//!
//! Hands below the configured confidence or without exactly 21 landmarks
//! are dropped. An empty `hands` array is still a frame — hand loss is a
//! meaningful gesture state, not an error.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use violin_gesture::hand::landmarks;
use violin_gesture::{HandObservation, Handedness, Landmark};

/// All hands seen in one video frame.
pub type HandFrame = Vec<HandObservation>;

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait — unified interface for tracker and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`HandFrame`]s over a channel.
pub trait HandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandFrame>);
}

/// Spawn a hand source on its own thread and return the receiving end.
pub fn spawn_hand_source<S: HandSource>(source: S) -> Receiver<HandFrame> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimInput — raw key events from the visualizer window
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// Right hand shows `n` extended fingers (1..=4).
    SelectString(u8),
    BowDown,
    BowUp,
    PositionUp,
    PositionDown,
    FingerMore,
    FingerLess,
    TiltFlat,
    TiltSharp,
    TiltNatural,
    /// Toggle both hands in/out of view (exercises hand-loss reset).
    ToggleHands,
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Hand source driven by [`SimInput`] events from the visualizer window.
///
/// Keeps a simulated two-hand pose and emits full synthetic 21-landmark
/// frames at ~30 fps, so the entire recognize→map→debounce pipeline runs
/// exactly as it would with a camera.
pub struct SimHandSource {
    pub rx: Receiver<SimInput>,
}

struct SimPose {
    bow: bool,
    extended: u8,
    zone: u8,
    pressed: u8,
    tilt: i8,
    visible: bool,
}

impl Default for SimPose {
    fn default() -> Self {
        SimPose { bow: false, extended: 1, zone: 1, pressed: 0, tilt: 0, visible: true }
    }
}

impl SimPose {
    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::SelectString(n) => self.extended = n.clamp(1, 4),
            SimInput::BowDown => self.bow = true,
            SimInput::BowUp => self.bow = false,
            SimInput::PositionUp => self.zone = (self.zone + 1).min(3),
            SimInput::PositionDown => self.zone = self.zone.saturating_sub(1).max(1),
            SimInput::FingerMore => self.pressed = (self.pressed + 1).min(4),
            SimInput::FingerLess => self.pressed = self.pressed.saturating_sub(1),
            SimInput::TiltFlat => self.tilt = -1,
            SimInput::TiltSharp => self.tilt = 1,
            SimInput::TiltNatural => self.tilt = 0,
            SimInput::ToggleHands => self.visible = !self.visible,
        }
    }

    fn frame(&self) -> HandFrame {
        if !self.visible {
            return Vec::new();
        }
        vec![
            synth_right_hand(self.bow, self.extended),
            synth_left_hand(self.zone, self.pressed, self.tilt),
        ]
    }
}

impl HandSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        let mut pose = SimPose::default();
        loop {
            loop {
                match self.rx.try_recv() {
                    Ok(input) => pose.apply(input),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            if tx.send(pose.frame()).is_err() {
                return;
            }
            thread::sleep(Duration::from_millis(33));
        }
    }
}

// ── synthetic hand builders (also used by the app tests) ──────────────────

/// A right hand with `extended` fingers raised; `pinched` puts the thumb
/// tip next to the index tip so the pinch distance falls well inside any
/// sane engage threshold.
pub fn synth_right_hand(pinched: bool, extended: u8) -> HandObservation {
    let mut marks = base_hand(0.6, extended);
    marks[landmarks::THUMB_TIP] = if pinched {
        let index = marks[landmarks::INDEX_TIP];
        Landmark::new(index.x + 0.01, index.y + 0.01, index.z)
    } else {
        Landmark::new(0.4, 0.75, 0.0)
    };
    HandObservation::new(marks, Handedness::Right, 0.99)
}

/// A left hand with the thumb in the middle of `zone` (1..=3), `pressed`
/// fingers curled below their MCPs, and the index tilted per `tilt`.
pub fn synth_left_hand(zone: u8, pressed: u8, tilt: i8) -> HandObservation {
    let mut marks = base_hand(0.3, 4 - pressed.min(4));
    let thumb_y = match zone.clamp(1, 3) {
        1 => 0.16,
        2 => 0.5,
        _ => 0.85,
    };
    marks[landmarks::THUMB_TIP] = Landmark::new(0.3, thumb_y, 0.0);
    marks[landmarks::INDEX_TIP].z = tilt.signum() as f32 * -0.05;
    HandObservation::new(marks, Handedness::Left, 0.99)
}

/// Common scaffolding: PIPs at y 0.5, MCPs at y 0.45, the first
/// `raised` fingertips above both, the rest curled below both.
fn base_hand(x: f32, raised: u8) -> [Landmark; 21] {
    let mut marks = [Landmark::new(x, 0.5, 0.0); 21];
    let tips = [landmarks::INDEX_TIP, landmarks::MIDDLE_TIP, landmarks::RING_TIP, landmarks::PINKY_TIP];
    let pips = [landmarks::INDEX_PIP, landmarks::MIDDLE_PIP, landmarks::RING_PIP, landmarks::PINKY_PIP];
    let mcps = [landmarks::INDEX_MCP, landmarks::MIDDLE_MCP, landmarks::RING_MCP, landmarks::PINKY_MCP];
    for i in 0..4 {
        marks[pips[i]] = Landmark::new(x, 0.5, 0.0);
        marks[mcps[i]] = Landmark::new(x, 0.45, 0.0);
        let tip_y = if (i as u8) < raised { 0.38 } else { 0.6 };
        marks[tips[i]] = Landmark::new(x, tip_y, 0.0);
    }
    marks
}

// ════════════════════════════════════════════════════════════════════════════
// TrackerHandSource — external detector bridge
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct HandJson {
    handedness: Handedness,
    score: f32,
    landmarks: Vec<Landmark>,
}

#[derive(Deserialize)]
struct FrameJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Hand source backed by an external tracker process.
pub struct TrackerHandSource {
    pub command: String,
    pub min_confidence: f32,
}

impl TrackerHandSource {
    fn launch(&self) -> Result<(Child, BufReader<ChildStdout>)> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().context("empty tracker command")?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("starting tracker `{}`", self.command))?;

        let stdout = child.stdout.take().context("tracker has no stdout")?;
        Ok((child, BufReader::new(stdout)))
    }

    fn parse_frame(&self, line: &str) -> Option<HandFrame> {
        let frame: FrameJson = match serde_json::from_str(line) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("unparseable tracker line: {}", e);
                return None;
            }
        };
        if let Some(error) = frame.error {
            log::warn!("tracker error: {}", error);
            return None;
        }

        let mut hands = Vec::with_capacity(frame.hands.len());
        for hand in frame.hands {
            if hand.score < self.min_confidence {
                continue;
            }
            if hand.landmarks.len() != 21 {
                log::warn!("expected 21 landmarks, got {}", hand.landmarks.len());
                continue;
            }
            let mut marks = [Landmark::default(); 21];
            marks.copy_from_slice(&hand.landmarks);
            hands.push(HandObservation::new(marks, hand.handedness, hand.score));
        }
        Some(hands)
    }
}

impl HandSource for TrackerHandSource {
    fn run(self: Box<Self>, tx: Sender<HandFrame>) {
        let (mut child, reader) = match self.launch() {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("tracker unavailable: {:#}", e);
                return;
            }
        };
        log::info!("tracker started: {}", self.command);

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    log::error!("tracker read error: {}", e);
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == "READY" {
                continue;
            }
            if let Some(frame) = self.parse_frame(trimmed) {
                if tx.send(frame).is_err() {
                    break;
                }
            }
        }

        let _ = child.kill();
        log::info!("tracker stopped");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
