//! Stateful gesture recognition.
//!
//! The recognizer ingests one frame's observations per call and updates a
//! single [`GestureState`] in place. Two rules carry state across frames
//! and are easy to get wrong:
//!
//! * **Pinch hysteresis** — the bow engages below the engage threshold and
//!   releases above the release threshold; between the two, the previous
//!   value stands. Release ≥ engage always holds (sanitized at
//!   construction), so the boundary cannot chatter.
//! * **Retention** — a right-hand extended-finger count of 0 keeps the
//!   previous string selection, and a missing left hand keeps the previous
//!   position/finger/offset values. Only a *missing right hand* resets
//!   anything (bow off, no string).

use serde::{Deserialize, Serialize};

use crate::hand::{landmarks, HandObservation, Handedness};

const FINGER_TIPS: [usize; 4] = [
    landmarks::INDEX_TIP,
    landmarks::MIDDLE_TIP,
    landmarks::RING_TIP,
    landmarks::PINKY_TIP,
];
const FINGER_PIPS: [usize; 4] = [
    landmarks::INDEX_PIP,
    landmarks::MIDDLE_PIP,
    landmarks::RING_PIP,
    landmarks::PINKY_PIP,
];
const FINGER_MCPS: [usize; 4] = [
    landmarks::INDEX_MCP,
    landmarks::MIDDLE_MCP,
    landmarks::RING_MCP,
    landmarks::PINKY_MCP,
];

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// A vertical zone in normalized screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub min: f32,
    pub max: f32,
}

impl Zone {
    pub fn new(min: f32, max: f32) -> Self {
        Zone { min, max }
    }
}

/// Recognizer thresholds. An explicit value passed at construction — there
/// is no ambient configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Pinch distance below which the bow engages.
    pub pinch_engage: f32,
    /// Pinch distance above which the bow releases.
    pub pinch_release: f32,
    /// Thumb-height zones for positions 1..=3, ordered by upper bound.
    pub position_zones: [Zone; 3],
    /// Magnitude of index-finger depth tilt that reads as flat/sharp.
    pub tilt_threshold: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            pinch_engage: 0.05,
            pinch_release: 0.08,
            position_zones: [
                Zone::new(0.0, 0.33),
                Zone::new(0.33, 0.66),
                Zone::new(0.66, 1.0),
            ],
            tilt_threshold: 0.02,
        }
    }
}

impl GestureConfig {
    /// Enforce the hysteresis invariant: release ≥ engage.
    fn sanitized(mut self) -> Self {
        if self.pinch_release < self.pinch_engage {
            self.pinch_release = self.pinch_engage;
        }
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureState
// ════════════════════════════════════════════════════════════════════════════

/// The discrete musical reading of the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureState {
    /// Bow (right-hand pinch) engaged.
    pub bow_active: bool,
    /// Last valid right-hand extended-finger count (1..=4); `None` when no
    /// right hand is present.
    pub string_selected: Option<u8>,
    /// Left-hand thumb zone, 1..=3.
    pub position: u8,
    /// Curled left-hand fingers, 0..=4.
    pub finger_count: u8,
    /// Index-finger tilt: -1 flat, 0 natural, 1 sharp.
    pub pitch_offset: i8,
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState {
            bow_active: false,
            string_selected: None,
            position: 1,
            finger_count: 0,
            pitch_offset: 0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureRecognizer
// ════════════════════════════════════════════════════════════════════════════

/// Interprets hand observations as violin gestures.
///
/// Right hand: bow trigger (pinch) and string selection (extended
/// fingers). Left hand: position (thumb height), finger count (curled
/// fingers) and pitch offset (index depth tilt).
pub struct GestureRecognizer {
    config: GestureConfig,
    state: GestureState,
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        GestureRecognizer {
            config: config.sanitized(),
            state: GestureState::default(),
        }
    }

    /// The retained snapshot from the last `recognize` call.
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Drop all retained state, as if freshly constructed.
    pub fn reset(&mut self) {
        self.state = GestureState::default();
    }

    /// Update the gesture state from one frame of observations and return
    /// the new snapshot. Never fails: absent hands degrade as documented
    /// on the module.
    ///
    /// When a frame carries two observations with the same handedness
    /// label, the last one wins — the same precedence an iteration-order
    /// scan gives, made explicit here.
    pub fn recognize(&mut self, hands: &[HandObservation]) -> GestureState {
        let mut right: Option<&HandObservation> = None;
        let mut left: Option<&HandObservation> = None;
        for hand in hands {
            match hand.handedness {
                Handedness::Right => right = Some(hand),
                Handedness::Left => left = Some(hand),
            }
        }

        match right {
            Some(hand) => self.process_right(hand),
            None => {
                // Hard reset: no hysteresis survives losing the right hand.
                self.state.bow_active = false;
                self.state.string_selected = None;
            }
        }

        if let Some(hand) = left {
            self.process_left(hand);
        }

        self.state
    }

    fn process_right(&mut self, hand: &HandObservation) {
        let pinch = hand.pinch_distance();
        if pinch < self.config.pinch_engage {
            self.state.bow_active = true;
        } else if pinch > self.config.pinch_release {
            self.state.bow_active = false;
        }

        let extended = count_extended_fingers(hand);
        if (1..=4).contains(&extended) {
            self.state.string_selected = Some(extended);
        }
        // A closed fist (0 extended) keeps the previous selection.
    }

    fn process_left(&mut self, hand: &HandObservation) {
        self.state.position = self.position_from_y(hand.thumb_tip().y);
        self.state.finger_count = count_pressed_fingers(hand);
        self.state.pitch_offset = self.pitch_offset_of(hand);
    }

    /// Zone classification of the thumb height; anything above every
    /// configured maximum falls through to position 3.
    fn position_from_y(&self, y: f32) -> u8 {
        let zones = &self.config.position_zones;
        if y < zones[0].max {
            1
        } else if y < zones[1].max {
            2
        } else {
            3
        }
    }

    /// Sign of the index-tip vs index-MCP depth difference against the
    /// tilt threshold: toward the camera reads sharp, away reads flat.
    fn pitch_offset_of(&self, hand: &HandObservation) -> i8 {
        let z_diff = hand.index_tip().z - hand.landmark(landmarks::INDEX_MCP).z;
        if z_diff > self.config.tilt_threshold {
            -1
        } else if z_diff < -self.config.tilt_threshold {
            1
        } else {
            0
        }
    }
}

/// Fingers (index..pinky) whose tip sits above its PIP joint on screen.
fn count_extended_fingers(hand: &HandObservation) -> u8 {
    FINGER_TIPS
        .iter()
        .zip(FINGER_PIPS.iter())
        .filter(|(tip, pip)| hand.landmark(**tip).y < hand.landmark(**pip).y)
        .count() as u8
}

/// Fingers (index..pinky) curled below their MCP joint — "pressed" on the
/// fingerboard.
fn count_pressed_fingers(hand: &HandObservation) -> u8 {
    FINGER_TIPS
        .iter()
        .zip(FINGER_MCPS.iter())
        .filter(|(tip, mcp)| hand.landmark(**tip).y > hand.landmark(**mcp).y)
        .count() as u8
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::Landmark;

    /// Build a synthetic hand. `extended` raises that many fingertips
    /// above their PIP joints; the rest curl below both PIP and MCP.
    fn mock_hand(
        handedness: Handedness,
        thumb_tip: (f32, f32, f32),
        index_tip: Option<(f32, f32, f32)>,
        extended: usize,
    ) -> HandObservation {
        let mut marks = [Landmark::new(0.5, 0.5, 0.0); 21];
        marks[landmarks::THUMB_TIP] = Landmark::new(thumb_tip.0, thumb_tip.1, thumb_tip.2);

        for (i, (&tip, (&pip, &mcp))) in FINGER_TIPS
            .iter()
            .zip(FINGER_PIPS.iter().zip(FINGER_MCPS.iter()))
            .enumerate()
        {
            marks[pip] = Landmark::new(0.5, 0.5, 0.0);
            marks[mcp] = Landmark::new(0.5, 0.45, 0.0);
            marks[tip] = if i < extended {
                Landmark::new(0.5, 0.4, 0.0)
            } else {
                Landmark::new(0.5, 0.6, 0.0)
            };
        }

        if let Some((x, y, z)) = index_tip {
            marks[landmarks::INDEX_TIP] = Landmark::new(x, y, z);
        }

        HandObservation::new(marks, handedness, 0.95)
    }

    fn pinched_right(extended: usize) -> HandObservation {
        // Thumb tip brought up next to the index tip, which stays above its
        // PIP so the index still counts as extended.
        mock_hand(Handedness::Right, (0.5, 0.44, 0.0), Some((0.51, 0.45, 0.0)), extended)
    }

    fn open_right(extended: usize) -> HandObservation {
        mock_hand(Handedness::Right, (0.2, 0.5, 0.0), None, extended)
    }

    #[test]
    fn initial_state_is_idle() {
        let rec = GestureRecognizer::new(GestureConfig::default());
        let state = rec.state();
        assert!(!state.bow_active);
        assert_eq!(state.string_selected, None);
        assert_eq!(state.position, 1);
        assert_eq!(state.finger_count, 0);
        assert_eq!(state.pitch_offset, 0);
    }

    #[test]
    fn pinch_engages_bow() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let state = rec.recognize(&[pinched_right(2)]);
        assert!(state.bow_active);
    }

    #[test]
    fn open_hand_releases_bow() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        rec.recognize(&[pinched_right(2)]);
        let state = rec.recognize(&[open_right(2)]);
        assert!(!state.bow_active);
    }

    #[test]
    fn dead_zone_keeps_previous_bow_state() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        // Engage, then hold the pinch between the two thresholds (~0.06)
        rec.recognize(&[pinched_right(2)]);
        let between = mock_hand(
            Handedness::Right,
            (0.5, 0.5, 0.0),
            Some((0.56, 0.5, 0.0)),
            2,
        );
        assert!(rec.recognize(&[between.clone()]).bow_active);

        // Release, then the same in-between distance stays released
        rec.recognize(&[open_right(2)]);
        assert!(!rec.recognize(&[between]).bow_active);
    }

    #[test]
    fn extended_fingers_select_string() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        for n in 1..=4 {
            let state = rec.recognize(&[open_right(n)]);
            assert_eq!(state.string_selected, Some(n as u8));
        }
    }

    #[test]
    fn closed_fist_retains_selection() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        rec.recognize(&[open_right(3)]);
        let state = rec.recognize(&[open_right(0)]);
        assert_eq!(state.string_selected, Some(3));
    }

    #[test]
    fn losing_right_hand_resets_bow_and_string() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        rec.recognize(&[pinched_right(2)]);
        let state = rec.recognize(&[]);
        assert!(!state.bow_active);
        assert_eq!(state.string_selected, None);
    }

    #[test]
    fn position_follows_thumb_zone() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let lo = mock_hand(Handedness::Left, (0.5, 0.2, 0.0), None, 0);
        let mid = mock_hand(Handedness::Left, (0.5, 0.5, 0.0), None, 0);
        let hi = mock_hand(Handedness::Left, (0.5, 0.8, 0.0), None, 0);
        assert_eq!(rec.recognize(&[lo]).position, 1);
        assert_eq!(rec.recognize(&[mid]).position, 2);
        assert_eq!(rec.recognize(&[hi]).position, 3);
    }

    #[test]
    fn losing_left_hand_retains_pitch_state() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let hi = mock_hand(Handedness::Left, (0.5, 0.8, 0.0), None, 0);
        rec.recognize(&[hi]);
        let state = rec.recognize(&[open_right(1)]);
        assert_eq!(state.position, 3);
    }

    #[test]
    fn pressed_fingers_counted_against_mcp() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        // mock_hand curls all non-extended fingers below their MCPs
        let left = mock_hand(Handedness::Left, (0.5, 0.2, 0.0), None, 1);
        assert_eq!(rec.recognize(&[left]).finger_count, 3);
    }

    #[test]
    fn index_tilt_sets_pitch_offset() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());

        let flat = mock_hand(Handedness::Left, (0.5, 0.2, 0.0), Some((0.5, 0.4, 0.05)), 0);
        assert_eq!(rec.recognize(&[flat]).pitch_offset, -1);

        let sharp = mock_hand(Handedness::Left, (0.5, 0.2, 0.0), Some((0.5, 0.4, -0.05)), 0);
        assert_eq!(rec.recognize(&[sharp]).pitch_offset, 1);

        let natural = mock_hand(Handedness::Left, (0.5, 0.2, 0.0), Some((0.5, 0.4, 0.01)), 0);
        assert_eq!(rec.recognize(&[natural]).pitch_offset, 0);
    }

    #[test]
    fn both_hands_recognized_together() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let right = pinched_right(3);
        let left = mock_hand(Handedness::Left, (0.5, 0.5, 0.0), None, 0);
        let state = rec.recognize(&[right, left]);
        assert!(state.bow_active);
        assert_eq!(state.string_selected, Some(3));
        assert_eq!(state.position, 2);
    }

    #[test]
    fn duplicate_handedness_last_wins() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        let state = rec.recognize(&[open_right(1), open_right(4)]);
        assert_eq!(state.string_selected, Some(4));
    }

    #[test]
    fn release_threshold_never_below_engage() {
        let config = GestureConfig {
            pinch_engage: 0.10,
            pinch_release: 0.02,
            ..GestureConfig::default()
        };
        let mut rec = GestureRecognizer::new(config);

        // Distance ~0.06: below engage, would be above the raw release.
        // With the sanitized config this must engage and stay engaged.
        let hand = mock_hand(
            Handedness::Right,
            (0.5, 0.5, 0.0),
            Some((0.56, 0.5, 0.0)),
            2,
        );
        assert!(rec.recognize(&[hand.clone()]).bow_active);
        assert!(rec.recognize(&[hand]).bow_active);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut rec = GestureRecognizer::new(GestureConfig::default());
        rec.recognize(&[pinched_right(2)]);
        rec.reset();
        assert_eq!(rec.state(), GestureState::default());
    }
}
