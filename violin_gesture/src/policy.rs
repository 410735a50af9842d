//! Note-change / debounce policy.
//!
//! A two-state machine — `Idle` or sounding one note — sitting between the
//! recognizer and the MIDI sink. Landmark jitter can flip the computed
//! note by a semitone frame-to-frame; this machine absorbs any change that
//! arrives inside the debounce window so downstream sinks only ever see
//! deliberate transitions, always as strict note-off/note-on pairs.
//!
//! Time is injected by the caller as monotonic milliseconds, which keeps
//! the machine deterministic and directly testable.

/// What the caller must emit after a [`NotePolicy::update`] call.
///
/// For `Replace`, the note-off for `off` goes out before the note-on for
/// `on`, so a sink never holds two notes at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteTransition {
    Start(u8),
    Stop(u8),
    Replace { off: u8, on: u8 },
}

/// Debounced note-change decisions.
pub struct NotePolicy {
    debounce_ms: u64,
    sounding: Option<u8>,
    last_change_ms: u64,
}

impl NotePolicy {
    /// Default debounce window.
    pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

    pub fn new(debounce_ms: u64) -> Self {
        NotePolicy {
            debounce_ms,
            sounding: None,
            last_change_ms: 0,
        }
    }

    /// The note currently sounding, if any.
    pub fn sounding(&self) -> Option<u8> {
        self.sounding
    }

    /// Feed one frame's candidate note.
    ///
    /// `candidate` is the mapper's output when the bow is active and a
    /// string is selected, `None` otherwise. `now_ms` is monotonic.
    ///
    /// * `None` candidate stops the sounding note immediately.
    /// * From idle, a candidate starts immediately.
    /// * While sounding, an equal candidate does nothing; a differing one
    ///   is accepted only once `debounce_ms` has elapsed since the last
    ///   accepted change.
    pub fn update(&mut self, candidate: Option<u8>, now_ms: u64) -> Option<NoteTransition> {
        match (self.sounding, candidate) {
            (None, None) => None,
            (Some(old), None) => {
                self.sounding = None;
                Some(NoteTransition::Stop(old))
            }
            (None, Some(new)) => {
                self.sounding = Some(new);
                self.last_change_ms = now_ms;
                Some(NoteTransition::Start(new))
            }
            (Some(old), Some(new)) if old == new => None,
            (Some(old), Some(new)) => {
                if now_ms.saturating_sub(self.last_change_ms) < self.debounce_ms {
                    return None;
                }
                self.sounding = Some(new);
                self.last_change_ms = now_ms;
                Some(NoteTransition::Replace { off: old, on: new })
            }
        }
    }
}

impl Default for NotePolicy {
    fn default() -> Self {
        NotePolicy::new(Self::DEFAULT_DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_with_no_candidate_does_nothing() {
        let mut policy = NotePolicy::default();
        assert_eq!(policy.update(None, 0), None);
        assert_eq!(policy.sounding(), None);
    }

    #[test]
    fn start_from_idle_is_immediate() {
        let mut policy = NotePolicy::default();
        assert_eq!(policy.update(Some(69), 10), Some(NoteTransition::Start(69)));
        assert_eq!(policy.sounding(), Some(69));
    }

    #[test]
    fn equal_candidate_holds_the_note() {
        let mut policy = NotePolicy::default();
        policy.update(Some(69), 0);
        for t in 1..20 {
            assert_eq!(policy.update(Some(69), t), None);
        }
        assert_eq!(policy.sounding(), Some(69));
    }

    #[test]
    fn stop_is_immediate() {
        let mut policy = NotePolicy::default();
        policy.update(Some(69), 0);
        assert_eq!(policy.update(None, 5), Some(NoteTransition::Stop(69)));
        assert_eq!(policy.sounding(), None);
    }

    #[test]
    fn rapid_changes_are_absorbed() {
        let mut policy = NotePolicy::default();
        policy.update(Some(69), 0);
        // Two changes inside the 50ms window: neither goes through
        assert_eq!(policy.update(Some(70), 20), None);
        assert_eq!(policy.update(Some(71), 40), None);
        assert_eq!(policy.sounding(), Some(69));
    }

    #[test]
    fn change_after_window_replaces() {
        let mut policy = NotePolicy::default();
        policy.update(Some(69), 0);
        assert_eq!(
            policy.update(Some(71), 60),
            Some(NoteTransition::Replace { off: 69, on: 71 })
        );
        assert_eq!(policy.sounding(), Some(71));
    }

    #[test]
    fn window_restarts_on_each_accepted_change() {
        let mut policy = NotePolicy::default();
        policy.update(Some(69), 0);
        policy.update(Some(71), 60);
        // 30ms after the accepted change: still inside the new window
        assert_eq!(policy.update(Some(72), 90), None);
        assert_eq!(
            policy.update(Some(72), 111),
            Some(NoteTransition::Replace { off: 71, on: 72 })
        );
    }

    #[test]
    fn restart_after_stop_is_immediate() {
        let mut policy = NotePolicy::default();
        policy.update(Some(69), 0);
        policy.update(None, 10);
        assert_eq!(policy.update(Some(69), 15), Some(NoteTransition::Start(69)));
    }

    #[test]
    fn zero_debounce_accepts_every_change() {
        let mut policy = NotePolicy::new(0);
        policy.update(Some(60), 0);
        assert_eq!(
            policy.update(Some(61), 0),
            Some(NoteTransition::Replace { off: 60, on: 61 })
        );
    }
}
