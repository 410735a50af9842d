//! # violin_model
//!
//! Pure mapping from a discrete violin gesture — string, position, finger
//! count, pitch offset — to a MIDI note number, plus the note-name and
//! fingering utilities built on top of it.
//!
//! Everything in this crate is a total function: out-of-range inputs are
//! clamped to their nearest valid value and the final note is saturated
//! into 0–127, so callers never have to handle an error path.
//!
//! ## Quick start
//!
//! ```rust
//! use violin_model::NoteMapper;
//!
//! let mapper = NoteMapper::default();
//!
//! // Open strings, standard tuning
//! assert_eq!(mapper.get_note(4, 1, 0, 0), 55);  // G3
//! assert_eq!(mapper.get_note(1, 1, 0, 0), 76);  // E5
//!
//! // E string, 2nd position, 3rd finger: 76 + 2 + 6
//! let info = mapper.note_info(1, 2, 3, 0);
//! assert_eq!(info.midi_note, 84);
//! assert_eq!(info.note_name, "C6");
//! ```

// ════════════════════════════════════════════════════════════════════════════
// Note names
// ════════════════════════════════════════════════════════════════════════════

/// Chromatic note names starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch notation for a MIDI note number.
///
/// MIDI 0 is C-1, so 60 → "C4" and 69 → "A4".
///
/// ```rust
/// assert_eq!(violin_model::note_name(69), "A4");
/// assert_eq!(violin_model::note_name(73), "C#5");
/// ```
pub fn note_name(midi_note: u8) -> String {
    let octave = (midi_note as i32) / 12 - 1;
    let index = (midi_note % 12) as usize;
    format!("{}{}", NOTE_NAMES[index], octave)
}

// ════════════════════════════════════════════════════════════════════════════
// Tuning — ordered string table
// ════════════════════════════════════════════════════════════════════════════

/// One string of the instrument: its display name and open-string MIDI note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringSpec {
    pub name: String,
    pub base: u8,
}

/// Ordered open-string table, keyed by string number starting at 1.
///
/// String numbers follow the player's view of the instrument: string 1 is
/// the highest-pitched string, so the table runs E, A, D, G for a violin —
/// a higher string number means a *lower* pitch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tuning {
    entries: Vec<StringSpec>,
}

impl Tuning {
    /// Standard violin tuning: 1→E5 (76), 2→A4 (69), 3→D4 (62), 4→G3 (55).
    pub fn violin() -> Self {
        Tuning::custom(vec![("E", 76), ("A", 69), ("D", 62), ("G", 55)])
    }

    /// Tuning from an ordered list of `(name, open-string MIDI)` pairs.
    /// Entry 0 becomes string 1.
    pub fn custom<S: Into<String>>(entries: Vec<(S, u8)>) -> Self {
        Tuning {
            entries: entries
                .into_iter()
                .map(|(name, base)| StringSpec { name: name.into(), base: base.min(127) })
                .collect(),
        }
    }

    /// Number of strings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clamp a string number into 1..=len.
    pub fn clamp_string(&self, string: i32) -> u8 {
        string.clamp(1, self.entries.len().max(1) as i32) as u8
    }

    /// Open-string MIDI note for `string` (clamped). An empty tuning maps
    /// everything to 0 rather than failing.
    pub fn base(&self, string: i32) -> u8 {
        self.entries
            .get(self.clamp_string(string) as usize - 1)
            .map(|s| s.base)
            .unwrap_or(0)
    }

    /// Display name for `string` (clamped).
    pub fn name(&self, string: i32) -> &str {
        self.entries
            .get(self.clamp_string(string) as usize - 1)
            .map(|s| s.name.as_str())
            .unwrap_or("")
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning::violin()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NoteTables — the full mapping configuration
// ════════════════════════════════════════════════════════════════════════════

/// The semitone tables consumed by [`NoteMapper`].
///
/// * `position_shift[p-1]` — semitones added for position `p` (1..=3).
/// * `finger_shift[f]` — semitones added for `f` pressed fingers (0..=4).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteTables {
    pub tuning: Tuning,
    pub position_shift: [i16; 3],
    pub finger_shift: [i16; 5],
}

impl Default for NoteTables {
    fn default() -> Self {
        NoteTables {
            tuning: Tuning::violin(),
            position_shift: [0, 2, 4],
            finger_shift: [0, 2, 4, 6, 8],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// NoteSpec — the mapper's descriptive output
// ════════════════════════════════════════════════════════════════════════════

/// A fully-described mapped note. Derived purely from the four gesture
/// inputs after clamping; two equal inputs always produce equal specs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteSpec {
    pub midi_note: u8,
    pub string_name: String,
    pub position: u8,
    pub finger: u8,
    pub pitch_offset: i8,
    pub note_name: String,
}

/// One way of producing a target note on the instrument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fingering {
    pub string: u8,
    pub string_name: String,
    pub position: u8,
    pub finger: u8,
    pub pitch_offset: i8,
}

// ════════════════════════════════════════════════════════════════════════════
// NoteMapper
// ════════════════════════════════════════════════════════════════════════════

/// Maps `(string, position, finger_count, pitch_offset)` to a MIDI note.
///
/// Formula: `base(string) + position_shift + finger_shift + pitch_offset`,
/// with every input clamped to its domain first and the sum saturated into
/// 0..=127.
#[derive(Clone, Debug, Default)]
pub struct NoteMapper {
    tables: NoteTables,
}

impl NoteMapper {
    pub fn new(tables: NoteTables) -> Self {
        NoteMapper { tables }
    }

    pub fn tables(&self) -> &NoteTables {
        &self.tables
    }

    /// MIDI note for the given gesture parameters.
    ///
    /// Inputs outside their nominal ranges (string 1..=4, position 1..=3,
    /// finger 0..=4, offset -1..=1) are clamped, never rejected.
    pub fn get_note(&self, string: i32, position: i32, finger_count: i32, pitch_offset: i32) -> u8 {
        let position = position.clamp(1, 3);
        let finger_count = finger_count.clamp(0, 4);
        let pitch_offset = pitch_offset.clamp(-1, 1);

        let base = self.tables.tuning.base(string) as i32;
        let pos_shift = self.tables.position_shift[position as usize - 1] as i32;
        let finger_shift = self.tables.finger_shift[finger_count as usize] as i32;

        (base + pos_shift + finger_shift + pitch_offset).clamp(0, 127) as u8
    }

    /// Same computation as [`get_note`](Self::get_note), with the clamped
    /// inputs and note name echoed back for display and logging.
    pub fn note_info(&self, string: i32, position: i32, finger_count: i32, pitch_offset: i32) -> NoteSpec {
        let midi_note = self.get_note(string, position, finger_count, pitch_offset);
        NoteSpec {
            midi_note,
            string_name: self.tables.tuning.name(string).to_string(),
            position: position.clamp(1, 3) as u8,
            finger: finger_count.clamp(0, 4) as u8,
            pitch_offset: pitch_offset.clamp(-1, 1) as i8,
            note_name: note_name(midi_note),
        }
    }

    /// Every natural (offset 0) note reachable on `string`, as
    /// `(position, finger, midi_note)` rows in table order.
    pub fn notes_for_string(&self, string: i32) -> Vec<(u8, u8, u8)> {
        let mut notes = Vec::new();
        for position in 1..=3 {
            for finger in 0..=4 {
                notes.push((position as u8, finger as u8, self.get_note(string, position, finger, 0)));
            }
        }
        notes
    }

    /// The distinct notes reachable on `string` at `position`, across all
    /// fingers and offsets, sorted ascending. The first fingering found for
    /// a pitch wins.
    pub fn chromatic_scale(&self, string: i32, position: i32) -> Vec<(u8, Fingering)> {
        let mut seen: Vec<(u8, Fingering)> = Vec::new();
        for finger in 0..=4 {
            for offset in [-1, 0, 1] {
                let note = self.get_note(string, position, finger, offset);
                if seen.iter().any(|(n, _)| *n == note) {
                    continue;
                }
                seen.push((
                    note,
                    Fingering {
                        string: self.tables.tuning.clamp_string(string),
                        string_name: self.tables.tuning.name(string).to_string(),
                        position: position.clamp(1, 3) as u8,
                        finger: finger as u8,
                        pitch_offset: offset as i8,
                    },
                ));
            }
        }
        seen.sort_by_key(|(n, _)| *n);
        seen
    }

    /// All fingerings that produce `target_midi`.
    pub fn fingering_options(&self, target_midi: u8) -> Vec<Fingering> {
        let mut options = Vec::new();
        for string in 1..=self.tables.tuning.len() as i32 {
            for position in 1..=3 {
                for finger in 0..=4 {
                    for offset in [-1, 0, 1] {
                        if self.get_note(string, position, finger, offset) == target_midi {
                            options.push(Fingering {
                                string: string as u8,
                                string_name: self.tables.tuning.name(string).to_string(),
                                position: position as u8,
                                finger: finger as u8,
                                pitch_offset: offset as i8,
                            });
                        }
                    }
                }
            }
        }
        options
    }

    /// The most practical fingering for `target_midi`, preferring the given
    /// string, then positions near `preferred_position`, then unmodified
    /// (natural) fingerings. `None` when the note is unreachable.
    pub fn easiest_fingering(
        &self,
        target_midi: u8,
        preferred_string: Option<u8>,
        preferred_position: u8,
    ) -> Option<Fingering> {
        self.fingering_options(target_midi).into_iter().min_by_key(|f| {
            let string_score = match preferred_string {
                Some(s) if s == f.string => 0,
                Some(_) => 1,
                None => 0,
            };
            let position_score = (f.position as i32 - preferred_position as i32).abs();
            let offset_score = f.pitch_offset.unsigned_abs() as i32;
            (string_score, position_score, offset_score)
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> NoteMapper {
        NoteMapper::default()
    }

    #[test]
    fn open_strings() {
        let m = mapper();
        assert_eq!(m.get_note(4, 1, 0, 0), 55); // G3
        assert_eq!(m.get_note(3, 1, 0, 0), 62); // D4
        assert_eq!(m.get_note(2, 1, 0, 0), 69); // A4
        assert_eq!(m.get_note(1, 1, 0, 0), 76); // E5
    }

    #[test]
    fn finger_shifts_on_a_string() {
        let m = mapper();
        assert_eq!(m.get_note(2, 1, 1, 0), 71);
        assert_eq!(m.get_note(2, 1, 2, 0), 73);
        assert_eq!(m.get_note(2, 1, 3, 0), 75);
        assert_eq!(m.get_note(2, 1, 4, 0), 77);
    }

    #[test]
    fn position_shifts_on_a_string() {
        let m = mapper();
        assert_eq!(m.get_note(2, 1, 0, 0), 69);
        assert_eq!(m.get_note(2, 2, 0, 0), 71);
        assert_eq!(m.get_note(2, 3, 0, 0), 73);
    }

    #[test]
    fn pitch_offset_moves_one_semitone() {
        let m = mapper();
        let base = m.get_note(2, 1, 1, 0);
        assert_eq!(m.get_note(2, 1, 1, -1), base - 1);
        assert_eq!(m.get_note(2, 1, 1, 1), base + 1);
    }

    #[test]
    fn combined_calculation() {
        // E string (76), 2nd position (+2), 3rd finger (+6), natural
        assert_eq!(mapper().get_note(1, 2, 3, 0), 84);
    }

    #[test]
    fn inputs_are_clamped() {
        let m = mapper();
        assert_eq!(m.get_note(0, 1, 0, 0), m.get_note(1, 1, 0, 0));
        assert_eq!(m.get_note(10, 1, 0, 0), m.get_note(4, 1, 0, 0));
        assert_eq!(m.get_note(2, 0, 0, 0), m.get_note(2, 1, 0, 0));
        assert_eq!(m.get_note(2, 5, 0, 0), m.get_note(2, 3, 0, 0));
        assert_eq!(m.get_note(2, 1, -1, 0), m.get_note(2, 1, 0, 0));
        assert_eq!(m.get_note(2, 1, 10, 0), m.get_note(2, 1, 4, 0));
        assert_eq!(m.get_note(2, 1, 0, -5), m.get_note(2, 1, 0, -1));
    }

    #[test]
    fn result_is_always_valid_midi() {
        let m = mapper();
        for string in -2..8 {
            for position in -1..6 {
                for finger in -2..8 {
                    for offset in -3..4 {
                        let note = m.get_note(string, position, finger, offset);
                        assert!(note <= 127);
                    }
                }
            }
        }
    }

    #[test]
    fn mapping_is_deterministic() {
        let m = mapper();
        let first = m.get_note(1, 3, 4, 1);
        for _ in 0..10 {
            assert_eq!(m.get_note(1, 3, 4, 1), first);
        }
    }

    #[test]
    fn note_names_use_scientific_pitch() {
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(72), "C5");
        assert_eq!(note_name(73), "C#5");
        assert_eq!(note_name(0), "C-1");
    }

    #[test]
    fn note_info_reports_clamped_inputs() {
        let info = mapper().note_info(2, 1, 0, 0);
        assert_eq!(info.midi_note, 69);
        assert_eq!(info.string_name, "A");
        assert_eq!(info.position, 1);
        assert_eq!(info.finger, 0);
        assert_eq!(info.note_name, "A4");

        let clamped = mapper().note_info(10, 9, 9, 9);
        assert_eq!(clamped.string_name, "G");
        assert_eq!(clamped.position, 3);
        assert_eq!(clamped.finger, 4);
        assert_eq!(clamped.pitch_offset, 1);
    }

    #[test]
    fn custom_tables_override_defaults() {
        let tables = NoteTables {
            tuning: Tuning::custom(vec![("C", 48), ("G", 43)]),
            position_shift: [0, 5, 7],
            finger_shift: [0, 1, 2, 3, 4],
        };
        let m = NoteMapper::new(tables);
        assert_eq!(m.get_note(1, 1, 0, 0), 48);
        assert_eq!(m.get_note(2, 2, 3, 0), 43 + 5 + 3);
        // String clamps to the table length, not the violin's 4
        assert_eq!(m.get_note(9, 1, 0, 0), 43);
    }

    #[test]
    fn notes_for_string_covers_grid() {
        let rows = mapper().notes_for_string(2);
        assert_eq!(rows.len(), 15);
        assert_eq!(rows[0], (1, 0, 69));
        assert_eq!(rows[14], (3, 4, 69 + 4 + 8));
    }

    #[test]
    fn chromatic_scale_is_sorted_and_unique() {
        let scale = mapper().chromatic_scale(2, 1);
        for pair in scale.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
        // A string, 1st position: 68 (flat open) through 78 (sharp 4th finger)
        assert_eq!(scale.first().unwrap().0, 68);
        assert_eq!(scale.last().unwrap().0, 78);
    }

    #[test]
    fn fingering_options_find_shared_notes() {
        // A4 (69) is the open A string and also reachable up the D string
        let options = mapper().fingering_options(69);
        assert!(options.iter().any(|f| f.string == 2 && f.finger == 0 && f.pitch_offset == 0));
        assert!(options.iter().any(|f| f.string == 3));
    }

    #[test]
    fn easiest_fingering_prefers_string_and_natural() {
        let best = mapper().easiest_fingering(69, Some(2), 1).unwrap();
        assert_eq!(best.string, 2);
        assert_eq!(best.finger, 0);
        assert_eq!(best.pitch_offset, 0);
    }

    #[test]
    fn unreachable_note_has_no_fingering() {
        assert!(mapper().easiest_fingering(0, None, 1).is_none());
    }
}
