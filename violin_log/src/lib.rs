//! # violin_log
//!
//! Performance logging for practice sessions. Every emitted note-on is
//! reported here together with the gesture snapshot that produced it; a
//! worker thread accumulates statistics and writes a JSON summary when
//! the session ends.
//!
//! The logger must never slow down or break the interaction loop:
//! [`SessionLogger::log_note`] is a non-blocking channel send whose
//! failure is ignored, and file I/O problems on the worker are logged and
//! swallowed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Records
// ════════════════════════════════════════════════════════════════════════════

/// One logged note-on with the gesture snapshot that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Milliseconds since the UNIX epoch.
    pub at_ms: u64,
    pub midi_note: u8,
    pub note_name: String,
    pub string: Option<String>,
    pub position: u8,
    pub finger_count: u8,
    pub pitch_offset: i8,
    pub velocity: u8,
}

/// The summary written at session end.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    pub total_notes: u32,
    pub unique_notes: u32,
    pub avg_note_duration_ms: Option<f64>,
    pub notes_per_minute: Option<f64>,
    pub notes: Vec<NoteRecord>,
}

// ════════════════════════════════════════════════════════════════════════════
// SessionStats — the pure accumulator behind the worker thread
// ════════════════════════════════════════════════════════════════════════════

/// Accumulates session statistics from a stream of note records.
///
/// Records arriving less than `log_interval_ms` after the previous
/// accepted one are dropped, bounding the write volume during fast
/// passages. The duration of a note is measured when its successor
/// arrives, so the final note has no duration sample.
#[derive(Debug)]
pub struct SessionStats {
    log_interval_ms: u64,
    started_at_ms: u64,
    notes: Vec<NoteRecord>,
    durations_ms: Vec<u64>,
    last_accepted_ms: Option<u64>,
}

impl SessionStats {
    pub fn new(started_at_ms: u64, log_interval_ms: u64) -> Self {
        SessionStats {
            log_interval_ms,
            started_at_ms,
            notes: Vec::new(),
            durations_ms: Vec::new(),
            last_accepted_ms: None,
        }
    }

    /// Offer a record; returns whether it was accepted.
    pub fn record(&mut self, note: NoteRecord) -> bool {
        if let Some(last) = self.last_accepted_ms {
            if note.at_ms.saturating_sub(last) < self.log_interval_ms {
                // dropped by the interval throttle
                return false;
            }
            self.durations_ms.push(note.at_ms.saturating_sub(last));
        }
        self.last_accepted_ms = Some(note.at_ms);
        self.notes.push(note);
        true
    }

    pub fn total_notes(&self) -> u32 {
        self.notes.len() as u32
    }

    pub fn unique_notes(&self) -> u32 {
        let mut seen: Vec<u8> = Vec::new();
        for n in &self.notes {
            if !seen.contains(&n.midi_note) {
                seen.push(n.midi_note);
            }
        }
        seen.len() as u32
    }

    /// Finalize into a summary at `ended_at_ms`.
    pub fn finish(self, ended_at_ms: u64) -> SessionSummary {
        let avg_note_duration_ms = if self.durations_ms.is_empty() {
            None
        } else {
            Some(self.durations_ms.iter().sum::<u64>() as f64 / self.durations_ms.len() as f64)
        };

        let minutes = ended_at_ms.saturating_sub(self.started_at_ms) as f64 / 60_000.0;
        let notes_per_minute = if minutes > 0.0 && !self.notes.is_empty() {
            Some(self.notes.len() as f64 / minutes)
        } else {
            None
        };

        SessionSummary {
            started_at_ms: self.started_at_ms,
            ended_at_ms,
            total_notes: self.notes.len() as u32,
            unique_notes: self.unique_notes(),
            avg_note_duration_ms,
            notes_per_minute,
            notes: self.notes,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SessionLogger — the worker-thread front
// ════════════════════════════════════════════════════════════════════════════

enum LogEvent {
    Note(NoteRecord),
    End,
}

/// Handle to the logging worker thread.
pub struct SessionLogger {
    tx: Sender<LogEvent>,
    worker: Option<JoinHandle<()>>,
}

impl SessionLogger {
    /// Start a session: spawn the worker and remember where the summary
    /// will be written. The directory is created lazily at write time.
    pub fn start(dir: impl Into<PathBuf>, log_interval_ms: u64) -> Self {
        let dir = dir.into();
        let started = now_ms();
        let (tx, rx) = mpsc::channel::<LogEvent>();

        let worker = thread::spawn(move || {
            let mut stats = SessionStats::new(started, log_interval_ms);
            for event in rx {
                match event {
                    LogEvent::Note(note) => {
                        stats.record(note);
                    }
                    LogEvent::End => break,
                }
            }
            let summary = stats.finish(now_ms());
            write_summary(&dir, &summary);
        });

        log::info!("session logging started");
        SessionLogger { tx, worker: Some(worker) }
    }

    /// Report a note-on. Never blocks; a dead worker is silently ignored.
    pub fn log_note(&self, note: NoteRecord) {
        let _ = self.tx.send(LogEvent::Note(note));
    }

    /// End the session: flush the summary file and join the worker.
    pub fn end_session(mut self) {
        let _ = self.tx.send(LogEvent::End);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for SessionLogger {
    fn drop(&mut self) {
        let _ = self.tx.send(LogEvent::End);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn write_summary(dir: &Path, summary: &SessionSummary) {
    if let Err(e) = fs::create_dir_all(dir) {
        log::warn!("could not create session log dir {:?}: {}", dir, e);
        return;
    }
    let path = dir.join(format!("session_{}.json", summary.started_at_ms / 1000));
    match fs::File::create(&path) {
        Ok(file) => {
            if let Err(e) = serde_json::to_writer_pretty(file, summary) {
                log::warn!("could not write session summary {:?}: {}", path, e);
            } else {
                log::info!(
                    "session summary written: {:?} ({} notes)",
                    path,
                    summary.total_notes
                );
            }
        }
        Err(e) => log::warn!("could not create session summary {:?}: {}", path, e),
    }
}

/// Milliseconds since the UNIX epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn record(at_ms: u64, midi_note: u8) -> NoteRecord {
        NoteRecord {
            at_ms,
            midi_note,
            note_name: violin_note_name(midi_note),
            string: Some("A".to_string()),
            position: 1,
            finger_count: 0,
            pitch_offset: 0,
            velocity: 100,
        }
    }

    // Just enough naming for readable fixtures
    fn violin_note_name(midi: u8) -> String {
        const NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        format!("{}{}", NAMES[(midi % 12) as usize], midi as i32 / 12 - 1)
    }

    #[test]
    fn counts_total_and_unique_notes() {
        let mut stats = SessionStats::new(0, 0);
        stats.record(record(0, 69));
        stats.record(record(100, 71));
        stats.record(record(200, 69));
        assert_eq!(stats.total_notes(), 3);
        assert_eq!(stats.unique_notes(), 2);
    }

    #[test]
    fn interval_throttle_drops_rapid_records() {
        let mut stats = SessionStats::new(0, 100);
        stats.record(record(0, 69));
        stats.record(record(50, 70)); // inside the interval: dropped
        stats.record(record(150, 71));
        assert_eq!(stats.total_notes(), 2);
    }

    #[test]
    fn durations_measured_between_accepted_notes() {
        let mut stats = SessionStats::new(0, 0);
        stats.record(record(0, 69));
        stats.record(record(250, 71));
        stats.record(record(500, 72));
        let summary = stats.finish(1000);
        assert_eq!(summary.avg_note_duration_ms, Some(250.0));
    }

    #[test]
    fn empty_session_has_no_derived_metrics() {
        let stats = SessionStats::new(0, 100);
        let summary = stats.finish(60_000);
        assert_eq!(summary.total_notes, 0);
        assert_eq!(summary.avg_note_duration_ms, None);
        assert_eq!(summary.notes_per_minute, None);
    }

    #[test]
    fn notes_per_minute_uses_session_span() {
        let mut stats = SessionStats::new(0, 0);
        for i in 0..30 {
            stats.record(record(i * 1000, 69));
        }
        // 30 notes over a 60s session
        let summary = stats.finish(60_000);
        assert_eq!(summary.notes_per_minute, Some(30.0));
    }

    #[test]
    fn summary_round_trips_through_json() {
        let mut stats = SessionStats::new(10, 0);
        stats.record(record(20, 69));
        let summary = stats.finish(30);

        let text = serde_json::to_string(&summary).unwrap();
        let back: SessionSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(back.total_notes, 1);
        assert_eq!(back.notes[0].midi_note, 69);
        assert_eq!(back.notes[0].note_name, "A4");
    }

    #[test]
    fn logger_writes_summary_file() {
        let dir = std::env::temp_dir().join(format!("violin_log_test_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let logger = SessionLogger::start(&dir, 0);
        logger.log_note(record(now_ms(), 69));
        logger.end_session();

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let _ = fs::remove_dir_all(&dir);
    }
}
