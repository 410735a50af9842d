//! Real-time MIDI output thread.
//!
//! Note-on/note-off decisions arrive from the app loop over a channel and
//! are forwarded to a MIDI output port. The thread tracks which notes are
//! sounding so that shutdown (or an explicit all-off) always releases
//! everything.

use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::config::MidiConfig;

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub enum PlayerCommand {
    NoteOn(u8),
    NoteOff(u8),
    /// Release every sounding note.
    AllOff,
    /// Release everything and terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing and no-port hosts)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        let _ = self.conn.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let _ = self.conn.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        let _ = self.conn.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8) {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8) {}
    fn note_off(&mut self, _ch: u8, _n: u8) {}
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output — pick a port, create one, or fall back to null
// ════════════════════════════════════════════════════════════════════════════

/// Open a MIDI output: first a port matching the configured name, then a
/// visible softsynth, then the first port; with no ports at all, create a
/// virtual port under the configured name (unix) or go silent.
fn open_midi_output(port_hint: &str) -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("violin_hand") {
        Ok(m) => m,
        Err(e) => {
            log::warn!("MIDI init error: {} — output disabled", e);
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        return create_virtual(midi_out, port_hint);
    }

    let hint = port_hint.to_lowercase();
    let named = |p: &midir::MidiOutputPort| midi_out.port_name(p).unwrap_or_default().to_lowercase();

    let port_idx = ports
        .iter()
        .position(|p| !hint.is_empty() && named(p).contains(&hint))
        .or_else(|| {
            ports.iter().position(|p| {
                let n = named(p);
                n.contains("fluid")
                    || n.contains("timidity")
                    || n.contains("microsoft")
                    || n.contains("gm")
                    || n.contains("synth")
            })
        })
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());

    match midi_out.connect(port, "violin-hand-out") {
        Ok(conn) => {
            log::info!("MIDI output: {}", name);
            Box::new(MidirOut { conn })
        }
        Err(e) => {
            log::warn!("MIDI connect to {} failed: {} — output disabled", name, e);
            Box::new(NullOut)
        }
    }
}

#[cfg(unix)]
fn create_virtual(midi_out: midir::MidiOutput, port_hint: &str) -> Box<dyn MidiOut> {
    use midir::os::unix::VirtualOutput;
    match midi_out.create_virtual(port_hint) {
        Ok(conn) => {
            log::info!("created virtual MIDI port '{}'", port_hint);
            Box::new(MidirOut { conn })
        }
        Err(e) => {
            log::warn!("no MIDI ports and virtual port failed: {} — output disabled", e);
            Box::new(NullOut)
        }
    }
}

#[cfg(not(unix))]
fn create_virtual(_midi_out: midir::MidiOutput, _port_hint: &str) -> Box<dyn MidiOut> {
    log::warn!("no MIDI output ports found — output disabled");
    log::warn!("install a software synthesiser such as fluidsynth or timidity");
    Box::new(NullOut)
}

// ════════════════════════════════════════════════════════════════════════════
// Player — handle to the output thread
// ════════════════════════════════════════════════════════════════════════════

pub struct Player {
    cmd_tx: Sender<PlayerCommand>,
}

impl Player {
    /// Spawn the output thread: open a port, send the program change, then
    /// serve commands until `Quit`.
    pub fn spawn(config: &MidiConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let port_hint = config.port_name.clone();
        let channel = config.channel & 0x0F;
        let velocity = config.velocity.min(127);
        let program = config.program.min(127);

        thread::spawn(move || {
            let midi = open_midi_output(&port_hint);
            player_thread(midi, channel, velocity, program, cmd_rx);
        });

        Player { cmd_tx }
    }

    pub fn note_on(&self, note: u8) {
        let _ = self.cmd_tx.send(PlayerCommand::NoteOn(note));
    }

    pub fn note_off(&self, note: u8) {
        let _ = self.cmd_tx.send(PlayerCommand::NoteOff(note));
    }

    pub fn all_off(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::AllOff);
    }

    pub fn quit(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
    }
}

fn player_thread(
    mut midi: Box<dyn MidiOut>,
    channel: u8,
    velocity: u8,
    program: u8,
    cmd_rx: Receiver<PlayerCommand>,
) {
    midi.program_change(channel, program);
    let mut active: HashSet<u8> = HashSet::new();

    for cmd in cmd_rx {
        match cmd {
            PlayerCommand::NoteOn(note) => {
                midi.note_on(channel, note, velocity);
                active.insert(note);
            }
            PlayerCommand::NoteOff(note) => {
                midi.note_off(channel, note);
                active.remove(&note);
            }
            PlayerCommand::AllOff => {
                for note in active.drain() {
                    midi.note_off(channel, note);
                }
            }
            PlayerCommand::Quit => break,
        }
    }

    // Whether we got Quit or the app side hung up, leave nothing sounding.
    for note in active.drain() {
        midi.note_off(channel, note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recording {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl MidiOut for Recording {
        fn program_change(&mut self, ch: u8, p: u8) {
            self.events.lock().unwrap().push(format!("pc {} {}", ch, p));
        }
        fn note_on(&mut self, ch: u8, n: u8, v: u8) {
            self.events.lock().unwrap().push(format!("on {} {} {}", ch, n, v));
        }
        fn note_off(&mut self, ch: u8, n: u8) {
            self.events.lock().unwrap().push(format!("off {} {}", ch, n));
        }
    }

    fn run_commands(cmds: Vec<PlayerCommand>) -> Vec<String> {
        let recording = Recording::default();
        let events = recording.events.clone();
        let (tx, rx) = mpsc::channel();
        for cmd in cmds {
            tx.send(cmd).unwrap();
        }
        drop(tx);
        player_thread(Box::new(recording), 0, 100, 40, rx);
        let out = events.lock().unwrap().clone();
        out
    }

    #[test]
    fn program_change_goes_first() {
        let events = run_commands(vec![PlayerCommand::NoteOn(69)]);
        assert_eq!(events[0], "pc 0 40");
        assert_eq!(events[1], "on 0 69 100");
    }

    #[test]
    fn notes_are_paired_on_off() {
        let events = run_commands(vec![
            PlayerCommand::NoteOn(69),
            PlayerCommand::NoteOff(69),
            PlayerCommand::Quit,
        ]);
        assert_eq!(events[1..], ["on 0 69 100", "off 0 69"]);
    }

    #[test]
    fn hangup_releases_active_notes() {
        // Channel closed without Quit: the sounding note still gets an off
        let events = run_commands(vec![PlayerCommand::NoteOn(72)]);
        assert!(events.contains(&"off 0 72".to_string()));
    }

    #[test]
    fn all_off_clears_everything() {
        let events = run_commands(vec![
            PlayerCommand::NoteOn(60),
            PlayerCommand::NoteOn(64),
            PlayerCommand::AllOff,
            PlayerCommand::Quit,
        ]);
        let offs = events.iter().filter(|e| e.starts_with("off")).count();
        assert_eq!(offs, 2);
    }
}
