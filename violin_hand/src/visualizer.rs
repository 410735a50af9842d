//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────┬───────────────────────────┐
//! │  FINGERBOARD                 │  NOTE                     │
//! │   G   D   A   E   (strings)  │   A4        (big)         │
//! │  ─── position zone 1 ───     │  bow: ON                  │
//! │  ─── position zone 2 ───     │  string / pos / fingers   │
//! │  ─── position zone 3 ───     │  offset / midi            │
//! │   ● finger dots on string    │                           │
//! ├──────────────────────────────┴───────────────────────────┤
//! │  status bar                                              │
//! │  key legend                                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The window doubles as the simulation input surface: `poll_input`
//! translates key presses into [`SimInput`] events for the sim hand
//! source.

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use std::sync::mpsc::Sender;

use violin_gesture::GestureState;
use violin_model::NoteSpec;

use crate::hand_source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 900;
pub const WIN_H: usize = 540;

const BOARD_X: usize = 60;
const BOARD_Y: usize = 50;
const BOARD_W: usize = 360;
const BOARD_H: usize = 380;
const STRING_GAP: usize = BOARD_W / 4;
const INFO_X: usize = 500;
const STATUS_Y: usize = WIN_H - 58;

const BG_COLOR: u32 = 0xFF1A1A2E;
const BOARD_COLOR: u32 = 0xFF241A14;
const STRING_COLOR: u32 = 0xFFB0B0B0;
const STRING_SELECTED: u32 = 0xFFFFD700;
const STRING_PLAYING: u32 = 0xFF40FF80;
const ZONE_ACTIVE: u32 = 0xFF2E4A6E;
const FINGER_COLOR: u32 = 0xFFFF9040;
const TEXT_BG: u32 = 0xFF0F3460;
const TEXT_DIM: u32 = 0xFF888888;
const TEXT_MAIN: u32 = 0xFFEEEEEE;

/// Display order across the fingerboard, left to right (player's view):
/// string number 4 (G) … string number 1 (E).
const STRING_ORDER: [u8; 4] = [4, 3, 2, 1];
const STRING_LABELS: [&str; 4] = ["G", "D", "A", "E"];

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf: Vec<u32>,
    sim_tx: Sender<SimInput>,
    space_down: bool,
    tick: u64,
}

impl Visualizer {
    pub fn new(title: &str, sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let mut window = Window::new(
            title,
            WIN_W,
            WIN_H,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )
        .map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            space_down: false,
            tick: 0,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll keyboard input and translate to SimInput events.
    /// Returns false when the app should quit.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }

        let one_shot = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::No);
        let repeating = |w: &Window, k: Key| w.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(&self.window, Key::Q) {
            return false;
        }

        let string_keys = [
            (Key::Key1, 1u8),
            (Key::Key2, 2),
            (Key::Key3, 3),
            (Key::Key4, 4),
        ];
        for (key, n) in string_keys {
            if one_shot(&self.window, key) {
                let _ = self.sim_tx.send(SimInput::SelectString(n));
            }
        }

        // Bow follows the space bar: press = pinch, release = open
        let space = self.window.is_key_down(Key::Space);
        if space != self.space_down {
            self.space_down = space;
            let _ = self.sim_tx.send(if space { SimInput::BowDown } else { SimInput::BowUp });
        }

        if repeating(&self.window, Key::Up) {
            let _ = self.sim_tx.send(SimInput::PositionDown);
        }
        if repeating(&self.window, Key::Down) {
            let _ = self.sim_tx.send(SimInput::PositionUp);
        }
        if repeating(&self.window, Key::Right) {
            let _ = self.sim_tx.send(SimInput::FingerMore);
        }
        if repeating(&self.window, Key::Left) {
            let _ = self.sim_tx.send(SimInput::FingerLess);
        }
        if one_shot(&self.window, Key::Comma) {
            let _ = self.sim_tx.send(SimInput::TiltFlat);
        }
        if one_shot(&self.window, Key::Period) {
            let _ = self.sim_tx.send(SimInput::TiltSharp);
        }
        if one_shot(&self.window, Key::N) {
            let _ = self.sim_tx.send(SimInput::TiltNatural);
        }
        if one_shot(&self.window, Key::H) {
            let _ = self.sim_tx.send(SimInput::ToggleHands);
        }

        true
    }

    /// Render one frame.
    pub fn render(&mut self, state: &GestureState, note: Option<&NoteSpec>, status: &str) {
        self.tick += 1;
        self.buf.fill(BG_COLOR);

        self.draw_fingerboard(state, note.is_some());
        self.draw_info_panel(state, note);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, 24, TEXT_BG);
        self.draw_label(status, 10, STATUS_Y + 8, TEXT_MAIN, 1);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "1-4=string  space=bow  up/down=position  left/right=fingers",
            10,
            WIN_H - 26,
            TEXT_DIM,
            1,
        );
        self.draw_label(
            ",=flat  .=sharp  n=natural  h=hide hands  q=quit",
            10,
            WIN_H - 14,
            TEXT_DIM,
            1,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Fingerboard ───────────────────────────────────────────────────────

    fn draw_fingerboard(&mut self, state: &GestureState, playing: bool) {
        self.fill_rect(BOARD_X, BOARD_Y, BOARD_W, BOARD_H, BOARD_COLOR);

        // Position zone bands, active one tinted
        let zone_h = BOARD_H / 3;
        let active_zone = state.position.clamp(1, 3) as usize - 1;
        for zone in 0..3 {
            let y = BOARD_Y + zone * zone_h;
            if zone == active_zone {
                self.fill_rect(BOARD_X, y, BOARD_W, zone_h, ZONE_ACTIVE);
            }
            self.draw_border(BOARD_X, y, BOARD_W, zone_h, 0xFF000000);
            let label = match zone {
                0 => "pos 1",
                1 => "pos 2",
                _ => "pos 3",
            };
            self.draw_label(label, BOARD_X + BOARD_W + 8, y + zone_h / 2, TEXT_DIM, 1);
        }

        // Strings, selected highlighted, pulsing green while sounding
        for (slot, (&number, label)) in STRING_ORDER.iter().zip(STRING_LABELS).enumerate() {
            let x = BOARD_X + STRING_GAP / 2 + slot * STRING_GAP;
            let selected = state.string_selected == Some(number);
            let color = if selected && playing {
                let pulse = (self.tick / 8) % 2 == 0;
                if pulse { STRING_PLAYING } else { STRING_SELECTED }
            } else if selected {
                STRING_SELECTED
            } else {
                STRING_COLOR
            };

            let width = if selected { 3 } else { 1 };
            for dx in 0..width {
                for y in BOARD_Y..BOARD_Y + BOARD_H {
                    self.set_pixel(x + dx, y, color);
                }
            }
            self.draw_label(label, x, BOARD_Y + BOARD_H + 10, color, 2);

            // Finger dots on the selected string inside the active zone
            if selected {
                let zone_top = BOARD_Y + active_zone * zone_h;
                for f in 0..state.finger_count.min(4) as usize {
                    let cy = zone_top + 20 + f * 24;
                    self.fill_rect(x.saturating_sub(4), cy, 10, 10, FINGER_COLOR);
                }
            }
        }
    }

    // ── Info panel ────────────────────────────────────────────────────────

    fn draw_info_panel(&mut self, state: &GestureState, note: Option<&NoteSpec>) {
        self.draw_label("note", INFO_X, BOARD_Y, TEXT_DIM, 1);
        match note {
            Some(spec) => {
                self.draw_label(&spec.note_name, INFO_X, BOARD_Y + 14, STRING_PLAYING, 6);
                self.draw_label(
                    &format!("midi {}", spec.midi_note),
                    INFO_X,
                    BOARD_Y + 54,
                    TEXT_MAIN,
                    1,
                );
            }
            None => self.draw_label("---", INFO_X, BOARD_Y + 14, TEXT_DIM, 6),
        }

        let bow = if state.bow_active { "bow: ON" } else { "bow: off" };
        let bow_color = if state.bow_active { STRING_PLAYING } else { TEXT_DIM };
        self.draw_label(bow, INFO_X, BOARD_Y + 110, bow_color, 2);

        let string = match state.string_selected {
            Some(n) => format!("string: {}", STRING_LABELS[STRING_ORDER.iter().position(|&s| s == n).unwrap_or(0)]),
            None => "string: -".to_string(),
        };
        self.draw_label(&string, INFO_X, BOARD_Y + 140, TEXT_MAIN, 2);
        self.draw_label(&format!("position: {}", state.position), INFO_X, BOARD_Y + 165, TEXT_MAIN, 2);
        self.draw_label(&format!("fingers: {}", state.finger_count), INFO_X, BOARD_Y + 190, TEXT_MAIN, 2);

        let offset = match state.pitch_offset {
            -1 => "offset: flat",
            1 => "offset: sharp",
            _ => "offset: natural",
        };
        self.draw_label(offset, INFO_X, BOARD_Y + 215, TEXT_MAIN, 2);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for col in x..(x + w).min(WIN_W) {
            if y < WIN_H {
                self.buf[y * WIN_W + col] = color;
            }
            if y + h - 1 < WIN_H {
                self.buf[(y + h - 1) * WIN_W + col] = color;
            }
        }
        for row in y..(y + h).min(WIN_H) {
            if x < WIN_W {
                self.buf[row * WIN_W + x] = color;
            }
            if x + w - 1 < WIN_W {
                self.buf[row * WIN_W + x + w - 1] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Minimal bitmap font — 3×5 characters, drawn at an integer scale.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W {
                break;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}
