/// Keyboard state tracker and key bindings.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement and fire while a key is held
///   - Edge-triggered menu keys (pause, confirm, quit)
///
/// Bindings:
///
/// ```text
///   P1   arrows  move    Space  fire
///   P2   W A S D move    Tab    fire
///        Esc     pause   Q      quit   Enter / 1 / 2  start
///        M       mute
/// ```
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{FrameInput, InputSnapshot};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const P1_KEYS: PlayerKeys = PlayerKeys {
    up: &[KeyCode::Up],
    down: &[KeyCode::Down],
    left: &[KeyCode::Left],
    right: &[KeyCode::Right],
    fire: &[KeyCode::Char(' ')],
};

const P2_KEYS: PlayerKeys = PlayerKeys {
    up: &[KeyCode::Char('w'), KeyCode::Char('W')],
    down: &[KeyCode::Char('s'), KeyCode::Char('S')],
    left: &[KeyCode::Char('a'), KeyCode::Char('A')],
    right: &[KeyCode::Char('d'), KeyCode::Char('D')],
    fire: &[KeyCode::Tab],
};

struct PlayerKeys {
    up: &'static [KeyCode],
    down: &'static [KeyCode],
    left: &'static [KeyCode],
    right: &'static [KeyCode],
    fire: &'static [KeyCode],
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C and text.
    raw_events: Vec<KeyEvent>,

    /// Honor Release events. Only set once keyboard enhancement is confirmed.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                match key.kind {
                    KeyEventKind::Release if self.honor_release => {
                        self.last_active.remove(&key.code);
                    }
                    KeyEventKind::Release => {}
                    _ => self.press(key.code, Instant::now()),
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn press(&mut self, code: KeyCode, at: Instant) {
        if !self.is_held(code) {
            self.fresh_presses.push(code);
        }
        self.last_active.insert(code, at);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code).is_some_and(|t| t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Freshly pressed this frame (edge trigger).
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    // ── Menu keys ──

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) || self.ctrl_c_pressed()
    }

    pub fn pause_pressed(&self) -> bool {
        self.was_pressed(KeyCode::Esc)
    }

    pub fn mute_pressed(&self) -> bool {
        self.any_pressed(&[KeyCode::Char('m'), KeyCode::Char('M')])
    }

    /// Title screen: Some(two_players) once a start key is hit.
    pub fn start_pressed(&self) -> Option<bool> {
        if self.was_pressed(KeyCode::Char('2')) {
            Some(true)
        } else if self.any_pressed(&[KeyCode::Enter, KeyCode::Char('1')]) {
            Some(false)
        } else {
            None
        }
    }

    /// Enter only. Space doubles as fire, and a held key reads as a fresh
    /// press again once auto-repeat outlasts `HOLD_TIMEOUT`.
    pub fn confirm_pressed(&self) -> bool {
        self.was_pressed(KeyCode::Enter)
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    // ── Game input ──

    /// Build both players' snapshots from the held keys.
    pub fn frame_input(&self) -> FrameInput {
        let mut primary = self.snapshot(&P1_KEYS);
        primary.pause = self.pause_pressed();
        primary.backspace = self.was_pressed(KeyCode::Backspace);
        primary.text = self.typed_text();
        FrameInput { primary, secondary: self.snapshot(&P2_KEYS) }
    }

    fn snapshot(&self, keys: &PlayerKeys) -> InputSnapshot {
        InputSnapshot {
            up: self.any_held(keys.up),
            down: self.any_held(keys.down),
            left: self.any_held(keys.left),
            right: self.any_held(keys.right),
            fire: self.any_held(keys.fire),
            ..Default::default()
        }
    }

    fn typed_text(&self) -> Option<String> {
        let text: String = self.raw_events.iter()
            .filter(|k| k.kind != KeyEventKind::Release)
            .filter_map(|k| match k.code {
                KeyCode::Char(c) if !c.is_control() => Some(c),
                _ => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }
}
