//! Timestamp-driven key tracking for modes the host keymap cannot express:
//! hold, chords, double clicks and mouse buttons held as modifiers.
//!
//! Timestamps are seconds from the host's timer events. Nothing here sleeps.

use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::config::Settings;
use crate::hotkey::Key;

/// Which keys are currently down and since when.
#[derive(Debug, Default, Clone)]
pub struct KeyStateTracker {
    held: FxHashMap<Key, f64>,
}

impl KeyStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a press. Returns false for auto-repeat of a key already down.
    pub fn press(&mut self, key: Key, now: f64) -> bool {
        if self.held.contains_key(&key) {
            return false;
        }
        self.held.insert(key, now);
        true
    }

    /// Records a release and returns how long the key was held.
    pub fn release(&mut self, key: Key, now: f64) -> Option<f64> {
        self.held.remove(&key).map(|since| now - since)
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains_key(&key)
    }

    pub fn held_since(&self, key: Key) -> Option<f64> {
        self.held.get(&key).copied()
    }

    /// Mouse buttons currently down, usable as pseudo-modifiers.
    pub fn held_mouse_buttons(&self) -> impl Iterator<Item = Key> + '_ {
        self.held.keys().copied().filter(Key::is_mouse_button)
    }

    /// True when `key_mod` is satisfied: either unset or currently held.
    pub fn modifier_satisfied(&self, key_mod: Key) -> bool {
        key_mod.is_none() || self.is_held(key_mod)
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOutcome {
    Idle,
    Waiting,
    /// Threshold reached while still held. Reported once per press.
    Hold,
    /// Released before the threshold.
    Tap,
}

#[derive(Debug, Clone)]
pub struct HoldDetector {
    threshold: f64,
    pressed_at: Option<f64>,
    fired: bool,
}

impl HoldDetector {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold: threshold.as_secs_f64(),
            pressed_at: None,
            fired: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.hold_time())
    }

    pub fn press(&mut self, now: f64) {
        self.pressed_at = Some(now);
        self.fired = false;
    }

    /// Timer tick.
    pub fn update(&mut self, now: f64) -> HoldOutcome {
        match self.pressed_at {
            None => HoldOutcome::Idle,
            Some(_) if self.fired => HoldOutcome::Waiting,
            Some(at) if now - at >= self.threshold => {
                self.fired = true;
                HoldOutcome::Hold
            }
            Some(_) => HoldOutcome::Waiting,
        }
    }

    pub fn release(&mut self, now: f64) -> HoldOutcome {
        let Some(at) = self.pressed_at.take() else {
            return HoldOutcome::Idle;
        };
        if self.fired || now - at >= self.threshold {
            HoldOutcome::Idle
        } else {
            HoldOutcome::Tap
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordOutcome {
    Idle,
    Waiting,
    /// The second key arrived in time.
    Completed { first: Key, second: Key },
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ChordDetector {
    timeout: f64,
    first: Option<(Key, f64)>,
}

impl ChordDetector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: timeout.as_secs_f64(),
            first: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.chord_time())
    }

    /// Starts waiting for the second key.
    pub fn start(&mut self, first: Key, now: f64) {
        self.first = Some((first, now));
    }

    pub fn is_waiting(&self) -> bool {
        self.first.is_some()
    }

    /// Feeds a key press while waiting.
    pub fn key(&mut self, key: Key, now: f64) -> ChordOutcome {
        match self.first.take() {
            None => ChordOutcome::Idle,
            Some((_, at)) if now - at > self.timeout => ChordOutcome::TimedOut,
            Some((first, _)) => ChordOutcome::Completed { first, second: key },
        }
    }

    /// Timer tick.
    pub fn update(&mut self, now: f64) -> ChordOutcome {
        match self.first {
            None => ChordOutcome::Idle,
            Some((_, at)) if now - at > self.timeout => {
                self.first = None;
                ChordOutcome::TimedOut
            }
            Some(_) => ChordOutcome::Waiting,
        }
    }

    pub fn cancel(&mut self) {
        self.first = None;
    }
}

#[derive(Debug, Clone)]
pub struct DoubleClickDetector {
    window: f64,
    last: Option<(Key, f64)>,
}

impl DoubleClickDetector {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.as_secs_f64(),
            last: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.double_click_time())
    }

    /// Returns true when this click completes a double click of the same key.
    pub fn click(&mut self, key: Key, now: f64) -> bool {
        match self.last {
            Some((last, at)) if last == key && now - at <= self.window => {
                self.last = None;
                true
            }
            _ => {
                self.last = Some((key, now));
                false
            }
        }
    }
}
