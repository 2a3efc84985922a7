//! Input state tracking: edge-triggered keys plus a queue of pointer clicks.
//!
//! - **Keys** are edge-triggered: `is_just_pressed(key)` is true only during the
//!   frame the press happened and is cleared by `end_frame()`.
//!
//! - **Clicks** are queued, not edge flags. Every left-button press records the
//!   pointer position at that moment, so two presses inside one frame are two
//!   clicks. The main loop drains the queue once per frame and hands each click
//!   to the match engine in arrival order.
//!
//! Positions are logical pixels; the platform layer converts from physical
//! pixels before calling `pointer_moved`.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    R,
    F3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

/// A left-button press at a board position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerClick {
    pub x: i32,
    pub y: i32,
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    pending_clicks: Vec<PointerClick>,

    pub mouse_position: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            mouse_held: HashSet::new(),
            pending_clicks: Vec::new(),
            mouse_position: (0.0, 0.0),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.mouse_position = (x, y);
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        if self.mouse_held.insert(btn) && btn == MouseBtn::Left {
            let (x, y) = self.mouse_position;
            self.pending_clicks.push(PointerClick {
                x: x.floor() as i32,
                y: y.floor() as i32,
            });
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        self.mouse_held.remove(&btn);
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Take every click queued since the last drain, oldest first.
    pub fn drain_clicks(&mut self) -> Vec<PointerClick> {
        std::mem::take(&mut self.pending_clicks)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
