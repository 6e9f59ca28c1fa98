//! Swipe trail
//!
//! The blade is a short polyline of recent pointer positions. Only one
//! pointer drives it at a time: the one that pressed first owns it until
//! it lifts.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_BLADE_POINTS;

/// Pointer input routed to the blade (positions in CSS px, canvas-relative)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BladeInput {
    Press { pointer_id: i32, pos: Vec2 },
    Drag { pointer_id: i32, pos: Vec2 },
    Release { pointer_id: i32 },
}

/// A recorded trail point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BladePoint {
    pub pos: Vec2,
    pub time_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blade {
    /// Oldest first
    points: VecDeque<BladePoint>,
    /// Captured pointer, if pressed
    pointer: Option<i32>,
}

impl Blade {
    /// Start a swipe. Ignored while another pointer owns the blade.
    pub fn press(&mut self, pointer_id: i32, pos: Vec2, time_ms: f64) {
        if self.pointer.is_some_and(|id| id != pointer_id) {
            return;
        }
        self.pointer = Some(pointer_id);
        self.push(pos, time_ms);
    }

    /// Extend the swipe if `pointer_id` owns the blade
    pub fn drag(&mut self, pointer_id: i32, pos: Vec2, time_ms: f64) {
        if self.pointer == Some(pointer_id) {
            self.push(pos, time_ms);
        }
    }

    /// End the swipe. Returns true if `pointer_id` owned the blade.
    pub fn release(&mut self, pointer_id: i32) -> bool {
        if self.pointer != Some(pointer_id) {
            return false;
        }
        self.clear();
        true
    }

    /// Drop all points and release capture
    pub fn clear(&mut self) {
        self.points.clear();
        self.pointer = None;
    }

    fn push(&mut self, pos: Vec2, time_ms: f64) {
        self.points.push_back(BladePoint { pos, time_ms });
        if self.points.len() > MAX_BLADE_POINTS {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &BladePoint> {
        self.points.iter()
    }

    /// Consecutive point pairs, oldest first
    pub fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.points
            .iter()
            .zip(self.points.iter().skip(1))
            .map(|(a, b)| (a.pos, b.pos))
    }
}
