//! Play area sizing
//!
//! The canvas fills the window between the page header and footer. The
//! simulation works in CSS pixels; the backing store is scaled by the
//! device pixel ratio.

use glam::Vec2;

/// Resolved canvas geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Play area in CSS pixels
    pub css: Vec2,
    /// Device pixels per CSS pixel
    pub pixel_ratio: f32,
}

impl Viewport {
    /// Fit the play area into the window minus header and footer
    pub fn fit(window: Vec2, header_height: f32, footer_height: f32, pixel_ratio: f32) -> Self {
        let height = (window.y - header_height - footer_height).max(1.0);
        let pixel_ratio = if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        Self {
            css: Vec2::new(window.x.max(1.0), height),
            pixel_ratio,
        }
    }

    /// Backing store size in device pixels
    pub fn buffer_size(&self) -> (u32, u32) {
        (
            (self.css.x * self.pixel_ratio).floor() as u32,
            (self.css.y * self.pixel_ratio).floor() as u32,
        )
    }
}
