//! Platform abstraction layer
//!
//! Pure helpers for browser/native differences:
//! - Viewport sizing (play area, device pixel ratio)
//! - Device detection (compact items on phones)

pub mod device;
pub mod viewport;

pub use device::is_mobile_user_agent;
pub use viewport::Viewport;
