//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame rendering, layout and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color palette and text styling
//! - `tabs`: Per-view content (dashboard, funnels, credentials, ...)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
