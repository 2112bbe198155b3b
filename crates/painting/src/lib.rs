//! stipple painting system - stroke-to-stamp rendering
//!
//! This crate turns pointer samples into textured stamps on a canvas:
//! - [`curve`] - Catmull-Rom evaluation and arc-length estimation
//! - [`brush`] - Brush model (size, color, spacing, jitter, grain)
//! - [`path`] - Denoised accumulation of pointer samples
//! - [`segmenter`] - Stamp placement along curve segments
//! - [`compositor`] - Stamp requests to render primitives
//! - [`trail`] - Live primitive tracking and debounced flattening
//! - [`render`] - Render surface contract and CPU implementation
//! - [`session`] - The painting session tying it all together

pub mod brush;
pub mod color;
pub mod compositor;
pub mod constants;
pub mod curve;
pub mod path;
pub mod render;
pub mod segmenter;
pub mod session;
pub mod surface;
pub mod texture;
pub mod trail;
pub mod types;

pub use brush::*;
pub use color::*;
pub use compositor::*;
pub use constants::*;
pub use curve::*;
pub use path::*;
pub use render::*;
pub use segmenter::*;
pub use session::*;
pub use surface::*;
pub use texture::*;
pub use trail::*;
pub use types::*;
