//! Bitmap-to-vector contour geometry.

pub mod corners;
pub mod outline;

pub use corners::{inner_corners, outer_corners, Corners, KAPPA};
pub use outline::{draw_empty, draw_filled, trace_glyph, DrawOptions};
