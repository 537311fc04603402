pub mod math;

// Angle, distance and rounding primitives for the viewer; no dependencies.
pub use math::*;
