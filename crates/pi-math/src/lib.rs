//! Price Intelligence math utilities.

pub mod math;

pub use math::dispersion::*;
pub use math::regression::{linear_fit, LineFit};
pub use math::stable::*;
