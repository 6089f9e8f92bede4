//! DBN math utilities.

pub mod math;

pub use math::categorical;
pub use math::combinatorics;
pub use math::stable::*;
