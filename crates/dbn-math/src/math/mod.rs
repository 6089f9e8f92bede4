//! Core math modules.

pub mod categorical;
pub mod combinatorics;
pub mod stable;
