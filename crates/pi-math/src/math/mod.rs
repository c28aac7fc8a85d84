//! Core math modules.

pub mod dispersion;
pub mod regression;
pub mod stable;
