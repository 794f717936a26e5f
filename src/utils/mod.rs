//! Pure utility functions.

pub mod bootstrap;
pub mod clock;
pub mod random;
