//! # Delve Gameplay
//!
//! Player-facing systems for Delve.
//!
//! This crate provides:
//! - Timed mining gated by discovery
//! - The exploration session that ticks reveal, fades and mining together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod mining;
pub mod session;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::mining::*;
    pub use crate::session::*;
}

pub use prelude::*;
