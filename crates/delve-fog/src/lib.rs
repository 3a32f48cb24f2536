//! # Delve Fog
//!
//! Exploration fog for Delve.
//!
//! This crate handles:
//! - Per-tile discovery state and its chunk index
//! - Fog fade-out animations
//! - Radius, chamber and forced reveal
//! - Discovery save files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod fade;
pub mod field;
pub mod reveal;
pub mod save;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::fade::*;
    pub use crate::field::*;
    pub use crate::reveal::*;
    pub use crate::save::*;
}

pub use prelude::*;
