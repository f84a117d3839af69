//! Core module wiring: lattice structures, matrices, profiles, errors, and type utilities.

pub mod error;
pub mod lattice;
pub mod matrix;
pub mod profile;
pub mod types;

// Re-export the most commonly used items so downstream code can simply import
// `crate::core::*` without having to juggle individual submodules.
pub use error::*;
pub use lattice::*;
pub use matrix::*;
pub use profile::*;
pub use types::*;
