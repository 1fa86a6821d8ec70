//! Domain layer types and invariants.

pub mod error;
pub mod front_matter;
pub mod manifest;
pub mod workspace;
