//! Shared DTOs for the cdkreport workspace.
//!
//! # Design constraints
//! - Report runs are serialized for JSON/YAML output; treat field names as a
//!   public format.
//! - Prefer adding optional fields over changing semantics.

pub mod changeset;
pub mod report;
pub mod stack;

/// Schema identifiers.
pub mod schema {
    pub const CDKREPORT_RUN_V1: &str = "cdkreport.run.v1";
}
