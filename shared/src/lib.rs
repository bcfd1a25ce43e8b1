//! Shared types and models for the Pharma QC Records platform
//!
//! This crate contains the QC decision logic (result verdicts, COA roll-up,
//! material lifecycle, accession numbers) shared between the backend and the
//! browser bindings. Everything here is pure and free of I/O.

pub mod accession;
pub mod models;
pub mod types;
pub mod validation;

pub use accession::*;
pub use models::*;
pub use types::*;
pub use validation::*;
