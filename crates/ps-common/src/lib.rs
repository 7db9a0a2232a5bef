//! pstree common types, IDs, and errors.
//!
//! This crate provides foundational types shared across ps-core modules:
//! - Process identifier type with the "no tracked parent" convention
//! - Auxiliary field kinds read alongside the primary stat record
//! - The unified error type with stable codes
//! - CLI output formats

pub mod error;
pub mod field;
pub mod id;
pub mod output;

pub use error::{Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use field::AuxField;
pub use id::ProcessId;
pub use output::OutputFormat;
