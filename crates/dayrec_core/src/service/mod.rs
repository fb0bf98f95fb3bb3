//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate session calls into the interactive ledger flows.
//! - Keep console/UI layers decoupled from storage details via `Prompter`.
//!
//! # Invariants
//! - Only the recording flow, category repair and a confirmed collapse commit.
//! - Every abandoned flow rolls back its pending writes before returning.

pub mod consolidation;
pub mod prompt;
pub mod recording;
pub mod resolver;
