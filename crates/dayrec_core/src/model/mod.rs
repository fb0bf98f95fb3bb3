//! Ledger domain model.
//!
//! # Responsibility
//! - Define the two persisted entities and their field limits.
//!
//! # Invariants
//! - Records are never deleted by core; only label and comment are rewritten.
//! - Categories are created lazily and never auto-deleted.

pub mod activity;
