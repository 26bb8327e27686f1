//! actrack-core library.
//!
//! Tracks action items extracted from free-text notes, one JSON collection
//! per project. The [`store::ItemStore`] owns a project's items and their
//! audit trail; the [`reconcile::Reconciler`] merges an oracle's candidate
//! list into it; [`tracker::Tracker`] wires one run together.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per module, each with a stable
//!   [`error::ErrorCode`]. Candidate-local problems are warnings, not errors.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod error;
pub mod lock;
pub mod model;
pub mod oracle;
pub mod persist;
pub mod reconcile;
pub mod store;
pub mod tracker;
