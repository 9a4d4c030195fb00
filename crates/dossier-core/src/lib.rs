//! dossier-core library.
//!
//! Headless edition of a single report: the report model, relation
//! reconciliation, per-field validation, presence, and an
//! [`EditSession`] that dispatches remote mutations through a
//! [`gateway::ReportGateway`].
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums exposing an [`error::ErrorCode`];
//!   `anyhow::Result` for config loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod model;
pub mod presence;
pub mod reconcile;
pub mod session;
pub mod validate;

pub use session::{EditSession, EditSettings, SubmitOutcome};
