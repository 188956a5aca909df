//! System-versioned (temporal) tables
//!
//! This crate provides:
//! - **engine**: parsing of engine version strings into vendor + version
//! - **session**: connection-scoped engine info cache with refresh/invalidate
//! - **lifecycle**: `Disabled -> EnablementRequested -> Enabled` state machine
//! - **controller**: precondition checks and guarded enablement
//! - **history**: ordered, range-filtered history and point-in-time reads
//! - **sql**: MariaDB statements for SQL-backed stores

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod engine;
pub mod history;
pub mod lifecycle;
pub mod session;
pub mod sql;

pub use controller::{check_preconditions, TemporalController, TemporalPolicy};
pub use engine::{EngineInfo, EngineVendor, EngineVersion, ParseVersionError};
pub use history::{as_of, query_history, validate_history, HistoryRange, VersionedRecord};
pub use lifecycle::{TemporalLifecycle, TemporalState};
pub use session::EngineSession;
pub use sql::{as_of_sql, enable_versioning_sql, history_sql, is_versioned_sql, version_sql};
pub use strata_core::PeriodColumns;
