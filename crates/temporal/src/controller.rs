//! Temporal lifecycle controller
//!
//! Enablement is an explicit state check followed by a guarded mutation:
//!
//! 1. Ask the catalog whether the table is already versioned
//!    (`AlreadyEnabled`, schema untouched)
//! 2. Check engine preconditions (`UnsupportedEngine` / `VersionTooLow`)
//! 3. `Disabled -> EnablementRequested`
//! 4. Add the period columns and system versioning
//! 5. `EnablementRequested -> Enabled`
//!
//! A precondition failure is surfaced immediately and nothing is mutated.
//! There is no fallback to non-temporal behavior.

use crate::engine::{EngineInfo, EngineVendor, EngineVersion};
use crate::history::{self, HistoryRange, VersionedRecord};
use crate::lifecycle::{TemporalLifecycle, TemporalState};
use crate::session::EngineSession;
use serde::{Deserialize, Serialize};
use strata_core::{
    validate_identifier, Error, PeriodColumns, RecordId, RecordStore, Result, TemporalCatalog,
    Timestamp,
};

/// Enablement policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalPolicy {
    /// Lowest engine version allowed to enable versioning
    pub min_version: EngineVersion,
    /// Names of the period columns to add
    pub columns: PeriodColumns,
}

impl Default for TemporalPolicy {
    fn default() -> Self {
        TemporalPolicy {
            min_version: EngineVersion::MIN_SYSTEM_VERSIONING,
            columns: PeriodColumns::default(),
        }
    }
}

/// Check that the engine can host system-versioned tables
///
/// # Errors
///
/// - `UnsupportedEngine` if the vendor is not MariaDB
/// - `VersionTooLow` if the version is below `min_version`
pub fn check_preconditions(info: &EngineInfo, min_version: EngineVersion) -> Result<()> {
    if let EngineVendor::Other(raw) = &info.vendor {
        return Err(Error::UnsupportedEngine {
            version: raw.clone(),
        });
    }
    if info.version < min_version {
        return Err(Error::VersionTooLow {
            found: info.version.to_string(),
            required: min_version.to_string(),
        });
    }
    Ok(())
}

/// Drives enablement and history queries for system-versioned tables
pub struct TemporalController<'a> {
    catalog: &'a dyn TemporalCatalog,
    session: &'a EngineSession,
    policy: TemporalPolicy,
}

impl<'a> TemporalController<'a> {
    /// Controller with the default policy (MariaDB >= 10.3.0, `row_start`/`row_end`)
    pub fn new(catalog: &'a dyn TemporalCatalog, session: &'a EngineSession) -> Self {
        Self::with_policy(catalog, session, TemporalPolicy::default())
    }

    /// Controller with an explicit policy
    pub fn with_policy(
        catalog: &'a dyn TemporalCatalog,
        session: &'a EngineSession,
        policy: TemporalPolicy,
    ) -> Self {
        TemporalController {
            catalog,
            session,
            policy,
        }
    }

    /// Active policy
    pub fn policy(&self) -> &TemporalPolicy {
        &self.policy
    }

    /// Current state of `table` as recorded in the catalog
    pub fn state(&self, table: &str) -> Result<TemporalState> {
        Ok(if self.catalog.is_system_versioned(table)? {
            TemporalState::Enabled
        } else {
            TemporalState::Disabled
        })
    }

    /// Check engine preconditions against the session's cached engine info
    pub fn check_preconditions(&self) -> Result<EngineInfo> {
        let info = self.session.info()?;
        check_preconditions(&info, self.policy.min_version)?;
        Ok(info)
    }

    /// Turn on system versioning for `table`
    ///
    /// # Errors
    ///
    /// - `AlreadyEnabled` if the table is already versioned (no-op)
    /// - `UnsupportedEngine` / `VersionTooLow` if preconditions fail
    /// - `InvalidIdentifier` for an unquotable table or column name
    /// - any error from the catalog mutation (the lifecycle is aborted)
    pub fn enable(&self, table: &str) -> Result<TemporalState> {
        validate_identifier(table)?;
        validate_identifier(&self.policy.columns.start)?;
        validate_identifier(&self.policy.columns.end)?;

        let mut lifecycle = TemporalLifecycle::new(table, self.catalog.is_system_versioned(table)?);
        if lifecycle.state().is_terminal() {
            tracing::debug!(target: "strata::temporal", table, "System versioning already enabled");
            return Err(Error::AlreadyEnabled {
                table: table.to_string(),
            });
        }

        let info = self.session.info()?;
        if let Err(e) = check_preconditions(&info, self.policy.min_version) {
            tracing::warn!(
                target: "strata::temporal",
                table,
                engine = %info.raw,
                required = %self.policy.min_version,
                error = %e,
                "Temporal preconditions not met"
            );
            return Err(e);
        }

        lifecycle.request()?;
        if let Err(e) = self
            .catalog
            .add_system_versioning(table, &self.policy.columns)
        {
            lifecycle.abort()?;
            if e.is_noop() {
                tracing::debug!(
                    target: "strata::temporal",
                    table,
                    "System versioning enabled concurrently"
                );
            } else {
                tracing::warn!(
                    target: "strata::temporal",
                    table,
                    error = %e,
                    "System versioning mutation failed"
                );
            }
            return Err(e);
        }
        lifecycle.complete()?;

        tracing::info!(
            target: "strata::temporal",
            table,
            engine = %info.version,
            row_start = %self.policy.columns.start,
            row_end = %self.policy.columns.end,
            "System versioning enabled"
        );
        Ok(lifecycle.state())
    }

    /// Like [`enable`](Self::enable), treating `AlreadyEnabled` as success
    pub fn ensure_enabled(&self, table: &str) -> Result<TemporalState> {
        match self.enable(table) {
            Err(e) if e.is_noop() => Ok(TemporalState::Enabled),
            other => other,
        }
    }

    /// Snapshots of `id` in `table`, ordered by interval start
    pub fn query_history(
        &self,
        store: &dyn RecordStore,
        table: &str,
        id: RecordId,
        range: &HistoryRange,
    ) -> Result<Vec<VersionedRecord>> {
        history::query_history(store, self.catalog, table, id, range)
    }

    /// Snapshot of `id` that was current at `at`
    pub fn as_of(
        &self,
        store: &dyn RecordStore,
        table: &str,
        id: RecordId,
        at: Timestamp,
    ) -> Result<Option<VersionedRecord>> {
        history::as_of(store, self.catalog, table, id, at)
    }
}
