//! System-versioning lifecycle of a table
//!
//! ```text
//! Disabled ──request──▶ EnablementRequested ──complete──▶ Enabled
//!     ▲                        │
//!     └────────abort───────────┘
//! ```
//!
//! `Enabled` is terminal. There is no disable path. `abort` only applies
//! while the schema mutation is in flight and has not taken effect.

use serde::{Deserialize, Serialize};
use std::fmt;
use strata_core::{Error, Result};

/// Versioning state of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalState {
    /// Plain table, no history retained
    Disabled,
    /// Preconditions passed, schema mutation in flight
    EnablementRequested,
    /// System-versioned
    Enabled,
}

impl TemporalState {
    /// Lowercase name for logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            TemporalState::Disabled => "disabled",
            TemporalState::EnablementRequested => "enablement_requested",
            TemporalState::Enabled => "enabled",
        }
    }

    /// True for the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TemporalState::Enabled)
    }

    /// True if `self -> next` is an allowed edge
    pub fn can_transition_to(&self, next: TemporalState) -> bool {
        matches!(
            (self, next),
            (TemporalState::Disabled, TemporalState::EnablementRequested)
                | (TemporalState::EnablementRequested, TemporalState::Enabled)
                | (TemporalState::EnablementRequested, TemporalState::Disabled)
        )
    }
}

impl fmt::Display for TemporalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State machine for one table's enablement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalLifecycle {
    table: String,
    state: TemporalState,
}

impl TemporalLifecycle {
    /// Lifecycle starting from the state observed in the catalog
    pub fn new(table: impl Into<String>, versioned: bool) -> Self {
        TemporalLifecycle {
            table: table.into(),
            state: if versioned {
                TemporalState::Enabled
            } else {
                TemporalState::Disabled
            },
        }
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Current state
    pub fn state(&self) -> TemporalState {
        self.state
    }

    /// `Disabled -> EnablementRequested`
    ///
    /// # Errors
    ///
    /// `AlreadyEnabled` from `Enabled`; `InvalidTransition` while a request is
    /// already in flight.
    pub fn request(&mut self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::AlreadyEnabled {
                table: self.table.clone(),
            });
        }
        self.advance(TemporalState::EnablementRequested)
    }

    /// `EnablementRequested -> Enabled`
    pub fn complete(&mut self) -> Result<()> {
        self.advance(TemporalState::Enabled)
    }

    /// `EnablementRequested -> Disabled` after a failed mutation
    pub fn abort(&mut self) -> Result<()> {
        self.advance(TemporalState::Disabled)
    }

    fn advance(&mut self, next: TemporalState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                table: self.table.clone(),
                from: self.state.name().to_string(),
                to: next.name().to_string(),
            });
        }
        tracing::debug!(
            target: "strata::temporal",
            table = %self.table,
            from = self.state.name(),
            to = next.name(),
            "Temporal state transition"
        );
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut lc = TemporalLifecycle::new("posts", false);
        assert_eq!(lc.state(), TemporalState::Disabled);
        lc.request().unwrap();
        assert_eq!(lc.state(), TemporalState::EnablementRequested);
        lc.complete().unwrap();
        assert_eq!(lc.state(), TemporalState::Enabled);
        assert!(lc.state().is_terminal());
    }

    #[test]
    fn test_enabled_is_terminal() {
        let mut lc = TemporalLifecycle::new("posts", true);
        assert!(matches!(lc.request(), Err(Error::AlreadyEnabled { .. })));
        assert!(matches!(lc.abort(), Err(Error::InvalidTransition { .. })));
        assert_eq!(lc.state(), TemporalState::Enabled);
    }

    #[test]
    fn test_abort_returns_to_disabled() {
        let mut lc = TemporalLifecycle::new("posts", false);
        lc.request().unwrap();
        lc.abort().unwrap();
        assert_eq!(lc.state(), TemporalState::Disabled);
        lc.request().unwrap();
    }

    #[test]
    fn test_invalid_edges() {
        let mut lc = TemporalLifecycle::new("posts", false);
        assert!(matches!(lc.complete(), Err(Error::InvalidTransition { .. })));
        lc.request().unwrap();
        assert!(matches!(lc.request(), Err(Error::InvalidTransition { .. })));
    }

    #[test]
    fn test_transition_table() {
        use TemporalState::*;
        let all = [Disabled, EnablementRequested, Enabled];
        let allowed: Vec<_> = all
            .iter()
            .flat_map(|a| all.iter().map(move |b| (*a, *b)))
            .filter(|(a, b)| a.can_transition_to(*b))
            .collect();
        assert_eq!(
            allowed,
            vec![
                (Disabled, EnablementRequested),
                (EnablementRequested, Disabled),
                (EnablementRequested, Enabled),
            ]
        );
    }
}
