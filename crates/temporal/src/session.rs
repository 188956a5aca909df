//! Connection-scoped engine state
//!
//! The engine version is looked up once per connection and cached here.
//! There is no process-wide cache: each `EngineSession` belongs to one
//! connection, and callers refresh or invalidate it explicitly (for example
//! after a reconnect).

use crate::engine::EngineInfo;
use parking_lot::RwLock;
use std::sync::Arc;
use strata_core::{EngineMetadata, Error, Result};

/// Cached engine identification for one connection
pub struct EngineSession {
    metadata: Arc<dyn EngineMetadata>,
    cached: RwLock<Option<EngineInfo>>,
}

impl EngineSession {
    /// Session over a connection's metadata source; nothing is queried yet
    pub fn new(metadata: Arc<dyn EngineMetadata>) -> Self {
        EngineSession {
            metadata,
            cached: RwLock::new(None),
        }
    }

    /// Engine info, querying the engine on first use
    pub fn info(&self) -> Result<EngineInfo> {
        if let Some(info) = self.cached.read().as_ref() {
            return Ok(info.clone());
        }
        self.refresh()
    }

    /// Re-query the engine and replace the cached info
    pub fn refresh(&self) -> Result<EngineInfo> {
        let raw = self.metadata.engine_version()?;
        let info = EngineInfo::parse(&raw);
        tracing::debug!(
            target: "strata::temporal",
            version = %info.version,
            mariadb = info.is_mariadb(),
            "Engine version cached"
        );
        *self.cached.write() = Some(info.clone());
        Ok(info)
    }

    /// Drop the cached info; the next [`info`](Self::info) re-queries
    pub fn invalidate(&self) {
        *self.cached.write() = None;
    }

    /// True if engine info is currently cached
    pub fn is_cached(&self) -> bool {
        self.cached.read().is_some()
    }

    /// Verify the connection points at MariaDB
    ///
    /// Run when a connection is established; fails with `UnsupportedEngine`
    /// for any other vendor.
    pub fn verify(&self) -> Result<EngineInfo> {
        let info = self.info()?;
        if !info.is_mariadb() {
            tracing::warn!(
                target: "strata::temporal",
                version = %info.raw,
                "Connected engine is not MariaDB"
            );
            return Err(Error::UnsupportedEngine { version: info.raw });
        }
        Ok(info)
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("cached", &*self.cached.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingMetadata {
        version: RwLock<String>,
        calls: AtomicUsize,
    }

    impl CountingMetadata {
        fn new(version: &str) -> Arc<Self> {
            Arc::new(CountingMetadata {
                version: RwLock::new(version.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl EngineMetadata for CountingMetadata {
        fn engine_version(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.version.read().clone())
        }
    }

    #[test]
    fn test_info_is_cached() {
        let meta = CountingMetadata::new("10.11.2-MariaDB");
        let session = EngineSession::new(meta.clone());
        assert!(!session.is_cached());

        session.info().unwrap();
        session.info().unwrap();
        assert_eq!(meta.calls.load(Ordering::SeqCst), 1);
        assert!(session.is_cached());
    }

    #[test]
    fn test_refresh_and_invalidate() {
        let meta = CountingMetadata::new("10.2.0-MariaDB");
        let session = EngineSession::new(meta.clone());
        assert_eq!(session.info().unwrap().version.minor, 2);

        *meta.version.write() = "10.6.0-MariaDB".to_string();
        // Still cached
        assert_eq!(session.info().unwrap().version.minor, 2);

        assert_eq!(session.refresh().unwrap().version.minor, 6);

        session.invalidate();
        assert!(!session.is_cached());
        session.info().unwrap();
        assert_eq!(meta.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_verify_rejects_other_vendor() {
        let session = EngineSession::new(CountingMetadata::new("8.0.33"));
        assert!(matches!(
            session.verify(),
            Err(Error::UnsupportedEngine { .. })
        ));

        let session = EngineSession::new(CountingMetadata::new("10.11.2-MariaDB"));
        assert!(session.verify().is_ok());
    }

    #[test]
    fn test_metadata_failure_propagates() {
        struct Broken;
        impl EngineMetadata for Broken {
            fn engine_version(&self) -> Result<String> {
                Err(Error::Store("connection lost".to_string()))
            }
        }
        let session = EngineSession::new(Arc::new(Broken));
        assert!(matches!(session.info(), Err(Error::Store(_))));
        assert!(!session.is_cached());
    }
}
