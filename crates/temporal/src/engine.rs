//! Engine identification
//!
//! Parses the string returned by `SELECT VERSION()` into a vendor and a
//! comparable version. MariaDB reports strings like `10.11.2-MariaDB` or
//! `10.6.12-MariaDB-1:10.6.12+maria~ubu2004`; MySQL reports `8.0.33`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric engine version, ordered component-wise
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EngineVersion {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
    /// Patch component
    pub patch: u32,
}

impl EngineVersion {
    /// First MariaDB release with system-versioned tables
    pub const MIN_SYSTEM_VERSIONING: EngineVersion = EngineVersion::new(10, 3, 0);

    /// Construct from components
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        EngineVersion {
            major,
            minor,
            patch,
        }
    }

    /// Lenient parse of the leading numeric part of a version string
    ///
    /// Missing components default to 0. An unparsable major component
    /// yields `0.0.0`.
    pub fn parse_lenient(raw: &str) -> EngineVersion {
        let numeric = raw.trim().split('-').next().unwrap_or("");
        let mut parts = numeric.split('.').map(leading_number);
        let Some(Some(major)) = parts.next() else {
            return EngineVersion::default();
        };
        let minor = parts.next().flatten().unwrap_or(0);
        let patch = parts.next().flatten().unwrap_or(0);
        EngineVersion::new(major, minor, patch)
    }
}

impl Default for EngineVersion {
    fn default() -> Self {
        EngineVersion::new(0, 0, 0)
    }
}

fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error parsing a strict `major.minor.patch` version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError(String);

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version '{}': expected major.minor.patch", self.0)
    }
}

impl std::error::Error for ParseVersionError {}

impl FromStr for EngineVersion {
    type Err = ParseVersionError;

    /// Strict parse used for configured minimums (`10.3.0`, `10.3`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError(s.to_string());
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(err());
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(parts.iter()) {
            *slot = part.parse().map_err(|_| err())?;
        }
        Ok(EngineVersion::new(nums[0], nums[1], nums[2]))
    }
}

/// Engine vendor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineVendor {
    /// MariaDB (supports `WITH SYSTEM VERSIONING`)
    MariaDb,
    /// Anything else; holds the raw version string
    Other(String),
}

/// Parsed result of an engine version query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Raw string as reported by the engine
    pub raw: String,
    /// Detected vendor
    pub vendor: EngineVendor,
    /// Numeric version
    pub version: EngineVersion,
}

impl EngineInfo {
    /// Parse a version string
    pub fn parse(raw: &str) -> EngineInfo {
        let vendor = if raw.to_lowercase().contains("mariadb") {
            EngineVendor::MariaDb
        } else {
            EngineVendor::Other(raw.to_string())
        };
        EngineInfo {
            raw: raw.to_string(),
            vendor,
            version: EngineVersion::parse_lenient(raw),
        }
    }

    /// True if the vendor is MariaDB
    pub fn is_mariadb(&self) -> bool {
        self.vendor == EngineVendor::MariaDb
    }
}
