//! Monitored endpoint registry.
//!
//! Records live in a flat CSV file (`name,url,status`) managed by
//! [`RegistryStore`]. Status is always derived from a [`Prober`] and never
//! treated as authoritative input.

pub mod monitor;
pub mod probe;
pub mod store;

pub use monitor::run_monitor;
pub use probe::{HttpProber, Prober};
pub use store::RegistryStore;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column header written at the top of every registry file.
pub const HEADER: [&str; 3] = ["name", "url", "status"];

// ============================================================================
// Status
// ============================================================================

/// Derived liveness of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    /// Status derived from a probe result.
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            Status::Active
        } else {
            Status::Inactive
        }
    }

    /// Parse a stored value. Returns `None` for anything but the two valid
    /// values (case-insensitive, surrounding whitespace ignored).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Status::Active),
            "inactive" => Some(Status::Inactive),
            _ => None,
        }
    }

    /// Normalise a stored value: unknown values read as inactive until the
    /// next probe.
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Status::Inactive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Record
// ============================================================================

/// One monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(rename = "url")]
    pub endpoint: String,
    pub status: Status,
}

impl Record {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Match on the `(name, normalized endpoint)` pair used by every lookup.
    pub fn matches(&self, name: &str, endpoint: &str) -> bool {
        self.name == name && normalize_endpoint(&self.endpoint) == normalize_endpoint(endpoint)
    }
}

/// Strip exactly one trailing `/`, if present.
pub fn normalize_endpoint(endpoint: &str) -> &str {
    endpoint.strip_suffix('/').unwrap_or(endpoint)
}

// ============================================================================
// Mutation
// ============================================================================

/// Outcome of a lookup-driven store mutation.
///
/// Both variants carry the collection as it stands after the call, so callers
/// can render it either way while still telling a miss apart from a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A matching record was found and the store was rewritten.
    Applied(Vec<Record>),
    /// No record matched; the store was left untouched.
    NotFound(Vec<Record>),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied(_))
    }

    pub fn records(&self) -> &[Record] {
        match self {
            Mutation::Applied(records) | Mutation::NotFound(records) => records,
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Mutation::Applied(records) | Mutation::NotFound(records) => records,
        }
    }
}
