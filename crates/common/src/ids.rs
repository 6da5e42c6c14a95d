//! Type-safe identifier newtypes for the Palisade validation gateway.
//!
//! These types provide compile-time safety for identifiers, preventing
//! accidental mixing of different ID types (e.g., passing a ClientId where a
//! RequestId is expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one validation attempt.
///
/// Generated once per inbound call and echoed back in the response so callers
/// can correlate rejections with their logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a fresh request identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the calling client, used for rate-limit bucketing.
///
/// Derived from caller identity (an explicit client header, a hash of the
/// user agent, or the remote address). Calls with no derivable identity share
/// the anonymous bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Create a client identifier from caller identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The shared bucket for callers with no derivable identity
    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    /// String view of the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
