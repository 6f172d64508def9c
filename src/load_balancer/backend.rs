//! Backend address types.
//!
//! # Responsibilities
//! - Represent a single dialable backend endpoint
//! - Guarantee the configured backend list is never empty

use std::fmt;
use std::sync::Arc;

/// An opaque "host:port" string identifying a backend.
///
/// Resolution happens at dial time, so hostnames are kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendAddress(Arc<str>);

impl BackendAddress {
    pub fn new(addr: impl AsRef<str>) -> Self {
        Self(Arc::from(addr.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendAddress {
    fn from(addr: &str) -> Self {
        Self::new(addr)
    }
}

/// A non-empty, ordered set of backend addresses.
///
/// Cheap to clone; the addresses are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSet {
    addrs: Arc<[BackendAddress]>,
}

impl BackendSet {
    /// Build a set from addresses. Returns `None` when `addrs` is empty.
    pub fn new(addrs: Vec<BackendAddress>) -> Option<Self> {
        if addrs.is_empty() {
            return None;
        }
        Some(Self {
            addrs: addrs.into(),
        })
    }

    /// Number of backends (always at least 1).
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Backend at `index`, wrapping around the end of the set.
    pub fn get_wrapping(&self, index: usize) -> &BackendAddress {
        &self.addrs[index % self.addrs.len()]
    }

    pub fn contains(&self, addr: &BackendAddress) -> bool {
        self.addrs.contains(addr)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendAddress> {
        self.addrs.iter()
    }
}
