//! Stable session identifiers.
//!
//! # Why not reuse identifiers? (for beginners)
//!
//! A session id is how the broadcast registry tells connections apart.  Ids
//! are handed out from a monotonically increasing counter and never reused,
//! so a late `leave` call from a session that has already gone can never
//! remove a newer session that happens to sit in the same slot.  That gives
//! the same protection as a generation-checked handle without storing a
//! separate generation number.
//!
//! # Thread safety
//!
//! The allocator uses `AtomicU64` internally, so every listener task can draw
//! ids from one shared allocator without a lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one connected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Wraps a raw id.  Prefer [`SessionIdAllocator::next`] outside tests.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value, for logging and metrics.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A thread-safe, monotonically increasing source of [`SessionId`]s.
///
/// Ids start at 1.  A `u64` counter bumped once per accepted connection does
/// not wrap in any realistic process lifetime.
///
/// # Examples
///
/// ```rust
/// use relay_core::SessionIdAllocator;
///
/// let ids = SessionIdAllocator::new();
/// let a = ids.next();
/// let b = ids.next();
/// assert!(b > a);
/// ```
#[derive(Debug)]
pub struct SessionIdAllocator {
    inner: AtomicU64,
}

impl SessionIdAllocator {
    /// Creates a new allocator whose first id is 1.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(1),
        }
    }

    /// Returns the next unused id.
    ///
    /// `Ordering::Relaxed` is enough: ids only need to be unique, they do not
    /// publish any other memory.
    pub fn next(&self) -> SessionId {
        SessionId(self.inner.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SessionIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
