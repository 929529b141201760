//! Session tracking traits for per-caller interaction counts.

use anyhow::Result;

/// Counts how many requests each session id has made.
///
/// `touch` is the only write path. Implementations must make the
/// read-increment-write on a single id atomic: two concurrent touches of the
/// same id always observe two distinct counts.
pub trait SessionTracker: Send + Sync {
    /// Record one interaction for `session_id` and return the new count.
    ///
    /// The first touch of an unseen id returns `1`.
    fn touch(&self, session_id: &str) -> Result<u64>;

    /// Current count for `session_id`, or `None` if it was never touched.
    fn count(&self, session_id: &str) -> Option<u64>;

    /// Number of distinct sessions seen so far.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The name of this tracker implementation.
    fn name(&self) -> &str;
}
