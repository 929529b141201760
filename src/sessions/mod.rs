//! Session management: per-caller interaction counters driving persona escalation.

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemorySessionTracker;
pub use traits::SessionTracker;

/// Create a default in-memory session tracker.
pub fn create_session_tracker() -> Box<dyn SessionTracker> {
    Box::new(InMemorySessionTracker::new())
}
