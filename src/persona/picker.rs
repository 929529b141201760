//! Random sources for reply selection.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks an index into a reply pool.
///
/// Injected into the responder so tests and benches can replace the process
/// RNG with something reproducible.
pub trait ReplyPicker: Send + Sync {
    /// Return an index in `0..len`. Callers never pass `len == 0`.
    fn pick(&self, len: usize) -> usize;

    fn name(&self) -> &str;
}

/// Uniform selection from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngPicker;

impl ReplyPicker for ThreadRngPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }

    fn name(&self) -> &str {
        "thread_rng"
    }
}

/// Deterministic uniform selection from a seeded `StdRng`.
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl ReplyPicker for SeededPicker {
    fn pick(&self, len: usize) -> usize {
        self.rng.lock().gen_range(0..len)
    }

    fn name(&self) -> &str {
        "seeded"
    }
}
