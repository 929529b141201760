//! Shared-secret check for the `x-api-key` header.

/// Result of checking a presented API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCheck {
    /// No key (or an empty one) was presented; the request proceeds.
    Absent,
    /// The presented key equals the configured secret.
    Accepted,
    /// A non-empty key was presented and it does not match.
    Rejected,
}

/// Compares presented keys against a single static secret.
///
/// The key is optional for callers: only a wrong, non-empty key is refused.
#[derive(Debug, Clone)]
pub struct ApiKeyGuard {
    expected: String,
}

impl ApiKeyGuard {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// Check the raw header bytes, if any. Non-UTF-8 bytes can never match.
    pub fn check(&self, presented: Option<&[u8]>) -> KeyCheck {
        match presented {
            None | Some([]) => KeyCheck::Absent,
            Some(key) if constant_time_eq(key, self.expected.as_bytes()) => KeyCheck::Accepted,
            Some(_) => KeyCheck::Rejected,
        }
    }
}

/// Length-independent timing comparison of two byte strings.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut diff = u8::from(a.len() != b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_absent() {
        let guard = ApiKeyGuard::new("mysecretkey");
        assert_eq!(guard.check(None), KeyCheck::Absent);
    }

    #[test]
    fn empty_key_is_treated_as_absent() {
        let guard = ApiKeyGuard::new("mysecretkey");
        assert_eq!(guard.check(Some(b"")), KeyCheck::Absent);
    }

    #[test]
    fn matching_key_is_accepted() {
        let guard = ApiKeyGuard::new("mysecretkey");
        assert_eq!(guard.check(Some(b"mysecretkey")), KeyCheck::Accepted);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let guard = ApiKeyGuard::new("mysecretkey");
        for bad in [&b"wrong"[..], b"mysecretke", b"mysecretkeyy", b"MYSECRETKEY"] {
            assert_eq!(guard.check(Some(bad)), KeyCheck::Rejected, "{bad:?} should be rejected");
        }
    }

    #[test]
    fn non_utf8_key_is_rejected() {
        let guard = ApiKeyGuard::new("mysecretkey");
        assert_eq!(guard.check(Some(&[0xff, 0xfe])), KeyCheck::Rejected);
    }

    #[test]
    fn constant_time_eq_handles_prefixes() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"", b"a"));
        assert!(constant_time_eq(b"", b""));
    }
}
