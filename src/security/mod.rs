//! Request authentication and secret hygiene.
//!
//! [`ApiKeyGuard`] implements the optional shared-secret check on the
//! `x-api-key` header. [`redact`] keeps secrets out of logs and status output.

pub mod api_key;

pub use api_key::{ApiKeyGuard, KeyCheck};

/// Redact sensitive values for safe logging. Shows first 4 chars + "***" suffix.
pub fn redact(value: &str) -> String {
    if value.chars().count() <= 4 {
        "***".to_string()
    } else {
        let prefix: String = value.chars().take(4).collect();
        format!("{prefix}***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reexported_guard_is_usable() {
        let guard = ApiKeyGuard::new("k3y");
        assert_eq!(guard.check(Some(b"k3y")), KeyCheck::Accepted);
    }

    #[test]
    fn redact_hides_most_of_value() {
        assert_eq!(redact("abcdefgh"), "abcd***");
        assert_eq!(redact("ab"), "***");
        assert_eq!(redact(""), "***");
        assert_eq!(redact("12345"), "1234***");
    }

    #[test]
    fn redact_respects_char_boundaries() {
        assert_eq!(redact("ключ-секрет"), "ключ***");
    }
}
