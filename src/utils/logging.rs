//! Structured Logging with PII Redaction
//!
//! Log output goes through `tracing`. Emails are personal data and wallet
//! addresses are linkable to them, so callers pass these through the
//! redaction helpers before recording them as fields:
//!
//! ```rust,ignore
//! tracing::info!(email = %redact_email(&email), wallet = %redact_address(&addr), "wallet resolved");
//! ```

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Returns `false` when a subscriber was already installed (tests, embedding hosts).
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Fully redact a sensitive value
pub fn redact_value(value: &str) -> String {
    if value.is_empty() {
        return "[EMPTY]".to_string();
    }

    let len = value.chars().count();
    if len <= 4 {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED:{}chars]", len)
    }
}

/// Keep the first character of the mailbox and the full domain
pub fn redact_email(email: &str) -> String {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        _ => redact_value(trimmed),
    }
}

/// Partially redact an address (show first 8 and last 4 chars)
pub fn redact_address(address: impl AsRef<str>) -> String {
    let trimmed = address.as_ref().trim();

    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    if trimmed.len() <= 10 || !trimmed.is_ascii() {
        return redact_value(trimmed);
    }

    let prefix_len = if trimmed.starts_with("0x") { 8 } else { 6 };
    let suffix_len = 4;

    if trimmed.len() <= prefix_len + suffix_len + 3 {
        return redact_value(trimmed);
    }

    format!(
        "{}...{}",
        &trimmed[..prefix_len],
        &trimmed[trimmed.len() - suffix_len..]
    )
}

/// Shorten a 32-byte hash for log lines (first 10 and last 6 chars)
pub fn short_hash(hash: impl AsRef<str>) -> String {
    let trimmed = hash.as_ref().trim();

    if trimmed.len() <= 20 || !trimmed.is_ascii() {
        return trimmed.to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 12 } else { 10 };
    format!(
        "{}...{}",
        &trimmed[..prefix_len],
        &trimmed[trimmed.len() - 6..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_value() {
        assert_eq!(redact_value(""), "[EMPTY]");
        assert_eq!(redact_value("abc"), "[REDACTED]");
        assert_eq!(redact_value("secret_key_12345"), "[REDACTED:16chars]");
    }

    #[test]
    fn test_redact_email() {
        assert_eq!(redact_email("alice@example.com"), "a***@example.com");
        assert_eq!(redact_email("  bob@hexlink.io "), "b***@hexlink.io");
        assert_eq!(redact_email("not-an-email"), "[REDACTED:12chars]");
        assert_eq!(redact_email("@nobody"), "[REDACTED:7chars]");
    }

    #[test]
    fn test_redact_address() {
        let addr = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
        let redacted = redact_address(addr);
        assert!(redacted.starts_with("0xd8dA6B"));
        assert!(redacted.ends_with("6045"));
        assert!(redacted.contains("..."));
        assert_eq!(redact_address(""), "[EMPTY]");
    }

    #[test]
    fn test_short_hash() {
        let hash = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";
        let short = short_hash(hash);
        assert!(short.starts_with("0x1234567890"));
        assert!(short.ends_with("abcdef"));
        assert_eq!(short_hash("0xabc"), "0xabc");
    }
}
