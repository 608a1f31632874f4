//! Secret detection and redaction for structured log fields.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a field or variable name likely refers to a secret.
///
/// Matching is case-insensitive. File paths that merely point at credentials
/// (`credentialFile`) are not considered secret.
///
/// # Examples
///
/// ```
/// use ledger_ops_shared::is_secret_key;
///
/// assert!(is_secret_key("AWS_SECRET_ACCESS_KEY"));
/// assert!(is_secret_key("sessionToken"));
/// assert!(!is_secret_key("credentialFile"));
/// assert!(!is_secret_key("MONGODB_BACKEND_HOST"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("SECRET")
        || key.contains("TOKEN")
        || key.contains("PASSWORD")
        || key.contains("ACCESS_KEY")
        || key.contains("API_KEY")
        || key.contains("AUTH")
}

/// Redacts a value if the key is likely a secret.
///
/// ```
/// use ledger_ops_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("AWS_SESSION_TOKEN", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_secret("DNS_SERVER", "127.0.0.11"), "127.0.0.11");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}
