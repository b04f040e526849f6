/// Environment variable names used by this crate for convenient
/// configuration of the shipper from microservices.
///
/// These are purely helpers; the core types remain decoupled from
/// environment access.

/// Node URL or DSN, e.g. `http://127.0.0.1:9200`.
pub const LOG_SHIPPER_NODE_ENV: &str = "LOG_SHIPPER_NODE";

/// Optional basic auth user name.
pub const LOG_SHIPPER_USERNAME_ENV: &str = "LOG_SHIPPER_USERNAME";

/// Optional basic auth password.
pub const LOG_SHIPPER_PASSWORD_ENV: &str = "LOG_SHIPPER_PASSWORD";

/// Optional API key, preferred over basic auth.
pub const LOG_SHIPPER_API_KEY_ENV: &str = "LOG_SHIPPER_API_KEY";

/// Prefix of the time-bucketed indices.
pub const LOG_SHIPPER_INDEX_PREFIX_ENV: &str = "LOG_SHIPPER_INDEX_PREFIX";

/// `strftime` pattern of the index date suffix.
pub const LOG_SHIPPER_INDEX_SUFFIX_PATTERN_ENV: &str = "LOG_SHIPPER_INDEX_SUFFIX_PATTERN";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating unset and empty the same.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
