//! Shared defaults and well-known names.

/// Declarative metadata defaults.
pub mod defaults {
    pub const RETRY_DELAY_MS: u64 = 0;
    pub const CIRCUIT_BREAKER_THRESHOLD: u32 = 3;
    pub const CIRCUIT_BREAKER_BREAK_SECONDS: u64 = 30;
    pub const CACHE_TTL_SECONDS: u64 = 60;
    pub const AUDIT_LOG_INPUT: bool = true;
    pub const AUDIT_LOG_OUTPUT: bool = true;
    pub const AUDIT_LOG_ERROR: bool = true;
    /// Upper bound for any configured duration (cache TTL, break duration): 10 years.
    pub const MAX_DURATION_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;
    /// Entry cap for the in-memory cache store.
    pub const MEMORY_CACHE_MAX_CAPACITY: u64 = 10_000;
}

/// Cache key rendering.
pub mod cache_keys {
    /// Stands in for a null argument so that `null` and `""` never collide.
    pub const NULL_SENTINEL: &str = "<null>";
    /// Separates the method identity from the argument list.
    pub const IDENTITY_SEPARATOR: char = '_';
    /// Separates rendered arguments.
    pub const ARGUMENT_SEPARATOR: char = '|';
}

/// Environment variable names.
pub mod env {
    pub const ENVIRONMENT: &str = "INTERCEPTOR_ENV";
    pub const FALLBACK_ENVIRONMENT: &str = "APP_ENV";
    pub const LOG_FORMAT: &str = "INTERCEPTOR_LOG_FORMAT";
    pub const CONFIG_PREFIX: &str = "INTERCEPTOR";
    pub const CONFIG_SEPARATOR: &str = "__";
}
