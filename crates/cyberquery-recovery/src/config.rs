//! Recovery configuration

/// Configuration for schema validation of normalized payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Sanitize string values of accepted and degraded payloads
    pub sanitize: bool,

    /// Accept a bare string where a list is required (`"ls"` → `["ls"]`)
    pub coerce_string_lists: bool,

    /// Accept a number or boolean where text is required (`8080` → `"8080"`)
    pub coerce_scalars: bool,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            sanitize: true,
            coerce_string_lists: true,
            coerce_scalars: true,
        }
    }
}

impl RecoveryConfig {
    /// Accept every near-miss shape, without touching values
    pub fn lenient() -> Self {
        Self {
            sanitize: false,
            coerce_string_lists: true,
            coerce_scalars: true,
        }
    }

    /// Treat any wrongly typed required field as missing
    pub fn strict() -> Self {
        Self {
            sanitize: true,
            coerce_string_lists: false,
            coerce_scalars: false,
        }
    }
}
