pub mod database;
pub mod email;
pub mod jwt;
pub mod rate_limit;
pub mod sms;

use std::env;

/// Parse a boolean-ish environment variable, falling back to `default` when
/// unset or unrecognised.
pub(crate) fn parse_bool_env(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Some(true),
            "0" | "false" | "no" | "n" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}
