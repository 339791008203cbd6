use std::{str::FromStr, time::Duration};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;
/// Large enough for a 32 MiB PDF after base64 inflation plus prompts.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Server-side settings for the generation proxy.
///
/// The caller's API key is deliberately absent: it travels in each request
/// body and is never held by the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub port: u16,
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_version: String,
    pub upstream_timeout: Duration,
    pub body_limit: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_version: DEFAULT_API_VERSION.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            body_limit: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ProxyConfig {
    /// Reads settings from the process environment (call `dotenv` first).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            api_base: text("ANTHROPIC_API_BASE", defaults.api_base)
                .trim_end_matches('/')
                .to_string(),
            model: text("ANTHROPIC_MODEL", defaults.model),
            max_tokens: parse_or("ANTHROPIC_MAX_TOKENS", lookup("ANTHROPIC_MAX_TOKENS"), defaults.max_tokens),
            api_version: text("ANTHROPIC_VERSION", defaults.api_version),
            upstream_timeout: Duration::from_secs(parse_or(
                "UPSTREAM_TIMEOUT_SECS",
                lookup("UPSTREAM_TIMEOUT_SECS"),
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )),
            body_limit: parse_or("BODY_LIMIT_BYTES", lookup("BODY_LIMIT_BYTES"), defaults.body_limit),
        }
    }

    /// Full URL of the upstream messages endpoint.
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.api_base)
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw.as_deref().map(str::trim) {
        None | Some("") => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}={:?}, using default", key, value);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(ProxyConfig::from_lookup(|_| None), ProxyConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = ProxyConfig::from_lookup(lookup_from(&[
            ("PORT", "8081"),
            ("ANTHROPIC_API_BASE", "http://127.0.0.1:9999/"),
            ("ANTHROPIC_MAX_TOKENS", "1024"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.port, 8081);
        assert_eq!(config.api_base, "http://127.0.0.1:9999");
        assert_eq!(config.messages_url(), "http://127.0.0.1:9999/v1/messages");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn garbage_numbers_fall_back() {
        let config = ProxyConfig::from_lookup(lookup_from(&[("PORT", "eighty"), ("BODY_LIMIT_BYTES", "")]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT_BYTES);
    }
}
