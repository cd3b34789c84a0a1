use anyhow::{Context, ensure};
use std::str::FromStr;
use ussd_flow::DEFAULT_SESSION_TTL_SECS;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logging for development
    Pretty,
    /// Structured JSON logging for production
    Json,
}

/// Runtime settings, read once from the environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub session_ttl: chrono::Duration,
    pub sweep_interval: std::time::Duration,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let ttl_secs: i64 = parse_or(&lookup, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        ensure!(ttl_secs > 0, "SESSION_TTL_SECS must be positive, got {ttl_secs}");

        let sweep_secs: u64 = parse_or(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        ensure!(sweep_secs > 0, "SWEEP_INTERVAL_SECS must be positive, got {sweep_secs}");

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        Ok(Self {
            port,
            session_ttl: chrono::Duration::seconds(ttl_secs),
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
            log_format,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<ServiceConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.session_ttl, chrono::Duration::minutes(5));
        assert_eq!(config.sweep_interval, std::time::Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("SESSION_TTL_SECS", "120"),
            ("SWEEP_INTERVAL_SECS", "15"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl, chrono::Duration::seconds(120));
        assert_eq!(config.sweep_interval, std::time::Duration::from_secs(15));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_rejects_malformed_values() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(config_from(&[("SESSION_TTL_SECS", "0")]).is_err());
        assert!(config_from(&[("SWEEP_INTERVAL_SECS", "-5")]).is_err());
    }
}
