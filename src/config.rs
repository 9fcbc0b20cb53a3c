//! Runtime configuration
//!
//! Read from the process environment, after loading `.env` if present.

use crate::error::ChatbotError;
use crate::Result;
use std::env;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
/// 16 MiB, the largest accepted upload
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Install the built-in dataset at startup
    pub load_sample_on_start: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            load_sample_on_start: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ChatbotError::Config(format!("invalid PORT '{}'", v)))?,
            None => defaults.port,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ChatbotError::Config(format!("invalid MAX_UPLOAD_BYTES '{}'", v)))?,
            None => defaults.max_upload_bytes,
        };

        let load_sample_on_start = match lookup("LOAD_SAMPLE_ON_START") {
            Some(v) => parse_flag(&v).ok_or_else(|| {
                ChatbotError::Config(format!("invalid LOAD_SAMPLE_ON_START '{}'", v))
            })?,
            None => defaults.load_sample_on_start,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            max_upload_bytes,
            load_sample_on_start,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]).unwrap(), AppConfig::default());
        assert_eq!(AppConfig::default().max_upload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_port_fallback() {
        assert_eq!(config(&[("API_PORT", "9000")]).unwrap().port, 9000);
        assert_eq!(
            config(&[("PORT", "7000"), ("API_PORT", "9000")]).unwrap().port,
            7000
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ChatbotError::Config(_))
        ));
        assert!(config(&[("MAX_UPLOAD_BYTES", "-1")]).is_err());
        assert!(config(&[("LOAD_SAMPLE_ON_START", "maybe")]).is_err());
    }

    #[test]
    fn test_flags() {
        let cfg = config(&[("LOAD_SAMPLE_ON_START", "Yes"), ("BIND_ADDR", "127.0.0.1")]).unwrap();
        assert!(cfg.load_sample_on_start);
        assert_eq!(cfg.bind_addr, "127.0.0.1");
    }
}
