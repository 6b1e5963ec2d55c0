//! Runtime settings read from the environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `PARAMFLOW_PORT` | `3000` | HTTP port for `serve` |
//! | `PARAMFLOW_ESCAPE_TOKEN` | `___` | Token standing for a literal `.` in keys |
//! | `PARAMFLOW_CORS_ORIGIN` | any | Allowed CORS origin |
//!
//! A `.env` file in the working directory is loaded first when present.

use std::env;

use crate::error::ServerError;
use crate::params::DEFAULT_ESCAPE_TOKEN;
use crate::pipeline::RunOptions;

pub const PORT_VAR: &str = "PARAMFLOW_PORT";
pub const ESCAPE_TOKEN_VAR: &str = "PARAMFLOW_ESCAPE_TOKEN";
pub const CORS_ORIGIN_VAR: &str = "PARAMFLOW_CORS_ORIGIN";

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub escape_token: String,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            escape_token: DEFAULT_ESCAPE_TOKEN.to_string(),
            cors_origin: None,
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ServerError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(port) = lookup(PORT_VAR) {
            settings.port = port
                .trim()
                .parse()
                .map_err(|_| ServerError::Config(format!("{} must be a port number, got '{}'", PORT_VAR, port)))?;
        }
        if let Some(token) = lookup(ESCAPE_TOKEN_VAR) {
            settings.escape_token = token;
        }
        settings.cors_origin = lookup(CORS_ORIGIN_VAR).filter(|origin| !origin.trim().is_empty() && origin != "*");

        Ok(settings)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Run options carrying these settings.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            escape_token: self.escape_token.clone(),
            ..RunOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.escape_token, "___");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (PORT_VAR, "8080"),
            (ESCAPE_TOKEN_VAR, "~~"),
            (CORS_ORIGIN_VAR, "http://localhost:5173"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.run_options().escape_token, "~~");
        assert_eq!(settings.cors_origin.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn test_wildcard_origin_means_any() {
        let settings = Settings::from_lookup(lookup(&[(CORS_ORIGIN_VAR, "*")])).unwrap();
        assert_eq!(settings.cors_origin, None);
    }

    #[test]
    fn test_bad_port() {
        let err = Settings::from_lookup(lookup(&[(PORT_VAR, "http")])).unwrap_err();
        assert!(err.to_string().contains(PORT_VAR));
    }
}
