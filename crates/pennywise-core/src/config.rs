//! Runtime configuration from the process environment
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, openai_compatible, mock). Default: gemini
//! - `API_KEY`: Credential for the hosted model (required unless `mock`)
//! - `AI_MODEL`: Model name (default depends on backend)
//! - `AI_HOST`: API base URL (default depends on backend)
//! - `PENNYWISE_PROMPTS_DIR`: Prompt override directory
//!
//! A missing key or an unknown backend is reported once, when the
//! configuration is loaded, not on every AI call.

use std::path::PathBuf;

use crate::ai::{
    DEFAULT_GEMINI_HOST, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_HOST, DEFAULT_OPENAI_MODEL,
};
use crate::error::{Error, Result};
use crate::prompts::default_prompts_dir;

pub const ENV_BACKEND: &str = "AI_BACKEND";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_MODEL: &str = "AI_MODEL";
pub const ENV_HOST: &str = "AI_HOST";
pub const ENV_PROMPTS_DIR: &str = "PENNYWISE_PROMPTS_DIR";

/// Which hosted API to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Gemini,
    OpenAICompatible,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAICompatible => "openai_compatible",
            Self::Mock => "mock",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => DEFAULT_GEMINI_MODEL,
            Self::OpenAICompatible => DEFAULT_OPENAI_MODEL,
            Self::Mock => "mock",
        }
    }

    fn default_host(&self) -> &'static str {
        match self {
            Self::Gemini => DEFAULT_GEMINI_HOST,
            Self::OpenAICompatible => DEFAULT_OPENAI_HOST,
            Self::Mock => "mock://localhost",
        }
    }

    fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenAICompatible)
            }
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown AI backend: {}", s)),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub api_key: Option<String>,
    pub model: String,
    pub host: String,
    pub prompts_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get(ENV_BACKEND) {
            Some(name) => name.parse::<BackendKind>().map_err(Error::Config)?,
            None => BackendKind::Gemini,
        };

        let api_key = get(ENV_API_KEY);
        if backend.requires_api_key() && api_key.is_none() {
            return Err(Error::Config(format!(
                "{} must be set for the {} backend",
                ENV_API_KEY, backend
            )));
        }

        let config = Self {
            backend,
            api_key,
            model: get(ENV_MODEL).unwrap_or_else(|| backend.default_model().to_string()),
            host: get(ENV_HOST).unwrap_or_else(|| backend.default_host().to_string()),
            prompts_dir: get(ENV_PROMPTS_DIR)
                .map(PathBuf::from)
                .or_else(default_prompts_dir),
        };

        tracing::debug!(backend = %config.backend, model = %config.model, "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let err = Config::from_lookup(lookup(&[("API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_gemini_defaults() {
        let config = Config::from_lookup(lookup(&[("API_KEY", "abc")])).unwrap();
        assert_eq!(config.backend, BackendKind::Gemini);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.host, DEFAULT_GEMINI_HOST);
        assert_eq!(config.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_mock_needs_no_key() {
        let config = Config::from_lookup(lookup(&[("AI_BACKEND", "Mock")])).unwrap();
        assert_eq!(config.backend, BackendKind::Mock);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let err =
            Config::from_lookup(lookup(&[("AI_BACKEND", "carrier-pigeon"), ("API_KEY", "k")]))
                .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("AI_BACKEND", "openai"),
            ("API_KEY", "sk"),
            ("AI_MODEL", "gpt-4o"),
            ("AI_HOST", "http://localhost:8000"),
            ("PENNYWISE_PROMPTS_DIR", "/tmp/prompts"),
        ]))
        .unwrap();
        assert_eq!(config.backend, BackendKind::OpenAICompatible);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.host, "http://localhost:8000");
        assert_eq!(config.prompts_dir, Some(PathBuf::from("/tmp/prompts")));
    }
}
