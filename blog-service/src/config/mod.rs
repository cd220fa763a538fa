use crate::models::LengthBounds;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Gemini REST endpoint root.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
pub struct BlogConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub generation: GenerationConfig,
    pub fallback: FallbackConfig,
    pub smtp: SmtpConfig,
    pub email: EmailConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub api_key: String,
    pub api_base: String,
}

/// Which text backend serves as the primary provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_PROVIDER must be 'gemini' or 'mock', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    /// Model for primary generation (e.g., gemini-2.0-flash)
    pub primary_model: String,
    /// Model used when the fallback strategy is `model`
    pub fallback_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub timeout_secs: u64,
    pub min_words: u32,
    pub max_words: u32,
    pub temperature: f32,
    pub max_output_tokens: i32,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn bounds(&self) -> LengthBounds {
        LengthBounds {
            min: self.min_words,
            max: self.max_words,
        }
    }
}

/// How a quota/transient failure is recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackStrategyKind {
    /// Retry once against a secondary model.
    Model,
    /// Render a deterministic template locally.
    Template,
    /// Surface the error to the caller.
    Disabled,
}

impl FromStr for FallbackStrategyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "model" => Ok(FallbackStrategyKind::Model),
            "template" => Ok(FallbackStrategyKind::Template),
            "disabled" | "none" => Ok(FallbackStrategyKind::Disabled),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "FALLBACK_STRATEGY must be 'model', 'template' or 'disabled', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    pub strategy: FallbackStrategyKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub send_timeout_secs: u64,
    pub subject_prefix: String,
    /// Used when a distribution request names no recipients.
    pub default_recipient: Option<String>,
}

impl EmailConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

/// Bounds on the in-memory session store.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub max_sessions: usize,
    pub idle_timeout_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl BlogConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let provider: ProviderKind = get_env("GENAI_PROVIDER", Some("gemini"), is_prod)?.parse()?;
        // A mock deployment has no use for a key.
        let api_key_default = match provider {
            ProviderKind::Mock => Some(""),
            ProviderKind::Gemini => None,
        };

        Ok(BlogConfig {
            common: common_config,
            google: GoogleConfig {
                api_key: get_env("GOOGLE_API_KEY", api_key_default, is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), is_prod)?,
            },
            models: ModelConfig {
                provider,
                primary_model: get_env("GENAI_TEXT_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                fallback_model: get_env(
                    "GENAI_FALLBACK_MODEL",
                    Some("gemini-2.0-flash-lite"),
                    is_prod,
                )?,
            },
            generation: GenerationConfig {
                timeout_secs: parse_env("GENERATION_TIMEOUT_SECS", 60, is_prod)?,
                min_words: parse_env("GENERATION_MIN_WORDS", 50, is_prod)?,
                max_words: parse_env("GENERATION_MAX_WORDS", 2000, is_prod)?,
                temperature: parse_env("GENERATION_TEMPERATURE", 0.7, is_prod)?,
                max_output_tokens: parse_env("GENERATION_MAX_OUTPUT_TOKENS", 2048, is_prod)?,
            },
            fallback: FallbackConfig {
                strategy: get_env("FALLBACK_STRATEGY", Some("template"), is_prod)?.parse()?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: parse_env("SMTP_PORT", 587, is_prod)?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@example.com"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("LinkedIn Blog Agent"), is_prod)?,
                enabled: parse_env("SMTP_ENABLED", false, is_prod)?,
            },
            email: EmailConfig {
                send_timeout_secs: parse_env("EMAIL_SEND_TIMEOUT_SECS", 30, is_prod)?,
                subject_prefix: get_env(
                    "EMAIL_SUBJECT_PREFIX",
                    Some("Generated LinkedIn Blog Post"),
                    is_prod,
                )?,
                default_recipient: env::var("EMAIL_RECIPIENT").ok().filter(|v| !v.is_empty()),
            },
            sessions: SessionConfig {
                max_sessions: parse_env("SESSION_MAX_ENTRIES", 1000, is_prod)?,
                idle_timeout_secs: parse_env("SESSION_IDLE_TIMEOUT_SECS", 3600, is_prod)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod && default.is_none() {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr + ToString,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(&default.to_string()), is_prod)?
        .trim()
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("{} is not valid: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_strategy_parses() {
        assert_eq!(
            "Template".parse::<FallbackStrategyKind>().unwrap(),
            FallbackStrategyKind::Template
        );
        assert_eq!(
            "none".parse::<FallbackStrategyKind>().unwrap(),
            FallbackStrategyKind::Disabled
        );
        assert!("retry".parse::<FallbackStrategyKind>().is_err());
    }

    #[test]
    fn provider_kind_parses() {
        assert_eq!("mock".parse::<ProviderKind>().unwrap(), ProviderKind::Mock);
        assert!("openai".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn missing_required_value_is_an_error() {
        let err = get_env("BLOG_SERVICE_TEST_UNSET_KEY", None, false).unwrap_err();
        assert!(err.to_string().contains("BLOG_SERVICE_TEST_UNSET_KEY"));
    }

    #[test]
    fn malformed_flag_is_rejected() {
        env::set_var("BLOG_SERVICE_TEST_SMTP_FLAG", "yes");
        let err = parse_env("BLOG_SERVICE_TEST_SMTP_FLAG", false, false).unwrap_err();
        assert!(err.to_string().contains("BLOG_SERVICE_TEST_SMTP_FLAG is not valid"));

        env::set_var("BLOG_SERVICE_TEST_SMTP_FLAG", "true");
        assert!(parse_env("BLOG_SERVICE_TEST_SMTP_FLAG", false, false).unwrap());
        env::remove_var("BLOG_SERVICE_TEST_SMTP_FLAG");
    }
}
