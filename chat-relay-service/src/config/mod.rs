use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

/// Origin of the site the chat widget is served from.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://dazzling-medovik-4e3200.netlify.app";

const DEFAULT_TEXT_MODEL: &str = "gemini-exp-1114";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_HISTORY_PATH: &str = "chat_history.json";

/// Voice the assistant answers in unless `PERSONA_INSTRUCTION` replaces it.
pub const DEFAULT_PERSONA_INSTRUCTION: &str = "\
You are the owner of this portfolio site: a computer science student with a strong \
foundation in web development, data science and software engineering, and an AI enthusiast.

Speak in the first person as yourself and keep every answer to one or two sentences. \
If asked about this chatbot, say it was built using Google Generative AI. If asked about \
your skills, projects or background, answer as yourself, short and focused.

Remember:
- Answer in one or two sentences.
- Use a friendly, knowledgeable tone.
- Give quick insights into your skills, projects and academic history.
- Refer directly to your own experience.
";

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub history: HistoryConfig,
    pub cors: CorsConfig,
    pub persona: PersonaConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// Empty when no credential was supplied; provider calls then fail.
    pub api_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub text_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonaConfig {
    pub instruction: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let api_key = get_optional_env("GOOGLE_API_KEY")
            .or_else(|| get_optional_env("API_KEY"))
            .unwrap_or_default();

        let config = RelayConfig {
            common: common_config,
            google: GoogleConfig {
                api_key,
                api_base: get_env("GEMINI_API_BASE", DEFAULT_API_BASE),
            },
            models: ModelConfig {
                text_model: get_env("GENAI_TEXT_MODEL", DEFAULT_TEXT_MODEL),
            },
            history: HistoryConfig {
                path: PathBuf::from(get_env("CHAT_HISTORY_PATH", DEFAULT_HISTORY_PATH)),
            },
            cors: CorsConfig {
                allowed_origin: get_env("CORS_ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN),
            },
            persona: PersonaConfig {
                instruction: get_env("PERSONA_INSTRUCTION", DEFAULT_PERSONA_INSTRUCTION),
            },
            observability: ObservabilityConfig {
                log_level: get_env("LOG_LEVEL", "info"),
                otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Settings for tests and embedding: defaults everywhere, given port and
    /// transcript path, no credential.
    pub fn with_defaults(port: u16, history_path: impl Into<PathBuf>) -> Self {
        RelayConfig {
            common: core_config::Config { port },
            google: GoogleConfig {
                api_key: String::new(),
                api_base: DEFAULT_API_BASE.to_string(),
            },
            models: ModelConfig {
                text_model: DEFAULT_TEXT_MODEL.to_string(),
            },
            history: HistoryConfig {
                path: history_path.into(),
            },
            cors: CorsConfig {
                allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            },
            persona: PersonaConfig {
                instruction: DEFAULT_PERSONA_INSTRUCTION.to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                otlp_endpoint: None,
            },
        }
    }

    /// Reject settings that would only fail later, after the port is bound.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.cors.allowed_origin.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CORS_ALLOWED_ORIGIN must not be empty"
            )));
        }
        self.cors
            .allowed_origin
            .parse::<axum::http::HeaderValue>()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Invalid CORS origin '{}': {}",
                    self.cors.allowed_origin,
                    e
                ))
            })?;
        if self.models.text_model.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "GENAI_TEXT_MODEL must not be empty"
            )));
        }
        Ok(())
    }
}

fn get_env(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = RelayConfig::with_defaults(0, "chat_history.json");

        assert!(config.validate().is_ok());
        assert_eq!(config.cors.allowed_origin, DEFAULT_ALLOWED_ORIGIN);
        assert_eq!(config.models.text_model, "gemini-exp-1114");
        assert!(config.google.api_key.is_empty());
    }

    #[test]
    fn origin_with_control_characters_is_rejected() {
        let mut config = RelayConfig::with_defaults(0, "chat_history.json");
        config.cors.allowed_origin = "https://example.com\n".to_string();

        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn blank_model_is_rejected() {
        let mut config = RelayConfig::with_defaults(0, "chat_history.json");
        config.models.text_model = "  ".to_string();

        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }
}
