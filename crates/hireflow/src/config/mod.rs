use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Secret used when `AUTH_TOKEN_SECRET` is absent. Refused in production.
pub const DEVELOPMENT_TOKEN_SECRET: &str = "hireflow-development-secret";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub payments: PaymentConfig,
    pub text_generation: TextGenerationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        )?;

        let token_secret =
            env::var("AUTH_TOKEN_SECRET").unwrap_or_else(|_| DEVELOPMENT_TOKEN_SECRET.to_string());
        if environment == AppEnvironment::Production && token_secret == DEVELOPMENT_TOKEN_SECRET {
            return Err(ConfigError::InsecureTokenSecret);
        }

        let auth = AuthConfig {
            token_secret,
            token_ttl_hours: parse_number("AUTH_TOKEN_TTL_HOURS", 24)?,
            admin_token: optional_var("ADMIN_TOKEN"),
        };

        let payments = PaymentConfig {
            api_base: env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            secret_key: optional_var("PAYMENT_SECRET_KEY"),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
            success_url: env::var("PAYMENT_SUCCESS_URL").unwrap_or_else(|_| {
                "http://localhost:3000/payment-success?session_id={CHECKOUT_SESSION_ID}"
                    .to_string()
            }),
            cancel_url: env::var("PAYMENT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payment-cancelled".to_string()),
            timeout: Duration::from_secs(parse_number("PAYMENT_TIMEOUT_SECS", 10)?),
        };

        let text_generation = TextGenerationConfig {
            api_base: env::var("TEXTGEN_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            api_key: optional_var("TEXTGEN_API_KEY"),
            model: env::var("TEXTGEN_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout: Duration::from_secs(parse_number("TEXTGEN_TIMEOUT_SECS", 20)?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            auth,
            payments,
            text_generation,
        })
    }
}

fn optional_var(key: &'static str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Line layout for the process log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// Bearer credential signing and operator access.
#[derive(Clone)]
pub struct AuthConfig {
    pub token_secret: String,
    pub token_ttl_hours: u64,
    pub admin_token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Payment-session provider settings.
#[derive(Clone)]
pub struct PaymentConfig {
    pub api_base: String,
    pub secret_key: Option<String>,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("api_base", &self.api_base)
            .field("configured", &self.secret_key.is_some())
            .field("currency", &self.currency)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Text-generation provider settings used for worker profile copy.
#[derive(Clone)]
pub struct TextGenerationConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl fmt::Debug for TextGenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextGenerationConfig")
            .field("api_base", &self.api_base)
            .field("configured", &self.api_key.is_some())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("{key} must be a non-negative integer (got '{value}')")]
    InvalidNumber { key: &'static str, value: String },
    #[error("APP_LOG_FORMAT must be compact, pretty, or json (got '{value}')")]
    InvalidLogFormat { value: String },
    #[error("AUTH_TOKEN_SECRET must be set in production")]
    InsecureTokenSecret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "AUTH_TOKEN_SECRET",
            "AUTH_TOKEN_TTL_HOURS",
            "ADMIN_TOKEN",
            "PAYMENT_API_BASE",
            "PAYMENT_SECRET_KEY",
            "PAYMENT_CURRENCY",
            "PAYMENT_SUCCESS_URL",
            "PAYMENT_CANCEL_URL",
            "PAYMENT_TIMEOUT_SECS",
            "TEXTGEN_API_BASE",
            "TEXTGEN_API_KEY",
            "TEXTGEN_MODEL",
            "TEXTGEN_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(config.auth.admin_token.is_none());
        assert!(config.payments.secret_key.is_none());
        assert_eq!(config.payments.timeout, Duration::from_secs(10));
        assert_eq!(config.text_generation.model, "gpt-4o-mini");
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn rejects_non_numeric_timeouts() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PAYMENT_TIMEOUT_SECS", "soon");
        let err = AppConfig::load().expect_err("timeout must be numeric");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                key: "PAYMENT_TIMEOUT_SECS",
                ..
            }
        ));
        reset_env();
    }

    #[test]
    fn production_requires_token_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InsecureTokenSecret)
        ));

        env::set_var("AUTH_TOKEN_SECRET", "rotated-secret");
        let config = AppConfig::load().expect("secret supplied");
        assert_eq!(config.environment, AppEnvironment::Production);
        reset_env();
    }

    #[test]
    fn blank_optional_keys_are_treated_as_unset() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADMIN_TOKEN", "   ");
        let config = AppConfig::load().expect("config loads");
        assert!(config.auth.admin_token.is_none());
        reset_env();
    }

    #[test]
    fn log_format_accepts_known_layouts_only() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LOG_FORMAT", "JSON");
        let config = AppConfig::load().expect("json layout is known");
        assert_eq!(config.telemetry.log_format, LogFormat::Json);

        env::set_var("APP_LOG_FORMAT", "xml");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidLogFormat { .. })
        ));
        reset_env();
    }
}
