use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

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
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub notifier: NotifierConfig,
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

        let session = SessionConfig {
            cookie_age_secs: parse_seconds("SESSION_COOKIE_AGE", 1800)?,
        };

        let auth = AuthConfig {
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password_hash: optional_var("ADMIN_PASSWORD_HASH"),
            jwt_secret: optional_var("JWT_SECRET"),
            access_ttl_secs: parse_seconds("JWT_ACCESS_TTL_SECS", 300)?,
            refresh_ttl_secs: parse_seconds("JWT_REFRESH_TTL_SECS", 86_400)?,
        };

        let media = MediaConfig {
            media_root: PathBuf::from(
                env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            ),
            static_root: PathBuf::from(
                env::var("STATIC_ROOT").unwrap_or_else(|_| "static".to_string()),
            ),
        };

        let notifier = NotifierConfig {
            mail_sender_address: optional_var("EMAIL_HOST_USER"),
            mail_recipient_address: optional_var("ADMIN_NOTIFICATION_EMAIL"),
            smtp_host: optional_var("EMAIL_HOST"),
            smtp_port: parse_var("EMAIL_PORT", 587)?,
            smtp_password: optional_var("EMAIL_HOST_PASSWORD"),
            messaging_account_id: optional_var("TWILIO_ACCOUNT_SID"),
            messaging_auth_token: optional_var("TWILIO_AUTH_TOKEN"),
            messaging_sender_number: optional_var("TWILIO_WHATSAPP_NUMBER"),
            messaging_recipient_number: optional_var("ADMIN_WHATSAPP"),
            messaging_api_base: env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
            max_in_flight: parse_var("NOTIFY_MAX_IN_FLIGHT", 8)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            session,
            auth,
            media,
            notifier,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable: name }),
        None => Ok(default),
    }
}

/// Upper bound for configured lifetimes: ten years.
const MAX_LIFETIME_SECS: i64 = 315_360_000;

/// Lifetime in seconds, positive and no longer than `MAX_LIFETIME_SECS`.
fn parse_seconds(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    let secs = parse_var(name, default)?;
    if (1..=MAX_LIFETIME_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(ConfigError::OutOfRange {
            variable: name,
            max: MAX_LIFETIME_SECS,
        })
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
}

/// Website session lifetime; also the idle threshold enforced by the session guard.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_age_secs: i64,
}

impl SessionConfig {
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cookie_age_secs)
    }
}

/// Admin credentials and API token lifetimes.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_username: String,
    /// Argon2 PHC string; admin login is disabled while unset.
    pub admin_password_hash: Option<String>,
    pub jwt_secret: Option<String>,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub media_root: PathBuf,
    pub static_root: PathBuf,
}

/// Credentials and addresses for the inquiry notification channels.
///
/// Each channel is only built when every value it needs is present.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub mail_sender_address: Option<String>,
    pub mail_recipient_address: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_password: Option<String>,
    pub messaging_account_id: Option<String>,
    pub messaging_auth_token: Option<String>,
    pub messaging_sender_number: Option<String>,
    pub messaging_recipient_number: Option<String>,
    pub messaging_api_base: String,
    pub max_in_flight: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            mail_sender_address: None,
            mail_recipient_address: None,
            smtp_host: None,
            smtp_port: 587,
            smtp_password: None,
            messaging_account_id: None,
            messaging_auth_token: None,
            messaging_sender_number: None,
            messaging_recipient_number: None,
            messaging_api_base: "https://api.twilio.com".to_string(),
            max_in_flight: 8,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
    OutOfRange { variable: &'static str, max: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a valid number")
            }
            ConfigError::OutOfRange { variable, max } => {
                write!(f, "{variable} must be between 1 and {max} seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::OutOfRange { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
