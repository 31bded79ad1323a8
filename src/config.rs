use std::env;

use thiserror::Error;

/// Fallback secret for local runs only. Production refuses to start without `JWT_SECRET_KEY`.
const LOCAL_JWT_SECRET: &str = "filmbase-local-development-secret";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8082";

/// AppConfig
///
/// Holds all immutable configuration parameters required by the application.
/// Loaded once at startup and shared through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Runtime environment marker. Selects log format and how strict loading is.
    pub env: Env,
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Postgres connection URL. `None` selects the in-memory repository (local only).
    pub database_url: Option<String>,
    /// HS256 secret shared by token issuing and verification.
    pub jwt_secret: String,
    /// Optional `(username, password)` of an admin account provisioned at startup.
    pub admin: Option<(String, String)>,
}

/// Env
///
/// Defines the runtime context.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    MissingInProduction(&'static str),
    #[error("{name} is not valid: {cause}")]
    Invalid { name: &'static str, cause: String },
}

impl Default for AppConfig {
    /// Test configuration: local mode, in-memory storage, fixed secret.
    fn default() -> Self {
        Self {
            env: Env::Local,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            database_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            admin: None,
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. In `production` the
    /// JWT secret and the database location are mandatory; in `local` every
    /// value has a fallback.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match var("APP_ENV").as_deref() {
            Some("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (var("JWT_SECRET_KEY"), env) {
            (Some(secret), _) => secret,
            (None, Env::Production) => {
                return Err(ConfigError::MissingInProduction("JWT_SECRET_KEY"));
            }
            (None, Env::Local) => LOCAL_JWT_SECRET.to_string(),
        };

        let database_url = match (var("DATABASE_URL"), var("DB_HOST")) {
            (Some(url), _) => Some(url),
            (None, Some(host)) => Some(database_url_from_parts(&host)?),
            (None, None) if env == Env::Production => {
                return Err(ConfigError::MissingInProduction("DATABASE_URL or DB_HOST"));
            }
            (None, None) => None,
        };

        let admin = match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some((username, password)),
            (Some(_), None) => {
                return Err(ConfigError::Invalid {
                    name: "ADMIN_PASSWORD",
                    cause: "required when ADMIN_USERNAME is set".to_string(),
                });
            }
            _ => None,
        };

        Ok(Self {
            env,
            listen_addr: var("HTTP_SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            database_url,
            jwt_secret,
            admin,
        })
    }
}

fn database_url_from_parts(host: &str) -> Result<String, ConfigError> {
    let port = var("DB_PORT").unwrap_or_else(|| "5432".to_string());
    port.parse::<u16>().map_err(|err| ConfigError::Invalid {
        name: "DB_PORT",
        cause: err.to_string(),
    })?;

    let name = var("DB_NAME").unwrap_or_else(|| "postgres".to_string());
    let user = var("DB_USER").unwrap_or_else(|| "user".to_string());
    let password = var("DB_PASSWORD").unwrap_or_else(|| "password".to_string());

    Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
}
