use anyhow::Context;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    /// Session cookies carry `Secure` only in production.
    pub fn secure_cookies(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("NODE_ENV must be development, test or production, got '{}'", other),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub environment: Environment,
    pub enforce_role_allowlist: bool,
    pub cors_allowed_origins: Option<String>,
    pub log_request_body: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let environment: Environment = env::var("NODE_ENV").unwrap_or_default().parse()?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        check_jwt_secret(environment, &jwt_secret)?;

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: env::var("DATABASE_URL").unwrap_or_default(),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            jwt_secret,
            token_ttl_secs: parse_token_ttl(env::var("TOKEN_TTL_SECS").ok())?,
            environment,
            enforce_role_allowlist: parse_flag(env::var("ROLE_GATE_ENFORCE_ALLOWLIST").ok())?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            log_request_body: parse_flag(env::var("LOG_REQUEST_BODY").ok())?,
        })
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Rejects empty secrets everywhere and short ones in production.
pub fn check_jwt_secret(environment: Environment, secret: &str) -> anyhow::Result<()> {
    if secret.trim().is_empty() {
        anyhow::bail!("JWT_SECRET must not be empty");
    }
    if environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
        anyhow::bail!(
            "JWT_SECRET must be at least {} bytes in production",
            MIN_PRODUCTION_SECRET_LEN
        );
    }
    Ok(())
}

/// Token lifetime in seconds, between 1 and [`MAX_TOKEN_TTL_SECS`].
pub fn check_token_ttl(ttl_secs: u64) -> anyhow::Result<()> {
    if ttl_secs == 0 || ttl_secs > MAX_TOKEN_TTL_SECS {
        anyhow::bail!(
            "TOKEN_TTL_SECS must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_SECS,
            ttl_secs
        );
    }
    Ok(())
}

fn parse_token_ttl(raw: Option<String>) -> anyhow::Result<u64> {
    let ttl_secs = match raw.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_TOKEN_TTL_SECS,
        Some(value) => value
            .parse()
            .context("TOKEN_TTL_SECS must be a number of seconds")?,
    };
    check_token_ttl(ttl_secs)?;
    Ok(ttl_secs)
}

fn parse_flag(raw: Option<String>) -> anyhow::Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("expected a boolean flag, got '{}'", other),
        },
    }
}
