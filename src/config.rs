//! Service configuration
//!
//! Settings come from environment variables, optionally seeded from a
//! `.env` file in the working directory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Lowest work factor bcrypt accepts (mirrors the crate's private `MIN_COST`).
pub const BCRYPT_MIN_COST: u32 = 4;
/// Highest work factor bcrypt accepts (mirrors the crate's private `MAX_COST`).
pub const BCRYPT_MAX_COST: u32 = 31;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Credentials and roles of one configured account
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
    pub roles: Vec<String>,
}

/// Main service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// SQLite file, or `:memory:`
    pub database: PathBuf,
    /// Directory for uploads awaiting import and finished exports
    pub work_dir: PathBuf,
    /// Insert sample sections into an empty database on startup
    pub seed_sample_data: bool,
    pub max_upload_bytes: usize,
    pub user: AccountConfig,
    pub admin: AccountConfig,
    /// bcrypt work factor for stored account passwords
    pub password_cost: u32,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database: PathBuf::from("geosections.db"),
            work_dir: std::env::temp_dir().join("geosections"),
            seed_sample_data: true,
            max_upload_bytes: 10 * 1024 * 1024,
            user: AccountConfig {
                username: "user".to_string(),
                password: "password".to_string(),
                roles: vec!["USER".to_string()],
            },
            admin: AccountConfig {
                username: "admin".to_string(),
                password: "adminpassword".to_string(),
                roles: vec!["ADMIN".to_string()],
            },
            password_cost: 10,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup("GEOSECTIONS_BIND") {
            config.bind_addr = parse("GEOSECTIONS_BIND", &value)?;
        }
        if let Some(value) = lookup("GEOSECTIONS_DATABASE") {
            config.database = PathBuf::from(non_empty("GEOSECTIONS_DATABASE", value)?);
        }
        if let Some(value) = lookup("GEOSECTIONS_WORK_DIR") {
            config.work_dir = PathBuf::from(non_empty("GEOSECTIONS_WORK_DIR", value)?);
        }
        if let Some(value) = lookup("GEOSECTIONS_SEED") {
            config.seed_sample_data = parse_bool("GEOSECTIONS_SEED", &value)?;
        }
        if let Some(value) = lookup("GEOSECTIONS_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse("GEOSECTIONS_MAX_UPLOAD_BYTES", &value)?;
        }
        if let Some(value) = lookup("GEOSECTIONS_BCRYPT_COST") {
            config.password_cost = parse("GEOSECTIONS_BCRYPT_COST", &value)?;
            if !(crate::config::BCRYPT_MIN_COST..=crate::config::BCRYPT_MAX_COST).contains(&config.password_cost) {
                return Err(ConfigError::InvalidValue {
                    key: "GEOSECTIONS_BCRYPT_COST",
                    value,
                });
            }
        }
        if let Some(value) = lookup("RUST_LOG") {
            config.log_level = value;
        }

        apply_account(&lookup, &mut config.user, ["USER_USERNAME", "USER_PASSWORD", "USER_ROLES"])?;
        apply_account(&lookup, &mut config.admin, ["ADMIN_USERNAME", "ADMIN_PASSWORD", "ADMIN_ROLES"])?;

        Ok(config)
    }
}

fn apply_account<F>(
    lookup: &F,
    account: &mut AccountConfig,
    [username_key, password_key, roles_key]: [&'static str; 3],
) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(username_key) {
        account.username = non_empty(username_key, value)?;
    }
    if let Some(value) = lookup(password_key) {
        account.password = non_empty(password_key, value)?;
    }
    if let Some(value) = lookup(roles_key) {
        account.roles = parse_roles(&value);
    }
    Ok(())
}

/// Split a comma separated role list, dropping blanks
pub fn parse_roles(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|role| role.trim().to_uppercase())
        .filter(|role| !role.is_empty())
        .collect()
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

fn non_empty(key: &'static str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        Err(ConfigError::Empty(key))
    } else {
        Ok(value)
    }
}
