use std::{env, path::PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Credentials seeded into `admins` at startup when both are set.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub channel_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key))
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, env::VarError>,
    {
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|_| default.to_string());

        Ok(Self {
            server: ServerConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: or_default("PORT", "5000")
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid PORT value".to_string()))?,
                max_body_size: or_default("MAX_BODY_SIZE", "10485760")
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid MAX_BODY_SIZE value".to_string()))?,
            },
            database: DatabaseConfig {
                url: var("DB_URL")
                    .map_err(|_| AppError::ConfigError("DB_URL not set".to_string()))?,
                max_connections: or_default("DB_MAX_CONNECTIONS", "10").parse().map_err(|_| {
                    AppError::ConfigError("Invalid DB_MAX_CONNECTIONS value".to_string())
                })?,
            },
            cors: CorsConfig {
                allowed_origins: or_default("FRONTEND_URL", "http://localhost:3000")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            auth: AuthConfig {
                jwt_secret: var("JWT_SECRET")
                    .map_err(|_| AppError::ConfigError("JWT_SECRET not set".to_string()))?,
                token_ttl_hours: or_default("TOKEN_TTL_HOURS", "24")
                    .parse()
                    .map_err(|_| AppError::ConfigError("Invalid TOKEN_TTL_HOURS value".to_string()))?,
                admin_username: var("ADMIN_USERNAME").ok().filter(|s| !s.trim().is_empty()),
                admin_password: var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
            },
            uploads: UploadConfig {
                dir: PathBuf::from(or_default("UPLOAD_DIR", "uploads")),
            },
            notifications: NotificationConfig {
                channel_capacity: or_default("NOTIFICATION_CAPACITY", "64")
                    .parse()
                    .ok()
                    .filter(|capacity| *capacity > 0)
                    .ok_or_else(|| {
                        AppError::ConfigError("Invalid NOTIFICATION_CAPACITY value".to_string())
                    })?,
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
