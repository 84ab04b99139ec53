use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::auth::MAX_SESSION_HOURS;

/// Signing secret used when SESSION_SECRET is not provided. Production refuses it.
pub const DEVELOPMENT_SESSION_SECRET: &str = "pinboard-development-session-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Base address used to build URLs of uploaded files. When unset the
    /// request's Host header is used instead.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string; `None` selects the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub session_secret: String,
    pub session_expiry_hours: u64,
    pub cookie_secure: bool,
    pub password_memory_kib: u32,
    pub password_iterations: u32,
    pub password_parallelism: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("PINBOARD_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            let v = v.trim();
            self.server.public_base_url = (!v.is_empty()).then(|| v.to_string());
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            let v = v.trim();
            self.database.url = (!v.is_empty()).then(|| v.to_string());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Upload overrides
        if let Ok(v) = env::var("UPLOADS_DIR") {
            self.uploads.dir = PathBuf::from(v);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }
        if let Ok(v) = env::var("PASSWORD_MEMORY_KIB") {
            self.security.password_memory_kib = v.parse().unwrap_or(self.security.password_memory_kib);
        }
        if let Ok(v) = env::var("PASSWORD_ITERATIONS") {
            self.security.password_iterations = v.parse().unwrap_or(self.security.password_iterations);
        }
        if let Ok(v) = env::var("PASSWORD_PARALLELISM") {
            self.security.password_parallelism = v.parse().unwrap_or(self.security.password_parallelism);
        }

        self
    }

    /// Checks that must hold before the server accepts traffic
    pub fn validate(&self) -> Result<(), String> {
        if self.security.session_secret.is_empty() {
            return Err("SESSION_SECRET must not be empty".to_string());
        }
        if self.security.session_expiry_hours == 0 || self.security.session_expiry_hours > MAX_SESSION_HOURS {
            return Err(format!(
                "SESSION_EXPIRY_HOURS must be between 1 and {}",
                MAX_SESSION_HOURS
            ));
        }
        if self.environment == Environment::Production
            && self.security.session_secret == DEVELOPMENT_SESSION_SECRET
        {
            return Err("SESSION_SECRET must be set in production".to_string());
        }
        if let Some(base) = &self.server.public_base_url {
            url::Url::parse(base).map_err(|e| format!("PUBLIC_BASE_URL is not a valid URL: {}", e))?;
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 5000,
                public_base_url: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            uploads: UploadConfig {
                dir: PathBuf::from("uploads"),
                max_file_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string()],
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_expiry_hours: 24 * 7, // 1 week
                cookie_secure: false,
                password_memory_kib: 19 * 1024,
                password_iterations: 2,
                password_parallelism: 1,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 5000,
                public_base_url: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            uploads: UploadConfig {
                dir: PathBuf::from("uploads"),
                max_file_bytes: 10 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_expiry_hours: 24,
                cookie_secure: true,
                password_memory_kib: 19 * 1024,
                password_iterations: 2,
                password_parallelism: 1,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 5000,
                public_base_url: None,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            uploads: UploadConfig {
                dir: PathBuf::from("uploads"),
                max_file_bytes: 10 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_expiry_hours: 24,
                cookie_secure: true,
                password_memory_kib: 64 * 1024,
                password_iterations: 3,
                password_parallelism: 1,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.uploads.max_file_bytes, 10 * 1024 * 1024);
        assert!(!config.security.cookie_secure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.cookie_secure);
        assert_eq!(config.security.session_expiry_hours, 24);
    }

    #[test]
    fn production_rejects_development_secret() {
        let mut config = AppConfig::production();
        assert!(config.validate().is_err());

        config.security.session_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_session_lifetime() {
        let mut config = AppConfig::development();
        config.security.session_expiry_hours = u64::MAX;
        assert!(config.validate().is_err());

        config.security.session_expiry_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_public_base_url() {
        let mut config = AppConfig::development();
        config.server.public_base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }
}
