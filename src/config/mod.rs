use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub uploads: UploadConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_upload_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

/// First-run seed account. Only consulted when the users table is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
    pub organization_name: String,
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
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs =
                v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes =
                v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Upload overrides
        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.uploads.dir = v;
        }
        if let Ok(v) = env::var("UPLOAD_MAX_BYTES") {
            self.uploads.max_upload_bytes = v.parse().unwrap_or(self.uploads.max_upload_bytes);
        }

        // Bootstrap overrides
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_NAME") {
            self.bootstrap.admin_name = v;
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_EMAIL") {
            self.bootstrap.admin_email = v;
        }
        if let Ok(v) = env::var("BOOTSTRAP_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = v;
        }
        if let Ok(v) = env::var("BOOTSTRAP_ORG_NAME") {
            self.bootstrap.organization_name = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
                max_request_size_bytes: 12 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                // Development-only fallback; real deployments set JWT_SECRET.
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7,
            },
            uploads: Self::default_uploads(),
            bootstrap: Self::default_bootstrap(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 60,
                max_request_size_bytes: 12 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            uploads: Self::default_uploads(),
            bootstrap: Self::default_bootstrap(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 60,
                rate_limit_window_secs: 60,
                max_request_size_bytes: 12 * 1024 * 1024,
            },
            security: SecurityConfig {
                cors_origins: vec![],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
            uploads: Self::default_uploads(),
            bootstrap: Self::default_bootstrap(),
        }
    }

    fn default_uploads() -> UploadConfig {
        UploadConfig {
            dir: "uploads".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_extensions: [
                "jpg", "jpeg", "png", "gif", "webp", "pdf", "doc", "docx", "xls", "xlsx", "ppt",
                "pptx", "txt", "csv", "md",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }

    fn default_bootstrap() -> BootstrapConfig {
        BootstrapConfig {
            admin_name: "System Administrator".to_string(),
            admin_email: "admin@helpdesk.local".to_string(),
            admin_password: "ChangeMe123!".to_string(),
            organization_name: "Default Organization".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
