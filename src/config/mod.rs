use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which data store implementation backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_upload_bytes: usize,
    pub popular_default_limit: i64,
    pub popular_max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub secure_cookies: bool,
    pub admin_api_key: Option<String>,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: MediaBackend,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub profile_image_bucket: String,
    pub cover_image_bucket: String,
    pub thumbnail_bucket: String,
    pub video_bucket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<String>,
    pub currency: String,
    pub api_base: String,
}

impl PaymentConfig {
    /// Payment routes are only mounted when both gateway credentials are present
    pub fn is_configured(&self) -> bool {
        self.razorpay_key_id.as_deref().map_or(false, |s| !s.is_empty())
            && self.razorpay_key_secret.as_deref().map_or(false, |s| !s.is_empty())
    }
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
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            self.database.backend = match v.to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "postgres" | "postgresql" => StoreBackend::Postgres,
                _ => self.database.backend,
            };
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_UPLOAD_BYTES") {
            self.api.max_upload_bytes = v.parse().unwrap_or(self.api.max_upload_bytes);
        }
        if let Ok(v) = env::var("API_POPULAR_DEFAULT_LIMIT") {
            self.api.popular_default_limit = v.parse().unwrap_or(self.api.popular_default_limit);
        }
        if let Ok(v) = env::var("API_POPULAR_MAX_LIMIT") {
            self.api.popular_max_limit = v.parse().unwrap_or(self.api.popular_max_limit);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_SECRET") {
            self.security.access_token_secret = v;
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_SECRET") {
            self.security.refresh_token_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_TTL_MINUTES") {
            self.security.access_token_ttl_minutes = v.parse().unwrap_or(self.security.access_token_ttl_minutes);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_TTL_DAYS") {
            self.security.refresh_token_ttl_days = v.parse().unwrap_or(self.security.refresh_token_ttl_days);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("ADMIN_API_KEY") {
            self.security.admin_api_key = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            self.storage.backend = match v.to_ascii_lowercase().as_str() {
                "memory" => MediaBackend::Memory,
                "supabase" => MediaBackend::Supabase,
                _ => self.storage.backend,
            };
        }
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.storage.supabase_url = Some(v);
        }
        if let Ok(v) = env::var("SUPABASE_SERVICE_KEY") {
            self.storage.supabase_service_key = Some(v);
        }

        // Payment overrides
        if let Ok(v) = env::var("RAZORPAY_KEY_ID") {
            self.payment.razorpay_key_id = Some(v);
        }
        if let Ok(v) = env::var("RAZORPAY_KEY_SECRET") {
            self.payment.razorpay_key_secret = Some(v);
        }
        if let Ok(v) = env::var("PAYMENT_CURRENCY") {
            self.payment.currency = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_upload_bytes: 100 * 1024 * 1024, // 100MB
                popular_default_limit: 20,
                popular_max_limit: 100,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:5173".to_string()],
                access_token_secret: "dev-access-secret".to_string(),
                refresh_token_secret: "dev-refresh-secret".to_string(),
                access_token_ttl_minutes: 15,
                refresh_token_ttl_days: 7,
                secure_cookies: false,
                admin_api_key: Some("dev-admin-key".to_string()),
                bcrypt_cost: 4,
            },
            storage: StorageConfig::with_backend(MediaBackend::Memory),
            payment: PaymentConfig::razorpay(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_upload_bytes: 200 * 1024 * 1024, // 200MB
                popular_default_limit: 20,
                popular_max_limit: 100,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                access_token_secret: String::new(),
                refresh_token_secret: String::new(),
                access_token_ttl_minutes: 15,
                refresh_token_ttl_days: 7,
                secure_cookies: true,
                admin_api_key: None,
                bcrypt_cost: 10,
            },
            storage: StorageConfig::with_backend(MediaBackend::Supabase),
            payment: PaymentConfig::razorpay(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_upload_bytes: 200 * 1024 * 1024, // 200MB
                popular_default_limit: 20,
                popular_max_limit: 100,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                access_token_secret: String::new(),
                refresh_token_secret: String::new(),
                access_token_ttl_minutes: 15,
                refresh_token_ttl_days: 7,
                secure_cookies: true,
                admin_api_key: None,
                bcrypt_cost: 10,
            },
            storage: StorageConfig::with_backend(MediaBackend::Supabase),
            payment: PaymentConfig::razorpay(),
        }
    }
}

impl StorageConfig {
    fn with_backend(backend: MediaBackend) -> Self {
        Self {
            backend,
            supabase_url: None,
            supabase_service_key: None,
            profile_image_bucket: "profile-images".to_string(),
            cover_image_bucket: "cover-images".to_string(),
            thumbnail_bucket: "thumbnails".to_string(),
            video_bucket: "course-videos".to_string(),
        }
    }
}

impl PaymentConfig {
    fn razorpay() -> Self {
        Self {
            razorpay_key_id: None,
            razorpay_key_secret: None,
            currency: "INR".to_string(),
            api_base: "https://api.razorpay.com/v1".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
