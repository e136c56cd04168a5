use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub messaging: MessagingConfig,
    pub uploads: UploadsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Session validation settings.
///
/// Sessions are issued by the portal's auth service as HS256 JWTs; this
/// service only validates them.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_leeway: Duration,
    /// Cookie consulted when no `Authorization` header is present
    pub session_cookie_name: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Message store and delivery settings
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// Page size used when a list request carries no `limit`
    pub default_page_size: i64,
    /// Hard upper bound for `limit`
    pub max_page_size: i64,
    /// Maximum message length in characters (after trimming)
    pub max_content_length: usize,
    /// Buffered events per subscriber before it is considered lagging
    pub delivery_channel_capacity: usize,
    pub delivery_keepalive: Duration,
}

/// Upload asset settings (the upload backend itself lives elsewhere)
#[derive(Debug, Clone)]
pub struct UploadsConfig {
    /// Base URL prepended to an asset's storage path
    pub public_base_url: String,
    pub max_attachment_size: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            messaging: MessagingConfig::from_env()?,
            uploads: UploadsConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024; // 2MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 2;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;
    const DEFAULT_SESSION_COOKIE_NAME: &'static str = "session";

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "JWT_SECRET environment variable is required".to_string())?;

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        let session_cookie_name = env::var("SESSION_COOKIE_NAME")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_SESSION_COOKIE_NAME.to_string());

        Ok(Self {
            jwt_secret,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
            session_cookie_name,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Campus Messaging API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Direct messages, group feed and conversations for the e-learning portal".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl MessagingConfig {
    const DEFAULT_PAGE_SIZE: i64 = 100;
    const DEFAULT_MAX_PAGE_SIZE: i64 = 500;
    const DEFAULT_MAX_CONTENT_LENGTH: usize = 5000;
    const DEFAULT_DELIVERY_CHANNEL_CAPACITY: usize = 256;
    const DEFAULT_DELIVERY_KEEPALIVE_SECS: u64 = 15;

    pub fn from_env() -> Result<Self, String> {
        let default_page_size = env::var("MESSAGES_DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_PAGE_SIZE.to_string())
            .parse::<i64>()
            .map_err(|_| "MESSAGES_DEFAULT_PAGE_SIZE must be a valid number".to_string())?;

        let max_page_size = env::var("MESSAGES_MAX_PAGE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_PAGE_SIZE.to_string())
            .parse::<i64>()
            .map_err(|_| "MESSAGES_MAX_PAGE_SIZE must be a valid number".to_string())?;

        if default_page_size < 1 || max_page_size < default_page_size {
            return Err(
                "MESSAGES_DEFAULT_PAGE_SIZE must be >= 1 and <= MESSAGES_MAX_PAGE_SIZE".to_string(),
            );
        }

        let max_content_length = env::var("MESSAGE_MAX_CONTENT_LENGTH")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONTENT_LENGTH.to_string())
            .parse::<usize>()
            .map_err(|_| "MESSAGE_MAX_CONTENT_LENGTH must be a valid number".to_string())?;

        let delivery_channel_capacity = env::var("DELIVERY_CHANNEL_CAPACITY")
            .unwrap_or_else(|_| Self::DEFAULT_DELIVERY_CHANNEL_CAPACITY.to_string())
            .parse::<usize>()
            .map_err(|_| "DELIVERY_CHANNEL_CAPACITY must be a valid number".to_string())?;

        if delivery_channel_capacity == 0 {
            return Err("DELIVERY_CHANNEL_CAPACITY must be greater than zero".to_string());
        }

        let keepalive_secs = env::var("DELIVERY_KEEPALIVE_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_DELIVERY_KEEPALIVE_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DELIVERY_KEEPALIVE_SECS must be a valid number".to_string())?;

        Ok(Self {
            default_page_size,
            max_page_size,
            max_content_length,
            delivery_channel_capacity,
            delivery_keepalive: Duration::from_secs(keepalive_secs),
        })
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: Self::DEFAULT_PAGE_SIZE,
            max_page_size: Self::DEFAULT_MAX_PAGE_SIZE,
            max_content_length: Self::DEFAULT_MAX_CONTENT_LENGTH,
            delivery_channel_capacity: Self::DEFAULT_DELIVERY_CHANNEL_CAPACITY,
            delivery_keepalive: Duration::from_secs(Self::DEFAULT_DELIVERY_KEEPALIVE_SECS),
        }
    }
}

impl UploadsConfig {
    const DEFAULT_MAX_ATTACHMENT_SIZE: i64 = 50 * 1024 * 1024; // 50MB

    pub fn from_env() -> Result<Self, String> {
        let public_base_url = env::var("UPLOADS_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let max_attachment_size = env::var("MAX_ATTACHMENT_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_ATTACHMENT_SIZE.to_string())
            .parse::<i64>()
            .map_err(|_| "MAX_ATTACHMENT_SIZE must be a valid number".to_string())?;

        Ok(Self {
            public_base_url,
            max_attachment_size,
        })
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            max_attachment_size: Self::DEFAULT_MAX_ATTACHMENT_SIZE,
        }
    }
}
