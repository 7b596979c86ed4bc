//! Configuration module

use std::env;
use std::time::Duration;

use validator::Validate;

/// Default backend URL (dashboard API)
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default transport timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Default dispatch timeout (seconds)
pub const DEFAULT_DISPATCH_TIMEOUT: u64 = 15;

/// Default audit log refresh interval (seconds)
pub const DEFAULT_AUDIT_REFRESH_INTERVAL: u64 = 30;

/// Default device status poll interval (seconds)
pub const DEFAULT_DEVICE_POLL_INTERVAL: u64 = 60;

/// Console configuration
#[derive(Debug, Clone, Validate)]
pub struct Config {
    /// Backend base URL
    #[validate(url)]
    pub api_url: String,

    /// Session cookie from the login layer (`session=...`)
    pub session_cookie: Option<String>,

    /// Transport-level timeout in seconds
    #[validate(range(min = 1, max = 3600))]
    pub request_timeout_secs: u64,

    /// Upper bound on a single dispatch, in seconds
    #[validate(range(min = 1, max = 3600))]
    pub dispatch_timeout_secs: u64,

    /// Audit log refresh period in seconds
    #[validate(range(min = 1, max = 3600))]
    pub audit_refresh_secs: u64,

    /// Device status poll period in seconds
    #[validate(range(min = 1, max = 3600))]
    pub device_poll_secs: u64,

    /// Device whose view is mounted at startup
    pub device_id: Option<String>,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_cookie: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT,
            dispatch_timeout_secs: DEFAULT_DISPATCH_TIMEOUT,
            audit_refresh_secs: DEFAULT_AUDIT_REFRESH_INTERVAL,
            device_poll_secs: DEFAULT_DEVICE_POLL_INTERVAL,
            device_id: None,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("CONSOLE_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),

            session_cookie: env::var("CONSOLE_SESSION_COOKIE")
                .ok()
                .filter(|c| !c.trim().is_empty()),

            request_timeout_secs: secs_from_env("CONSOLE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT),

            dispatch_timeout_secs: secs_from_env("CONSOLE_DISPATCH_TIMEOUT_SECS", DEFAULT_DISPATCH_TIMEOUT),

            audit_refresh_secs: secs_from_env("CONSOLE_AUDIT_REFRESH_SECS", DEFAULT_AUDIT_REFRESH_INTERVAL),

            device_poll_secs: secs_from_env("CONSOLE_DEVICE_POLL_SECS", DEFAULT_DEVICE_POLL_INTERVAL),

            device_id: env::var("CONSOLE_DEVICE_ID")
                .ok()
                .filter(|d| !d.trim().is_empty()),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn audit_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.audit_refresh_secs)
    }

    pub fn device_poll_interval(&self) -> Duration {
        Duration::from_secs(self.device_poll_secs)
    }
}

fn secs_from_env(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
