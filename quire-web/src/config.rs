use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use quire_core::password::HashParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_JWT_SECRET: &str = "change-this-secret-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `development` or `production`
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Inferred from `base_url` when unset
    #[serde(default)]
    pub use_https: Option<bool>,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: i64,

    #[serde(default = "default_site_name")]
    pub site_name: String,

    #[serde(default = "default_site_description")]
    pub site_description: String,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,

    #[serde(default = "default_sitemap_path")]
    pub sitemap_path: String,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub csrf: CsrfConfig,

    #[serde(default)]
    pub password: HashParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_auth_requests_per_minute")]
    pub auth_requests_per_minute: u32,
    #[serde(default = "default_api_requests_per_minute")]
    pub api_requests_per_minute: u32,
    /// Key clients on `X-Forwarded-For`/`X-Real-IP`. Only safe behind a proxy that overwrites them.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfConfig {
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            use_https: None,
            database_url: default_database_url(),
            jwt_secret: default_jwt_secret(),
            jwt_expiration_hours: default_jwt_expiration_hours(),
            site_name: default_site_name(),
            site_description: default_site_description(),
            upload_dir: default_upload_dir(),
            max_upload_size: default_max_upload_size(),
            sitemap_path: default_sitemap_path(),
            rate_limit: RateLimitConfig::default(),
            csrf: CsrfConfig::default(),
            password: HashParams::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            auth_requests_per_minute: default_auth_requests_per_minute(),
            api_requests_per_minute: default_api_requests_per_minute(),
            trust_proxy_headers: false,
        }
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
            exempt_paths: default_exempt_paths(),
        }
    }
}

impl Config {
    /// Load from `quire.toml`, then `QUIRE_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `QUIRE_RATE_LIMIT__AUTH_REQUESTS_PER_MINUTE`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("quire.toml"))
                .merge(Env::prefixed("QUIRE_").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: Config = figment.extract()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }

    pub fn uses_https(&self) -> bool {
        self.use_https
            .unwrap_or_else(|| self.base_url.starts_with("https://"))
    }

    /// Cookies carry the Secure flag behind HTTPS and always in production
    pub fn cookie_secure(&self) -> bool {
        self.uses_https() || self.is_production()
    }

    /// `None` means any origin is allowed
    pub fn allowed_origins(&self) -> Option<Vec<String>> {
        if self.is_production() {
            Some(vec![self.base_url.trim_end_matches('/').to_string()])
        } else {
            None
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn jwt_expiration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt_expiration_hours)
    }

    pub fn csrf_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.csrf.token_ttl_hours)
    }

    pub fn csrf_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.csrf.sweep_interval_secs)
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_database_url() -> String {
    "sqlite:quire.db".to_string()
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_jwt_expiration_hours() -> i64 {
    24
}

fn default_site_name() -> String {
    "Quire".to_string()
}

fn default_site_description() -> String {
    "Pages built from reusable components".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_size() -> usize {
    10 * 1024 * 1024
}

fn default_sitemap_path() -> String {
    "static/sitemap.xml".to_string()
}

fn default_auth_requests_per_minute() -> u32 {
    5
}

fn default_api_requests_per_minute() -> u32 {
    60
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_exempt_paths() -> Vec<String> {
    vec!["/api/auth/login".to_string(), "/api/auth/register".to_string()]
}
