use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{env, fmt, str::FromStr};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Credentials and namespace for the Cloudinary account that stores project images.
#[derive(Deserialize, Clone)]
pub struct AssetStoreConfig {
    #[serde(default)]
    pub cloud_name: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub api_secret: String,

    #[serde(default = "default_asset_folder")]
    pub folder: String,

    #[serde(default = "default_asset_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_asset_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AssetStoreConfig {
    fn default() -> Self {
        AssetStoreConfig {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_asset_folder(),
            api_base_url: default_asset_api_base_url(),
            timeout_secs: default_asset_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_hours: i64,

    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    #[serde(default)]
    pub admin_password_hash: String,

    #[serde(default = "default_upload_max_bytes")]
    pub upload_max_bytes: usize,

    #[serde(default = "default_contact_rate_limit")]
    pub contact_rate_limit: u32,

    #[serde(default = "default_contact_rate_window")]
    pub contact_rate_window_secs: u64,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    #[serde(default)]
    pub asset_store: AssetStoreConfig,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-API".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_expiration() -> i64 {
    24
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_upload_max_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_contact_rate_limit() -> u32 {
    5
}
fn default_contact_rate_window() -> u64 {
    3600
}
fn default_asset_folder() -> String {
    "portfolio".to_string()
}
fn default_asset_api_base_url() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}
fn default_asset_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Conventional names used by hosting platforms and the Cloudinary SDKs
        config.database_url = fill_or_env(config.database_url, "DATABASE_URL");
        config.jwt_secret = fill_or_env(config.jwt_secret, "JWT_SECRET");
        config.asset_store.cloud_name = fill_or_env(config.asset_store.cloud_name, "CLOUDINARY_CLOUD_NAME");
        config.asset_store.api_key = fill_or_env(config.asset_store.api_key, "CLOUDINARY_API_KEY");
        config.asset_store.api_secret = fill_or_env(config.asset_store.api_secret, "CLOUDINARY_API_SECRET");

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty".into());
        }
        if self.jwt_secret.len() < 32 {
            errors.push("JWT_SECRET must be at least 32 characters".into());
        }
        if self.jwt_expiration_hours <= 0 {
            errors.push("jwt_expiration_hours must be positive".into());
        }
        if self.admin_username.trim().is_empty() {
            errors.push("admin_username cannot be empty".into());
        }
        if !self.admin_password_hash.starts_with("$argon2") {
            errors.push("admin_password_hash must be an argon2 hash (run `portfolio_api hash-password <password>`)".into());
        }
        if self.upload_max_bytes == 0 {
            errors.push("upload_max_bytes must be positive".into());
        }
        if self.contact_rate_limit == 0 || self.contact_rate_window_secs == 0 {
            errors.push("contact rate limit and window must be positive".into());
        }
        if self.asset_store.cloud_name.trim().is_empty()
            || self.asset_store.api_key.trim().is_empty()
            || self.asset_store.api_secret.trim().is_empty()
        {
            errors.push("Cloudinary cloud_name, api_key and api_secret must be set".into());
        }
        if let Err(e) = url::Url::parse(&self.asset_store.api_base_url) {
            errors.push(format!("asset_store.api_base_url is invalid: {e}"));
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fill_or_env(current: String, env_key: &str) -> String {
    if current.trim().is_empty() {
        env::var(env_key).unwrap_or_default()
    } else {
        current
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AssetStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetStoreConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key.redact())
            .field("api_secret", &self.api_secret.redact())
            .field("folder", &self.folder)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &self.jwt_secret.redact())
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("admin_username", &self.admin_username)
            .field("admin_password_hash", &self.admin_password_hash.redact())
            .field("upload_max_bytes", &self.upload_max_bytes)
            .field("contact_rate_limit", &self.contact_rate_limit)
            .field("contact_rate_window_secs", &self.contact_rate_window_secs)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("asset_store", &self.asset_store)
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for JwtKeys {
    fn from(config: &AppConfig) -> Self {
        let jwt_secret = Zeroizing::new(config.jwt_secret.clone());

        JwtKeys {
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}
