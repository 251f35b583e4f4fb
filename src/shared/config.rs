use super::error::AppError;
use serde::{Deserialize, Serialize};
use std::{env, fmt, str::FromStr};

/// 実行ターゲット（Web / モバイル）
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Web,
    Mobile,
}

impl Platform {
    /// `x-trpc-source` ヘッダーに載せる値
    pub fn trpc_source(&self) -> &'static str {
        match self {
            Platform::Web => "nextjs-react",
            Platform::Mobile => "expo-react",
        }
    }

    pub fn has_soft_keyboard(&self) -> bool {
        matches!(self, Platform::Mobile)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Web => f.write_str("web"),
            Platform::Mobile => f.write_str("mobile"),
        }
    }
}

impl FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "web" | "nextjs" => Ok(Platform::Web),
            "mobile" | "expo" | "ios" | "android" => Ok(Platform::Mobile),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub platform: Platform,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub migrations_dir: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub stale_time_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
                auth_token: None,
                request_timeout: 30,
            },
            database: DatabaseConfig {
                url: None,
                migrations_dir: "migrations".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            cache: CacheConfig {
                stale_time_ms: 30 * 1000,
            },
            platform: Platform::Web,
        }
    }
}

impl DatabaseConfig {
    /// 接続文字列を取り出す。未設定なら致命的な設定エラー
    pub fn require_url(&self) -> Result<&str, AppError> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::ConfigurationError("DATABASE_URL is not defined".to_string()))
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = env::var("DATABASE_URL") {
            cfg.database.url = non_empty(&v);
        }
        if let Ok(v) = env::var("POSTFEED_MIGRATIONS_DIR")
            && let Some(dir) = non_empty(&v)
        {
            cfg.database.migrations_dir = dir;
        }
        if let Ok(v) = env::var("POSTFEED_DB_MAX_CONNECTIONS")
            && let Some(value) = parse_u32(&v)
        {
            cfg.database.max_connections = value.max(1);
        }

        if let Ok(v) = env::var("POSTFEED_API_URL")
            && let Some(url) = non_empty(&v)
        {
            cfg.api.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("POSTFEED_AUTH_TOKEN") {
            cfg.api.auth_token = non_empty(&v);
        }
        if let Ok(v) = env::var("POSTFEED_REQUEST_TIMEOUT_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.api.request_timeout = value.max(1);
        }

        if let Ok(v) = env::var("POSTFEED_STALE_TIME_MS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.cache.stale_time_ms = value;
        }

        if let Ok(v) = env::var("POSTFEED_PLATFORM")
            && let Ok(platform) = v.parse::<Platform>()
        {
            cfg.platform = platform;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api.base_url.trim().is_empty() {
            return Err("API base_url must not be empty".to_string());
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(format!(
                "API base_url must be an http(s) URL: {}",
                self.api.base_url
            ));
        }
        if self.api.request_timeout == 0 {
            return Err("API request_timeout must be greater than 0".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.database.migrations_dir.trim().is_empty() {
            return Err("Database migrations_dir must not be empty".to_string());
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.platform, Platform::Web);
        assert!(cfg.database.url.is_none());
    }

    #[test]
    fn require_url_rejects_missing_and_blank() {
        let mut db = AppConfig::default().database;
        let err = db.require_url().unwrap_err();
        assert_eq!(
            err,
            AppError::ConfigurationError("DATABASE_URL is not defined".to_string())
        );

        db.url = Some("   ".to_string());
        assert!(db.require_url().is_err());

        db.url = Some("postgres://localhost/posts".to_string());
        assert_eq!(db.require_url().unwrap(), "postgres://localhost/posts");
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let mut cfg = AppConfig::default();
        cfg.api.base_url = "ftp://example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn platform_parses_aliases() {
        assert_eq!("expo".parse::<Platform>(), Ok(Platform::Mobile));
        assert_eq!("Web".parse::<Platform>(), Ok(Platform::Web));
        assert!("desktop".parse::<Platform>().is_err());
        assert_eq!(Platform::Mobile.trpc_source(), "expo-react");
        assert!(!Platform::Web.has_soft_keyboard());
    }
}
