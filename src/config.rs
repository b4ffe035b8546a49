use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Rows per result page. Fixed; the persisted snapshot and the offset
/// arithmetic both assume it.
pub const PAGE_SIZE: u32 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub ncbi: NcbiConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Where the session controller finds the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
}

/// Upstream E-utilities settings used by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct NcbiConfig {
    pub base_url: String,
    pub db: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            client: ClientConfig {
                api_base_url: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
                timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            },
            ncbi: NcbiConfig {
                base_url: env::var("NCBI_BASE_URL")
                    .unwrap_or_else(|_| crate::search::NCBI_BASE.to_string()),
                db: env::var("NCBI_DB").unwrap_or_else(|_| "pubmed".to_string()),
                api_key: env::var("NCBI_API_KEY").ok().filter(|k| !k.is_empty()),
            },
            session: SessionConfig {
                dir: env::var("SESSION_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_session_dir()),
            },
        })
    }
}

/// XDG data directory, falling back to the working directory.
fn default_session_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pubmed-navigator")
}
