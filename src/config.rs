use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Lifetime of presigned upload URLs
    pub upload_url_expiry_secs: u32,
    /// Upper bound on keys per listing page; the store default applies when unset
    pub list_max_keys: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    pub index_id: Option<String>,
    pub data_source_id: Option<String>,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub sync_poll_interval_secs: u64,
    pub delete_concurrency: usize,
}

pub const DEFAULT_UPLOAD_URL_EXPIRY_SECS: u32 = 300;
pub const DEFAULT_SYNC_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_DELETE_CONCURRENCY: usize = 4;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let region = env::var("S3_REGION")
            .or_else(|_| env::var("AWS_REGION"))
            .unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .context("PORT must be a port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                log_dir: env::var("LOG_DIR").ok(),
            },
            storage: StorageConfig {
                bucket: env::var("BUCKET").context("BUCKET must be set")?,
                region: region.clone(),
                endpoint: env::var("S3_ENDPOINT").ok(),
                access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
                upload_url_expiry_secs: env::var("UPLOAD_URL_EXPIRY_SECS")
                    .unwrap_or_else(|_| DEFAULT_UPLOAD_URL_EXPIRY_SECS.to_string())
                    .parse()?,
                list_max_keys: env::var("LIST_MAX_KEYS")
                    .ok()
                    .map(|v| v.parse())
                    .transpose()?,
            },
            index: IndexConfig {
                index_id: env::var("KENDRA_INDEX_ID").ok(),
                data_source_id: env::var("KENDRA_DATA_SOURCE_ID").ok(),
                region: env::var("KENDRA_REGION").unwrap_or(region),
            },
            console: ConsoleConfig::from_env()?,
        })
    }
}

impl ConsoleConfig {
    /// Console settings alone; the CLI does not need bucket credentials.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            sync_poll_interval_secs: env::var("SYNC_POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| DEFAULT_SYNC_POLL_INTERVAL_SECS.to_string())
                .parse()?,
            delete_concurrency: env::var("DELETE_CONCURRENCY")
                .unwrap_or_else(|_| DEFAULT_DELETE_CONCURRENCY.to_string())
                .parse()?,
        })
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            sync_poll_interval_secs: DEFAULT_SYNC_POLL_INTERVAL_SECS,
            delete_concurrency: DEFAULT_DELETE_CONCURRENCY,
        }
    }
}
