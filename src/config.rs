// src/config.rs
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_TTL_SECS: u64 = 86400;
const DEFAULT_SWEEP_SECS: u64 = 300;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_MAX_DIMENSION: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub output_dir: PathBuf,
    pub output_ttl: Duration,
    pub sweep_interval: Duration,
    pub max_upload_bytes: usize,
    pub max_dimension: u32,
    pub font_path: Option<PathBuf>,
    /// Prefix for download links. Empty means links are relative to the host.
    pub public_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            output_dir: std::env::temp_dir().join("imgdrop"),
            output_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_dimension: DEFAULT_MAX_DIMENSION,
            font_path: None,
            public_url: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            bind_addr: lookup("IMGDROP_BIND").unwrap_or(defaults.bind_addr),
            output_dir: lookup("IMGDROP_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            output_ttl: Duration::from_secs(parse_or(
                &lookup,
                "IMGDROP_OUTPUT_TTL_SECS",
                DEFAULT_TTL_SECS,
            )?),
            sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                "IMGDROP_SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_SECS,
            )?),
            max_upload_bytes: parse_or(&lookup, "IMGDROP_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_dimension: parse_or(&lookup, "IMGDROP_MAX_DIMENSION", DEFAULT_MAX_DIMENSION)?,
            font_path: lookup("IMGDROP_FONT_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            public_url: lookup("IMGDROP_PUBLIC_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_default(),
        };

        if config.output_ttl.is_zero() {
            bail!("IMGDROP_OUTPUT_TTL_SECS must be greater than zero");
        }
        if config.sweep_interval.is_zero() {
            bail!("IMGDROP_SWEEP_INTERVAL_SECS must be greater than zero");
        }
        if config.max_dimension == 0 {
            bail!("IMGDROP_MAX_DIMENSION must be greater than zero");
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
