use crate::gateway::QueryDefaults;
use anyhow::{anyhow, Context, Result};
use firewatch_upstream::firms::{DEFAULT_FIRMS_URL, MAX_DAY_RANGE, MIN_DAY_RANGE};
use firewatch_upstream::http::DEFAULT_USER_AGENT;
use firewatch_upstream::nominatim::{DEFAULT_NOMINATIM_URL, DEFAULT_POLYGON_THRESHOLD};
use firewatch_upstream::{FirmsSource, MapKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/firewatch/config.toml";
pub const MAP_KEY_ENV: &str = "FIRMS_MAP_KEY";
pub const LISTEN_ENV: &str = "FIREWATCH_LISTEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub firms: FirmsConfig,
    pub nominatim: NominatimConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirmsConfig {
    pub base_url: String,
    pub map_key: Option<String>,
    pub sources: Vec<String>,
    pub default_days: u8,
    pub timeout_secs: u64,
}

impl Default for FirmsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FIRMS_URL.to_string(),
            map_key: None,
            sources: FirmsSource::DEFAULTS
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            default_days: 9,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NominatimConfig {
    pub base_url: String,
    pub user_agent: String,
    pub polygon_threshold: f64,
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            polygon_threshold: DEFAULT_POLYGON_THRESHOLD,
            timeout_secs: 20,
        }
    }
}

/// Expand `~` and environment variables in a config path.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML configuration: {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the given file, or the default location when `path` is `None`.
    /// A missing default file means built-in defaults, a missing explicit file is an error.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(&expand_path(path)),
            None => {
                let default_path = expand_path(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load_from_file(&default_path)
                } else {
                    debug!("No config at {}, using defaults", default_path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply `FIRMS_MAP_KEY` and `FIREWATCH_LISTEN` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(MAP_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.firms.map_key = Some(key);
        }
        if let Some(listen) = lookup(LISTEN_ENV).filter(|l| !l.trim().is_empty()) {
            self.server.listen = listen;
        }
    }

    pub fn map_key(&self) -> Result<MapKey> {
        let key = self.firms.map_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No FIRMS map key configured. Set {} or [firms] map_key, \
                 keys are issued at https://firms.modaps.eosdis.nasa.gov/api/map_key/",
                MAP_KEY_ENV
            )
        })?;
        MapKey::parse(key).map_err(|e| anyhow!("{}", e))
    }

    pub fn sources(&self) -> Result<Vec<FirmsSource>> {
        let mut sources = Vec::new();
        for name in &self.firms.sources {
            let source = FirmsSource::from_str(name)
                .ok_or_else(|| anyhow!("Unknown FIRMS source in configuration: {}", name))?;
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        if sources.is_empty() {
            return Err(anyhow!("At least one FIRMS source must be configured"));
        }
        Ok(sources)
    }

    pub fn query_defaults(&self) -> Result<QueryDefaults> {
        Ok(QueryDefaults {
            days: self.firms.default_days,
            sources: self.sources()?,
        })
    }

    /// Check everything the gateway needs before it starts serving.
    pub fn validate(&self) -> Result<()> {
        self.map_key()?;
        self.sources()?;
        if !(MIN_DAY_RANGE..=MAX_DAY_RANGE).contains(&self.firms.default_days) {
            return Err(anyhow!(
                "firms.default_days must be between {} and {}, got {}",
                MIN_DAY_RANGE,
                MAX_DAY_RANGE,
                self.firms.default_days
            ));
        }
        if self.nominatim.user_agent.trim().is_empty() {
            return Err(anyhow!("nominatim.user_agent must not be empty"));
        }
        if self.firms.timeout_secs == 0 || self.nominatim.timeout_secs == 0 {
            return Err(anyhow!("upstream timeouts must be at least one second"));
        }
        Ok(())
    }
}
