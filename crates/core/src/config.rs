use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;
use reqwest::Url;

static DEFAULT_API_URL: &str = "http://localhost:5000";
static SESSION_FILE_NAME: &str = "session.json";
static ENV_API_URL: &str = "TASKDECK_API_URL";
static ENV_AUTH_ENABLED: &str = "TASKDECK_AUTH_ENABLED";
static ENV_DATA_DIR: &str = "TASKDECK_DATA_DIR";
static ENV_TIMEOUT_SECS: &str = "TASKDECK_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "taskdeck", "taskdeck"));

/// Values supplied on the command line; each one beats its environment variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub auth_enabled: Option<bool>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    api_url: Url,
    auth_enabled: bool,
    data_dir: PathBuf,
    session_path: PathBuf,
    request_timeout: Duration,
}

impl AppConfig {
    /// Construct [`AppConfig`] from overrides, the process environment, and platform
    /// defaults, creating the data directory when it does not exist yet.
    pub fn discover(overrides: ConfigOverrides) -> Result<Self> {
        let config = Self::resolve(overrides, |key| env::var(key).ok())?;
        if !config.data_dir.exists() {
            fs::create_dir_all(&config.data_dir).with_context(|| {
                format!(
                    "Failed to create data directory at {}",
                    config.data_dir.display()
                )
            })?;
        }
        Ok(config)
    }

    /// Resolve settings against an arbitrary variable source without touching the disk.
    pub fn resolve<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = overrides
            .api_url
            .or_else(|| lookup(ENV_API_URL))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = parse_api_url(&raw_url)?;

        let auth_enabled = match overrides.auth_enabled {
            Some(enabled) => enabled,
            None => lookup(ENV_AUTH_ENABLED)
                .map(|value| parse_flag(&value))
                .unwrap_or(false),
        };

        let request_timeout = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().with_context(|| {
                    format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'")
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let data_dir = resolve_data_dir(overrides.data_dir, &lookup)?;
        Ok(Self::new(api_url, auth_enabled, data_dir).with_request_timeout(request_timeout))
    }

    pub fn new(api_url: Url, auth_enabled: bool, data_dir: PathBuf) -> Self {
        let session_path = data_dir.join(SESSION_FILE_NAME);
        Self {
            api_url,
            auth_enabled,
            data_dir,
            session_path,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth_enabled
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid API URL '{raw}'"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("API URL '{}' cannot be used as a base", raw));
    }
    Ok(url)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn resolve_data_dir<F>(data_dir_override: Option<PathBuf>, lookup: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = data_dir_override {
        return Ok(dir);
    }

    if let Some(env_dir) = lookup(ENV_DATA_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.data_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".taskdeck"));
    }

    Ok(env::current_dir()?.join(".taskdeck"))
}
