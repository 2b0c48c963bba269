use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;
use tracing::debug;

use crate::language::Language;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    /// Defaults, then `.codecraterc`, then environment variables.
    pub fn load() -> Self {
        let config_path = default_config_path();
        let mut map = default_map();

        if config_path.exists() {
            match read_rc(&config_path) {
                Ok(entries) => map.extend(entries),
                Err(e) => debug!(path = %config_path.display(), error = %e, "Cannot read rc file"),
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    /// Built-in defaults overlaid with the given entries; ignores the rc file and environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        map.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { inner: map, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    /// Override a single key (used for CLI flags).
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
            .unwrap_or(false)
    }

    pub fn get_secs(&self, key: &str) -> Option<Duration> {
        self.get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Service base URL without a trailing slash.
    pub fn api_url(&self) -> String {
        let raw = self
            .get("CODECRATE_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        raw.trim().trim_end_matches('/').to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        self.get_secs("REQUEST_TIMEOUT").unwrap_or(Duration::from_secs(30))
    }

    pub fn health_timeout(&self) -> Duration {
        self.get_secs("HEALTH_TIMEOUT").unwrap_or(Duration::from_secs(5))
    }

    pub fn reprobe_on_execute(&self) -> bool {
        self.get_bool("REPROBE_ON_EXECUTE")
    }

    /// Initial language; unknown values fall back to Python.
    pub fn default_language(&self) -> Language {
        self.get("DEFAULT_LANGUAGE")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn log_level(&self) -> String {
        self.get("LOG_LEVEL").unwrap_or_else(|| "warn".into())
    }
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments.
pub fn parse_rc<R: BufRead>(reader: R) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in reader.lines().map_while(Result::ok) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            map.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    map
}

fn read_rc(path: &Path) -> std::io::Result<HashMap<String, String>> {
    let file = fs::File::open(path)?;
    Ok(parse_rc(BufReader::new(file)))
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "REQUEST_TIMEOUT",
        "HEALTH_TIMEOUT",
        "REPROBE_ON_EXECUTE",
        "DEFAULT_LANGUAGE",
        "LOG_LEVEL",
    ];

    KEYS.contains(&k) || k.starts_with("CODECRATE_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("codecrate").join(".codecraterc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("CODECRATE_API_URL".into(), DEFAULT_API_URL.into());
    m.insert("REQUEST_TIMEOUT".into(), "30".into());
    m.insert("HEALTH_TIMEOUT".into(), "5".into());
    m.insert("REPROBE_ON_EXECUTE".into(), "false".into());
    m.insert("DEFAULT_LANGUAGE".into(), "py".into());
    m.insert("LOG_LEVEL".into(), "warn".into());
    m
}
