// Configuration loading and parsing (league.toml, aliases.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use crate::roster::RosterSource;
use crate::stats::mlb::MLB_STATS_API_URL;
use crate::types::GameType;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub roster_source: RosterSource,
    pub stats: StatsConfig,
    pub cache: CacheConfig,
    /// Roster display name -> stats-source query name.
    pub aliases: HashMap<String, String>,
}

impl Config {
    /// The game type implied by `today`: regular season from the configured
    /// start date on, spring training before it. A `phase` set in
    /// league.toml overrides the date check.
    pub fn phase_on(&self, today: NaiveDate) -> GameType {
        if let Some(phase) = self.league.phase {
            return phase;
        }
        if today >= self.league.regular_season_start {
            GameType::Regular
        } else {
            GameType::Spring
        }
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire league.toml file.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    roster: RosterSection,
    #[serde(default)]
    stats: StatsConfig,
    #[serde(default)]
    cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub season: i32,
    pub regular_season_start: NaiveDate,
    /// Force a season phase instead of deriving it from the date.
    #[serde(default)]
    pub phase: Option<GameType>,
}

#[derive(Debug, Clone, Deserialize)]
struct RosterSection {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Maximum player fetches in flight while building team views.
    pub concurrency: usize,
    pub leaderboard_limit: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            base_url: MLB_STATS_API_URL.to_string(),
            request_timeout_secs: 10,
            concurrency: 8,
            leaderboard_limit: 10,
        }
    }
}

impl StatsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub stats_ttl_secs: u64,
    pub roster_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stats_ttl_secs: 3600,
            roster_ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }

    pub fn roster_ttl(&self) -> Duration {
        Duration::from_secs(self.roster_ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// aliases.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
struct AliasesFile {
    #[serde(default)]
    aliases: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// (optionally) `config/aliases.toml`, both relative to `base_dir`.
///
/// A relative roster `path` is resolved against `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- aliases.toml (optional) ---
    let aliases_path = config_dir.join("aliases.toml");
    let aliases = if aliases_path.exists() {
        let text = read_file(&aliases_path)?;
        let file: AliasesFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: aliases_path.clone(),
            source: e,
        })?;
        file.aliases
    } else {
        HashMap::new()
    };

    let roster_source = roster_source(&league_file.roster, base_dir)?;

    let config = Config {
        league: league_file.league,
        roster_source,
        stats: league_file.stats,
        cache: league_file.cache,
        aliases,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Keep the user's copy.
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn roster_source(section: &RosterSection, base_dir: &Path) -> Result<RosterSource, ConfigError> {
    let path = section.path.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let url = section.url.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (path, url) {
        (Some(p), None) => {
            let p = Path::new(p);
            let resolved = if p.is_absolute() {
                p.to_path_buf()
            } else {
                base_dir.join(p)
            };
            Ok(RosterSource::File(resolved))
        }
        (None, Some(u)) => Ok(RosterSource::Url(u.to_string())),
        _ => Err(ConfigError::ValidationError {
            field: "roster".into(),
            message: "exactly one of `path` or `url` must be set".into(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.name".into(),
            message: "must not be empty".into(),
        });
    }

    let season = config.league.season;
    if !(1900..=2100).contains(&season) {
        return Err(ConfigError::ValidationError {
            field: "league.season".into(),
            message: format!("must be between 1900 and 2100, got {season}"),
        });
    }

    if config.stats.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "stats.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    let positive_fields: &[(&str, u64)] = &[
        ("stats.request_timeout_secs", config.stats.request_timeout_secs),
        ("stats.concurrency", config.stats.concurrency as u64),
        ("stats.leaderboard_limit", u64::from(config.stats.leaderboard_limit)),
        ("cache.stats_ttl_secs", config.cache.stats_ttl_secs),
        ("cache.roster_ttl_secs", config.cache.roster_ttl_secs),
    ];
    for (name, val) in positive_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
