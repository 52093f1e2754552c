// Roster loading: manager -> player -> position table from a CSV file or a
// spreadsheet CSV export URL.
//
// Expected headers: Manager, Player, Position, MLB Team. Extra columns are
// ignored; rows with a blank manager or player are dropped.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::TtlCache;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One player on one manager's roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterEntry {
    pub manager: String,
    /// Player name as written in the roster sheet.
    pub player: String,
    /// Position label (e.g. `C`, `1B`, `OF`). May be empty.
    pub position: String,
    /// MLB team label as written in the sheet. May be empty.
    pub team: String,
}

/// Where the roster table is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSource {
    File(PathBuf),
    Url(String),
}

impl std::fmt::Display for RosterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterSource::File(path) => write!(f, "{}", path.display()),
            RosterSource::Url(url) => write!(f, "{url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to download roster from {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("CSV error in roster {origin}: {source}")]
    Csv { origin: String, source: csv::Error },

    #[error("roster validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV row (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawRosterRow {
    #[serde(default)]
    Manager: String,
    #[serde(default)]
    Player: String,
    #[serde(default)]
    Position: String,
    #[serde(default, rename = "MLB Team", alias = "Team")]
    MlbTeam: String,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn load_roster_from_reader<R: Read>(rdr: R) -> Result<Vec<RosterEntry>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);
    let mut entries = Vec::new();
    for (idx, result) in reader.deserialize::<RawRosterRow>().enumerate() {
        match result {
            Ok(raw) => {
                if raw.Manager.is_empty() || raw.Player.is_empty() {
                    debug!("dropping roster row {}: missing manager or player", idx + 1);
                    continue;
                }
                entries.push(RosterEntry {
                    manager: raw.Manager,
                    player: raw.Player,
                    position: raw.Position,
                    team: raw.MlbTeam,
                });
            }
            Err(e) => {
                warn!("skipping malformed roster row: {}", e);
            }
        }
    }
    Ok(entries)
}

/// Load a roster table from a CSV file on disk.
pub fn load_roster_file(path: &Path) -> Result<Vec<RosterEntry>, RosterError> {
    let file = std::fs::File::open(path).map_err(|e| RosterError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let entries = load_roster_from_reader(file).map_err(|e| RosterError::Csv {
        origin: path.display().to_string(),
        source: e,
    })?;
    non_empty(entries)
}

/// Parse a roster table from CSV text already in memory.
pub fn parse_roster_csv(text: &str, origin: &str) -> Result<Vec<RosterEntry>, RosterError> {
    let entries = load_roster_from_reader(text.as_bytes()).map_err(|e| RosterError::Csv {
        origin: origin.to_string(),
        source: e,
    })?;
    non_empty(entries)
}

fn non_empty(entries: Vec<RosterEntry>) -> Result<Vec<RosterEntry>, RosterError> {
    if entries.is_empty() {
        return Err(RosterError::Validation(
            "roster produced zero valid rows".into(),
        ));
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// RosterLoader
// ---------------------------------------------------------------------------

/// Reads the roster from its source, caching the parsed table for a short
/// TTL so sheet edits show up sooner than stat refreshes.
pub struct RosterLoader {
    source: RosterSource,
    http: reqwest::Client,
    cache: TtlCache<(), Vec<RosterEntry>>,
}

impl RosterLoader {
    pub fn new(source: RosterSource, http: reqwest::Client, ttl: Duration) -> Self {
        Self {
            source,
            http,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn source(&self) -> &RosterSource {
        &self.source
    }

    /// Load the roster, from cache when fresh. Failures are not cached.
    pub async fn load(&self) -> Result<Vec<RosterEntry>, RosterError> {
        self.cache
            .get_or_try_compute((), || self.load_uncached())
            .await
    }

    /// Drop the cached roster.
    pub fn refresh(&self) {
        self.cache.clear_all();
    }

    async fn load_uncached(&self) -> Result<Vec<RosterEntry>, RosterError> {
        let entries = match &self.source {
            RosterSource::File(path) => load_roster_file(path)?,
            RosterSource::Url(url) => {
                let text = self.download(url).await.map_err(|e| RosterError::Http {
                    url: url.clone(),
                    source: e,
                })?;
                parse_roster_csv(&text, url)?
            }
        };
        info!("Loaded {} roster rows from {}", entries.len(), self.source);
        Ok(entries)
    }

    async fn download(&self, url: &str) -> Result<String, reqwest::Error> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
