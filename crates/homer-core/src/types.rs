// Shared domain types: reporting windows, per-player metrics, and the
// derived tables produced by the aggregation pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::roster::RosterEntry;

// ---------------------------------------------------------------------------
// Reporting window
// ---------------------------------------------------------------------------

/// Which part of the season a statistic is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    /// Spring training (preseason) games.
    Spring,
    /// Regular season games.
    Regular,
}

impl GameType {
    /// Game type code understood by the MLB Stats API.
    pub fn api_code(&self) -> &'static str {
        match self {
            GameType::Spring => "S",
            GameType::Regular => "R",
        }
    }

    /// Human-readable phase label.
    pub fn label(&self) -> &'static str {
        match self {
            GameType::Spring => "Spring Training",
            GameType::Regular => "Regular Season",
        }
    }

    /// Parse a phase name as written in config or on the command line.
    pub fn from_str_phase(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "spring" | "pre" | "preseason" | "s" => Some(GameType::Spring),
            "regular" | "reg" | "r" => Some(GameType::Regular),
            _ => None,
        }
    }
}

/// The season/year and game type a statistic is reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub season: i32,
    pub game_type: GameType,
}

impl ReportingWindow {
    pub fn new(season: i32, game_type: GameType) -> Self {
        Self { season, game_type }
    }

    pub fn regular(season: i32) -> Self {
        Self::new(season, GameType::Regular)
    }

    pub fn spring(season: i32) -> Self {
        Self::new(season, GameType::Spring)
    }
}

impl fmt::Display for ReportingWindow {
    /// Renders as `2026REG` / `2026PRE`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.game_type {
            GameType::Spring => "PRE",
            GameType::Regular => "REG",
        };
        write!(f, "{}{}", self.season, suffix)
    }
}

// ---------------------------------------------------------------------------
// Player identity and status
// ---------------------------------------------------------------------------

/// Numeric player identifier assigned by the stats source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const HEADSHOT_URL_PREFIX: &str = "https://securea.mlb.com/mlb/images/players/head_shot";

impl PlayerId {
    /// Headshot URL for this player. The image is not checked for existence.
    pub fn photo_url(&self) -> String {
        format!("{HEADSHOT_URL_PREFIX}/{}.jpg", self.0)
    }
}

/// Roster status reported by the stats source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerStatus {
    Active,
    Injured,
    #[default]
    Unknown,
}

impl PlayerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PlayerStatus::Active => "Active",
            PlayerStatus::Injured => "Injured",
            PlayerStatus::Unknown => "Unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// A metric tracked per player. The three home-run totals can also serve as
/// the primary metric for standings and head-to-head scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    /// Home runs over the whole reporting window.
    SeasonTotal,
    /// Home runs over the last 7 days.
    RecentWindow,
    /// Home runs over the last 15 games.
    ShortWindow,
    /// Home runs split by calendar month.
    Monthly,
    /// Roster status.
    Status,
}

impl Metric {
    /// Every metric, in fetch order.
    pub const ALL: [Metric; 5] = [
        Metric::SeasonTotal,
        Metric::RecentWindow,
        Metric::ShortWindow,
        Metric::Monthly,
        Metric::Status,
    ];

    /// Numeric value of this metric for a player. Non-scalar metrics
    /// (monthly split, status) contribute the monthly sum and zero.
    pub fn value(&self, metrics: &PlayerMetrics) -> u32 {
        match self {
            Metric::SeasonTotal => metrics.season_total,
            Metric::RecentWindow => metrics.recent_window_total,
            Metric::ShortWindow => metrics.short_window_total,
            Metric::Monthly => metrics.monthly_totals.values().sum(),
            Metric::Status => 0,
        }
    }

    /// Parse a primary metric name (`season`, `week`, `last15`).
    pub fn from_str_primary(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "season" | "hr" => Some(Metric::SeasonTotal),
            "week" | "7d" | "recent" => Some(Metric::RecentWindow),
            "last15" | "15g" | "short" => Some(Metric::ShortWindow),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::SeasonTotal => "HR",
            Metric::RecentWindow => "HR (7d)",
            Metric::ShortWindow => "HR (15g)",
            Metric::Monthly => "HR by month",
            Metric::Status => "Status",
        }
    }
}

/// Home-run metrics for one player in one reporting window.
///
/// A failed or missing sub-fetch leaves its field at the default (zero,
/// empty, or `Unknown`) and records the metric in `defaulted`, so callers
/// can distinguish a real zero from a fetch failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerMetrics {
    pub season_total: u32,
    pub recent_window_total: u32,
    pub short_window_total: u32,
    pub status: PlayerStatus,
    /// Month number (1-12) to home runs hit that month.
    pub monthly_totals: BTreeMap<u32, u32>,
    pub photo_url: Option<String>,
    pub defaulted: BTreeSet<Metric>,
}

impl PlayerMetrics {
    /// The default returned when the player could not be resolved at all.
    pub fn unresolved() -> Self {
        Self {
            defaulted: Metric::ALL.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Whether the given metric came from the source rather than a default.
    pub fn is_fetched(&self, metric: Metric) -> bool {
        !self.defaulted.contains(&metric)
    }
}

// ---------------------------------------------------------------------------
// Derived tables
// ---------------------------------------------------------------------------

/// A roster entry with its metrics attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRow {
    pub entry: RosterEntry,
    pub metrics: PlayerMetrics,
}

/// All rows for one manager, in roster order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamView {
    pub manager: String,
    pub rows: Vec<PlayerRow>,
}

impl TeamView {
    /// Sum of `metric` over every player on the team.
    pub fn total(&self, metric: Metric) -> u32 {
        self.rows.iter().map(|r| metric.value(&r.metrics)).sum()
    }
}

/// One line of the standings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsRow {
    pub manager: String,
    pub total: u32,
}

/// One side of a head-to-head row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MatchupCell {
    Player { name: String, value: u32 },
    /// No counterpart for this position slot on this side.
    Placeholder,
}

impl MatchupCell {
    pub const PLACEHOLDER_TEXT: &'static str = "-";

    pub fn name(&self) -> &str {
        match self {
            MatchupCell::Player { name, .. } => name,
            MatchupCell::Placeholder => Self::PLACEHOLDER_TEXT,
        }
    }

    pub fn value_text(&self) -> String {
        match self {
            MatchupCell::Player { value, .. } => value.to_string(),
            MatchupCell::Placeholder => Self::PLACEHOLDER_TEXT.to_string(),
        }
    }
}

/// One position slot compared across two teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchupRow {
    pub position: String,
    /// 0-based occurrence of this position within each team.
    pub slot: usize,
    pub left: MatchupCell,
    pub right: MatchupCell,
}

/// Result of comparing two teams slot by slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadToHead {
    pub rows: Vec<MatchupRow>,
    pub score: (u32, u32),
}

/// One entry of a positional home-run leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub player: String,
    pub team: String,
    pub value: u32,
    pub photo_url: Option<String>,
}

/// Month number to manager to home runs. Sparse: months or managers with
/// no contributions are absent rather than zero.
pub type MonthlySeries = BTreeMap<u32, BTreeMap<String, u32>>;
