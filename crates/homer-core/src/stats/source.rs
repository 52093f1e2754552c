// The seam between the fetchers and the external statistics provider.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{LeaderboardRow, PlayerId, PlayerStatus, ReportingWindow};

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("response is missing `{0}`")]
    MissingField(&'static str),
}

/// A provider of player home-run statistics.
///
/// Every method maps to one external call. Implementations report failures
/// as `StatsError`; converting those into default values is the fetchers'
/// job, not the source's.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Look up the source's identifier for a player name. `Ok(None)` when
    /// the name matches nobody.
    async fn search_player(&self, query: &str) -> Result<Option<PlayerId>, StatsError>;

    /// Home runs over the whole reporting window.
    async fn season_home_runs(
        &self,
        id: PlayerId,
        window: ReportingWindow,
    ) -> Result<u32, StatsError>;

    /// Home runs between `start` and `end`, inclusive.
    async fn date_range_home_runs(
        &self,
        id: PlayerId,
        window: ReportingWindow,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u32, StatsError>;

    /// Home runs over the player's last `games` games.
    async fn last_games_home_runs(
        &self,
        id: PlayerId,
        window: ReportingWindow,
        games: u32,
    ) -> Result<u32, StatsError>;

    /// Home runs per calendar month (1-12).
    async fn monthly_home_runs(
        &self,
        id: PlayerId,
        window: ReportingWindow,
    ) -> Result<BTreeMap<u32, u32>, StatsError>;

    /// Current roster status.
    async fn roster_status(&self, id: PlayerId) -> Result<PlayerStatus, StatsError>;

    /// Top `limit` home-run hitters at a position, in the source's order.
    async fn home_run_leaders(
        &self,
        position: &str,
        window: ReportingWindow,
        limit: u32,
    ) -> Result<Vec<LeaderboardRow>, StatsError>;
}
