// Dashboard: wires config, roster, fetchers and pipeline into the views the
// front end renders.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::pipeline;
use crate::resolver::NameResolver;
use crate::roster::{RosterError, RosterLoader};
use crate::stats::{LeaderboardFetcher, MlbStatsClient, StatFetcher, StatsSource};
use crate::types::{
    HeadToHead, LeaderboardRow, Metric, MonthlySeries, PlayerRow, ReportingWindow, StandingsRow,
    TeamView,
};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("unknown manager: {0}")]
    UnknownManager(String),
}

/// Everything derived from one roster load for one reporting window.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub window: ReportingWindow,
    pub views: Vec<TeamView>,
    /// Standings by season total.
    pub standings: Vec<StandingsRow>,
    pub monthly: MonthlySeries,
    /// Best season total across the league and the manager who drafted them.
    pub steal: Option<(String, PlayerRow)>,
}

impl Snapshot {
    /// Standings under a metric other than the season total.
    pub fn standings_by(&self, metric: Metric) -> Vec<StandingsRow> {
        pipeline::standings(&self.views, metric)
    }

    pub fn team(&self, manager: &str) -> Option<&TeamView> {
        pipeline::find_team(&self.views, manager)
    }

    pub fn managers(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|v| v.manager.as_str())
    }
}

pub struct Dashboard {
    config: Config,
    resolver: NameResolver,
    roster: RosterLoader,
    stats: StatFetcher,
    leaderboard: LeaderboardFetcher,
}

impl Dashboard {
    /// Build a dashboard backed by the MLB Stats API at the configured URL.
    pub fn from_config(config: Config) -> Self {
        let client = MlbStatsClient::new(
            config.stats.base_url.clone(),
            config.stats.request_timeout(),
        );
        Self::with_source(config, Arc::new(client))
    }

    /// Build a dashboard over any stats source.
    pub fn with_source(config: Config, source: Arc<dyn StatsSource>) -> Self {
        let stats_ttl = config.cache.stats_ttl();
        let http = reqwest::Client::builder()
            .timeout(config.stats.request_timeout())
            .build()
            .unwrap_or_default();
        let roster = RosterLoader::new(
            config.roster_source.clone(),
            http,
            config.cache.roster_ttl(),
        );
        Self {
            resolver: NameResolver::new(config.aliases.clone()),
            roster,
            stats: StatFetcher::new(Arc::clone(&source), stats_ttl),
            leaderboard: LeaderboardFetcher::new(source, stats_ttl),
            config,
        }
    }

    /// Replace the stat fetcher's clock.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.stats = self.stats.with_today(today);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The configured season, in the phase that applies on `today`.
    pub fn active_window(&self, today: NaiveDate) -> ReportingWindow {
        ReportingWindow::new(self.config.league.season, self.config.phase_on(today))
    }

    /// Load the roster and derive every table for `window`.
    pub async fn snapshot(&self, window: ReportingWindow) -> Result<Snapshot, RosterError> {
        let roster = self.roster.load().await?;
        let views = pipeline::build_team_views(
            &self.stats,
            &self.resolver,
            &roster,
            window,
            self.config.stats.concurrency,
        )
        .await;

        let standings = pipeline::standings(&views, Metric::SeasonTotal);
        let monthly = pipeline::monthly_series(&views);
        let steal = pipeline::draft_steal(&views, Metric::SeasonTotal)
            .map(|(manager, row)| (manager.to_string(), row.clone()));

        Ok(Snapshot {
            window,
            views,
            standings,
            monthly,
            steal,
        })
    }

    /// The current roster scored against another season, same game type as
    /// `window`.
    pub async fn simulate_year(
        &self,
        window: ReportingWindow,
        season: i32,
    ) -> Result<Snapshot, RosterError> {
        info!("Simulating roster against season {season}");
        self.snapshot(ReportingWindow::new(season, window.game_type))
            .await
    }

    /// Position-by-position comparison of two managers' teams.
    pub fn head_to_head(
        &self,
        snapshot: &Snapshot,
        a: &str,
        b: &str,
        metric: Metric,
    ) -> Result<HeadToHead, DashboardError> {
        let team_a = snapshot
            .team(a)
            .ok_or_else(|| DashboardError::UnknownManager(a.to_string()))?;
        let team_b = snapshot
            .team(b)
            .ok_or_else(|| DashboardError::UnknownManager(b.to_string()))?;
        Ok(pipeline::head_to_head(team_a, team_b, metric))
    }

    /// League-wide leaders at `position`, limited to the configured size.
    pub async fn leaders(&self, position: &str, window: ReportingWindow) -> Vec<LeaderboardRow> {
        self.leaderboard
            .top_n(position, window, self.config.stats.leaderboard_limit)
            .await
    }

    /// Discard every cached roster, player and leaderboard entry.
    pub fn refresh(&self) {
        self.roster.refresh();
        self.stats.refresh();
        self.leaderboard.refresh();
        info!("Dashboard caches cleared");
    }
}
