// Per-player metric fetching with compartmentalized failure handling.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, warn};

use super::source::{StatsError, StatsSource};
use crate::cache::TtlCache;
use crate::types::{Metric, PlayerMetrics, ReportingWindow};

/// Days covered by the recent-window total, including today.
pub const RECENT_WINDOW_DAYS: u32 = 7;

/// Games covered by the short-window total.
pub const SHORT_WINDOW_GAMES: u32 = 15;

type MetricsKey = (String, ReportingWindow);

/// Fetches `PlayerMetrics` for resolved player queries.
///
/// `fetch` never fails. If the player cannot be found, every field takes its
/// default. If the player is found, each sub-metric is fetched on its own and
/// a failure only defaults that one field.
pub struct StatFetcher {
    source: Arc<dyn StatsSource>,
    cache: TtlCache<MetricsKey, PlayerMetrics>,
    today: fn() -> NaiveDate,
}

impl StatFetcher {
    pub fn new(source: Arc<dyn StatsSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl),
            today: local_today,
        }
    }

    /// Override the clock used to place the recent-window date range.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Metrics for `player_query` in `window`, served from cache when fresh.
    pub async fn fetch(&self, player_query: &str, window: ReportingWindow) -> PlayerMetrics {
        let key = (player_query.to_string(), window);
        self.cache
            .get_or_compute(key, || self.fetch_uncached(player_query, window))
            .await
    }

    /// Drop every cached player entry.
    pub fn refresh(&self) {
        self.cache.clear_all();
    }

    async fn fetch_uncached(&self, player_query: &str, window: ReportingWindow) -> PlayerMetrics {
        let id = match self.source.search_player(player_query).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!(player = player_query, "no player id found, using defaults");
                return PlayerMetrics::unresolved();
            }
            Err(e) => {
                warn!(player = player_query, error = %e, "player lookup failed, using defaults");
                return PlayerMetrics::unresolved();
            }
        };

        let (start, end) = recent_range((self.today)(), window.season);
        let (season, recent, short, monthly, status) = tokio::join!(
            self.source.season_home_runs(id, window),
            self.source.date_range_home_runs(id, window, start, end),
            self.source.last_games_home_runs(id, window, SHORT_WINDOW_GAMES),
            self.source.monthly_home_runs(id, window),
            self.source.roster_status(id),
        );

        let mut defaulted = BTreeSet::new();
        let season_total = or_default(season, Metric::SeasonTotal, player_query, &mut defaulted);
        let recent_window_total =
            or_default(recent, Metric::RecentWindow, player_query, &mut defaulted);
        let short_window_total =
            or_default(short, Metric::ShortWindow, player_query, &mut defaulted);
        let monthly_totals = or_default(monthly, Metric::Monthly, player_query, &mut defaulted);
        let status = or_default(status, Metric::Status, player_query, &mut defaulted);

        debug!(
            player = player_query,
            %id,
            season_total,
            defaulted = defaulted.len(),
            "fetched player metrics"
        );

        PlayerMetrics {
            season_total,
            recent_window_total,
            short_window_total,
            status,
            monthly_totals,
            photo_url: Some(id.photo_url()),
            defaulted,
        }
    }
}

/// Unwrap one sub-fetch, recording and logging the metric if it failed.
fn or_default<T: Default>(
    result: Result<T, StatsError>,
    metric: Metric,
    player: &str,
    defaulted: &mut BTreeSet<Metric>,
) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            warn!(player, ?metric, error = %e, "sub-fetch failed, using default");
            defaulted.insert(metric);
            T::default()
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// The recent-window date range ending today. For a season other than the
/// current year the range ends on the last day of that season's year.
pub(crate) fn recent_range(today: NaiveDate, season: i32) -> (NaiveDate, NaiveDate) {
    let end = if today.year() == season {
        today
    } else {
        NaiveDate::from_ymd_opt(season, 12, 31).unwrap_or(today)
    };
    let start = end - chrono::Duration::days(i64::from(RECENT_WINDOW_DAYS) - 1);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn recent_range_is_seven_days_inclusive() {
        let (start, end) = recent_range(date(2026, 5, 10), 2026);
        assert_eq!(start, date(2026, 5, 4));
        assert_eq!(end, date(2026, 5, 10));
    }

    #[test]
    fn recent_range_for_past_season_ends_at_year_end() {
        let (start, end) = recent_range(date(2026, 5, 10), 2025);
        assert_eq!(start, date(2025, 12, 25));
        assert_eq!(end, date(2025, 12, 31));
    }
}
