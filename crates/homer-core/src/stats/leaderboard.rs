// Positional home-run leaderboards.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::source::StatsSource;
use crate::cache::TtlCache;
use crate::types::{LeaderboardRow, ReportingWindow};

/// Position filters offered for leaderboards, with display labels.
pub const LEADERBOARD_POSITIONS: [(&str, &str); 7] = [
    ("C", "Catcher"),
    ("1B", "1st Base"),
    ("2B", "2nd Base"),
    ("3B", "3rd Base"),
    ("SS", "Shortstop"),
    ("OF", "Outfield"),
    ("DH", "DH"),
];

/// Display label for a leaderboard position code, if it is one we offer.
pub fn position_label(code: &str) -> Option<&'static str> {
    LEADERBOARD_POSITIONS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, label)| *label)
}

type LeaderboardKey = (String, ReportingWindow, u32);

/// Fetches top-N home-run hitters per position. Any failure yields an empty
/// list; the caller shows that as "no data".
pub struct LeaderboardFetcher {
    source: Arc<dyn StatsSource>,
    cache: TtlCache<LeaderboardKey, Vec<LeaderboardRow>>,
}

impl LeaderboardFetcher {
    pub fn new(source: Arc<dyn StatsSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl),
        }
    }

    /// The top `n` players at `position` in `window`, in the source's order.
    /// Position codes are case-insensitive.
    pub async fn top_n(
        &self,
        position: &str,
        window: ReportingWindow,
        n: u32,
    ) -> Vec<LeaderboardRow> {
        let position = position.trim().to_ascii_uppercase();
        let key = (position.clone(), window, n);
        self.cache
            .get_or_compute(key, || async {
                match self.source.home_run_leaders(&position, window, n).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!(%position, %window, error = %e, "leaderboard fetch failed");
                        Vec::new()
                    }
                }
            })
            .await
    }

    pub fn refresh(&self) {
        self.cache.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_for_known_positions() {
        assert_eq!(position_label("OF"), Some("Outfield"));
        assert_eq!(position_label("1b"), Some("1st Base"));
        assert_eq!(position_label("P"), None);
    }
}
