// Statistics retrieval: the source seam, the MLB client, and the cached
// fetchers built on top of it.

pub mod fetcher;
pub mod leaderboard;
pub mod mlb;
pub mod source;

pub use fetcher::StatFetcher;
pub use leaderboard::LeaderboardFetcher;
pub use mlb::MlbStatsClient;
pub use source::{StatsError, StatsSource};
