// Home-run league dashboard core: roster loading, stat fetching with TTL
// caching, and the aggregation pipeline behind the standings views.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod pipeline;
pub mod resolver;
pub mod roster;
pub mod stats;
pub mod types;

pub use config::Config;
pub use dashboard::{Dashboard, DashboardError, Snapshot};
