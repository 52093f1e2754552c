// MLB Stats API client.
//
// Issues one GET per sub-metric against statsapi.mlb.com and pulls the few
// fields the fetchers need out of the nested JSON responses.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use super::source::{StatsError, StatsSource};
use crate::types::{LeaderboardRow, PlayerId, PlayerStatus, ReportingWindow};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MLB_STATS_API_URL: &str = "https://statsapi.mlb.com/api/v1";
const USER_AGENT: &str = concat!("homer/", env!("CARGO_PKG_VERSION"));
const SPORT_ID_MLB: &str = "1";

// ---------------------------------------------------------------------------
// MlbStatsClient
// ---------------------------------------------------------------------------

/// `StatsSource` backed by the public MLB Stats API.
pub struct MlbStatsClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl MlbStatsClient {
    /// Create a client against `base_url` (normally [`MLB_STATS_API_URL`]).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self::with_client(http, base_url, timeout)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            timeout,
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, StatsError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "stats request");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StatsError::Http {
                url: url.clone(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StatsError::Status { url, status });
        }

        let body = resp.bytes().await.map_err(|e| StatsError::Http {
            url: url.clone(),
            source: e,
        })?;
        serde_json::from_slice(&body).map_err(|e| StatsError::Decode { url, source: e })
    }

    /// GET `/people/{id}/stats` for the hitting group with the given stat
    /// type and any extra parameters.
    async fn hitting_stats(
        &self,
        id: PlayerId,
        window: ReportingWindow,
        stat_type: &str,
        extra: &[(&str, String)],
    ) -> Result<Value, StatsError> {
        let mut query = vec![
            ("stats", stat_type.to_string()),
            ("group", "hitting".to_string()),
            ("season", window.season.to_string()),
            ("gameType", window.game_type.api_code().to_string()),
        ];
        query.extend(extra.iter().cloned());
        self.get_json(&format!("/people/{id}/stats"), &query).await
    }
}

#[async_trait]
impl StatsSource for MlbStatsClient {
    async fn search_player(&self, query: &str) -> Result<Option<PlayerId>, StatsError> {
        let v = self
            .get_json(
                "/people/search",
                &[
                    ("names", query.to_string()),
                    ("sportIds", SPORT_ID_MLB.to_string()),
                ],
            )
            .await?;
        parse_search_id(&v)
    }

    async fn season_home_runs(
        &self,
        id: PlayerId,
        window: ReportingWindow,
    ) -> Result<u32, StatsError> {
        let v = self.hitting_stats(id, window, "season", &[]).await?;
        parse_split_home_runs(&v)
    }

    async fn date_range_home_runs(
        &self,
        id: PlayerId,
        window: ReportingWindow,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u32, StatsError> {
        let extra = [
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
        ];
        let v = self.hitting_stats(id, window, "byDateRange", &extra).await?;
        parse_split_home_runs(&v)
    }

    async fn last_games_home_runs(
        &self,
        id: PlayerId,
        window: ReportingWindow,
        games: u32,
    ) -> Result<u32, StatsError> {
        let extra = [("limit", games.to_string())];
        let v = self.hitting_stats(id, window, "lastXGames", &extra).await?;
        parse_split_home_runs(&v)
    }

    async fn monthly_home_runs(
        &self,
        id: PlayerId,
        window: ReportingWindow,
    ) -> Result<BTreeMap<u32, u32>, StatsError> {
        let v = self.hitting_stats(id, window, "byMonth", &[]).await?;
        parse_monthly_home_runs(&v)
    }

    async fn roster_status(&self, id: PlayerId) -> Result<PlayerStatus, StatsError> {
        let v = self
            .get_json(
                &format!("/people/{id}"),
                &[("hydrate", "rosterEntries".to_string())],
            )
            .await?;
        parse_roster_status(&v)
    }

    async fn home_run_leaders(
        &self,
        position: &str,
        window: ReportingWindow,
        limit: u32,
    ) -> Result<Vec<LeaderboardRow>, StatsError> {
        let v = self
            .get_json(
                "/stats/leaders",
                &[
                    ("leaderCategories", "homeRuns".to_string()),
                    ("statGroup", "hitting".to_string()),
                    ("season", window.season.to_string()),
                    ("gameType", window.game_type.api_code().to_string()),
                    ("limit", limit.to_string()),
                    ("position", position.to_string()),
                    ("sportId", SPORT_ID_MLB.to_string()),
                ],
            )
            .await?;
        parse_leaders(&v)
    }
}

// ---------------------------------------------------------------------------
// JSON extraction helpers
// ---------------------------------------------------------------------------

/// First `people[].id` from a search response.
///
/// Expected shape: `{ "people": [ { "id": 592450, "fullName": "..." } ] }`
pub(crate) fn parse_search_id(v: &Value) -> Result<Option<PlayerId>, StatsError> {
    let people = v
        .get("people")
        .and_then(Value::as_array)
        .ok_or(StatsError::MissingField("people"))?;
    Ok(people
        .first()
        .and_then(|p| p.get("id"))
        .and_then(Value::as_u64)
        .map(PlayerId))
}

/// The split list of the first stats group, or `None` if the response has
/// no `stats` array. A group without splits yields an empty slice.
fn first_group_splits(v: &Value) -> Option<&[Value]> {
    let groups = v.get("stats")?.as_array()?;
    let splits = groups
        .first()
        .and_then(|g| g.get("splits"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    Some(splits)
}

fn split_home_runs(split: &Value) -> Option<u32> {
    split
        .get("stat")?
        .get("homeRuns")?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
}

/// `stats[0].splits[0].stat.homeRuns`. A player with no games in the
/// window has no splits, which reads as zero.
///
/// Expected shape:
/// `{ "stats": [ { "splits": [ { "stat": { "homeRuns": 12 } } ] } ] }`
pub(crate) fn parse_split_home_runs(v: &Value) -> Result<u32, StatsError> {
    let splits = first_group_splits(v).ok_or(StatsError::MissingField("stats"))?;
    match splits.first() {
        None => Ok(0),
        Some(split) => split_home_runs(split).ok_or(StatsError::MissingField("stat.homeRuns")),
    }
}

/// Sum `stat.homeRuns` per `month` across all splits of a `byMonth`
/// response. Splits without a usable month are skipped.
pub(crate) fn parse_monthly_home_runs(v: &Value) -> Result<BTreeMap<u32, u32>, StatsError> {
    let splits = first_group_splits(v).ok_or(StatsError::MissingField("stats"))?;
    let mut months = BTreeMap::new();
    for split in splits {
        let month = split
            .get("month")
            .and_then(Value::as_u64)
            .filter(|m| (1..=12).contains(m));
        match (month, split_home_runs(split)) {
            (Some(month), Some(hr)) => *months.entry(month as u32).or_insert(0) += hr,
            _ => warn!("skipping monthly split without month or homeRuns"),
        }
    }
    Ok(months)
}

/// Status from `people[0].rosterEntries`: the active entry if one is
/// flagged, otherwise the most recent one.
///
/// Status codes: `A` is active, `D7`/`D10`/`D15`/`D60` are injured-list
/// placements. Anything else, or no roster entries at all, is `Unknown`.
pub(crate) fn parse_roster_status(v: &Value) -> Result<PlayerStatus, StatsError> {
    let person = v
        .get("people")
        .and_then(Value::as_array)
        .and_then(|p| p.first())
        .ok_or(StatsError::MissingField("people"))?;

    let entries = person
        .get("rosterEntries")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let entry = entries
        .iter()
        .find(|e| e.get("isActive").and_then(Value::as_bool) == Some(true))
        .or_else(|| entries.last());

    let code = entry
        .and_then(|e| e.get("status"))
        .and_then(|s| s.get("code"))
        .and_then(Value::as_str);

    Ok(match code {
        Some("A") => PlayerStatus::Active,
        Some(c) if c.starts_with('D') || c.starts_with("IL") => PlayerStatus::Injured,
        _ => PlayerStatus::Unknown,
    })
}

/// Leader rows from `leagueLeaders[0].leaders`. Rows without a player name
/// or a numeric value are skipped.
///
/// Expected shape:
/// `{ "leagueLeaders": [ { "leaders": [ { "rank": 1, "value": "14",
///   "person": { "id": 1, "fullName": "..." }, "team": { "name": "..." } } ] } ] }`
pub(crate) fn parse_leaders(v: &Value) -> Result<Vec<LeaderboardRow>, StatsError> {
    let groups = v
        .get("leagueLeaders")
        .and_then(Value::as_array)
        .ok_or(StatsError::MissingField("leagueLeaders"))?;

    let leaders = groups
        .first()
        .and_then(|g| g.get("leaders"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut rows = Vec::with_capacity(leaders.len());
    for (idx, leader) in leaders.iter().enumerate() {
        let person = leader.get("person");
        let Some(player) = person
            .and_then(|p| p.get("fullName"))
            .and_then(Value::as_str)
        else {
            warn!("skipping leader row {} without a player name", idx + 1);
            continue;
        };
        let Some(value) = leader_value(leader) else {
            warn!("skipping leader row for {player}: non-numeric value");
            continue;
        };
        let rank = leader
            .get("rank")
            .and_then(Value::as_u64)
            .and_then(|r| u32::try_from(r).ok())
            .unwrap_or_else(|| u32::try_from(idx + 1).unwrap_or(u32::MAX));
        let team = leader
            .get("team")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let photo_url = person
            .and_then(|p| p.get("id"))
            .and_then(Value::as_u64)
            .map(|id| PlayerId(id).photo_url());

        rows.push(LeaderboardRow {
            rank,
            player: player.to_string(),
            team: team.to_string(),
            value,
            photo_url,
        });
    }
    Ok(rows)
}

/// Leader values arrive as strings (`"14"`); accept plain numbers too.
fn leader_value(leader: &Value) -> Option<u32> {
    match leader.get("value")? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::SocketAddr;

    // -- search --

    #[test]
    fn search_takes_first_person() {
        let v = json!({ "people": [ { "id": 592450, "fullName": "Aaron Judge" }, { "id": 1 } ] });
        assert_eq!(parse_search_id(&v).unwrap(), Some(PlayerId(592450)));
    }

    #[test]
    fn search_with_no_people_is_none() {
        let v = json!({ "people": [] });
        assert_eq!(parse_search_id(&v).unwrap(), None);
    }

    #[test]
    fn search_without_people_field_is_error() {
        let v = json!({ "copyright": "..." });
        assert!(matches!(
            parse_search_id(&v),
            Err(StatsError::MissingField("people"))
        ));
    }

    // -- split home runs --

    #[test]
    fn season_home_runs_from_first_split() {
        let v = json!({
            "stats": [ {
                "type": { "displayName": "season" },
                "group": { "displayName": "hitting" },
                "splits": [ { "season": "2026", "stat": { "gamesPlayed": 40, "homeRuns": 14 } } ]
            } ]
        });
        assert_eq!(parse_split_home_runs(&v).unwrap(), 14);
    }

    #[test]
    fn no_splits_reads_as_zero() {
        let v = json!({ "stats": [ { "splits": [] } ] });
        assert_eq!(parse_split_home_runs(&v).unwrap(), 0);

        let v = json!({ "stats": [] });
        assert_eq!(parse_split_home_runs(&v).unwrap(), 0);
    }

    #[test]
    fn missing_stats_array_is_error() {
        let v = json!({ "message": "Internal error" });
        assert!(matches!(
            parse_split_home_runs(&v),
            Err(StatsError::MissingField("stats"))
        ));
    }

    #[test]
    fn split_without_home_runs_is_error() {
        let v = json!({ "stats": [ { "splits": [ { "stat": { "hits": 3 } } ] } ] });
        assert!(matches!(
            parse_split_home_runs(&v),
            Err(StatsError::MissingField("stat.homeRuns"))
        ));
    }

    #[test]
    fn out_of_range_home_runs_is_error() {
        let v = json!({ "stats": [ { "splits": [ { "stat": { "homeRuns": 5_000_000_000u64 } } ] } ] });
        assert!(matches!(
            parse_split_home_runs(&v),
            Err(StatsError::MissingField("stat.homeRuns"))
        ));
    }

    // -- monthly --

    #[test]
    fn monthly_splits_summed_by_month() {
        let v = json!({
            "stats": [ { "splits": [
                { "month": 4, "stat": { "homeRuns": 2 } },
                { "month": 5, "stat": { "homeRuns": 1 } },
                { "month": 5, "stat": { "homeRuns": 3 } },
                { "stat": { "homeRuns": 9 } }
            ] } ]
        });
        let months = parse_monthly_home_runs(&v).unwrap();
        assert_eq!(months.get(&4), Some(&2));
        assert_eq!(months.get(&5), Some(&4));
        assert_eq!(months.len(), 2);
    }

    // -- roster status --

    #[test]
    fn active_status_code() {
        let v = json!({ "people": [ { "rosterEntries": [
            { "isActive": false, "status": { "code": "D10" } },
            { "isActive": true, "status": { "code": "A", "description": "Active" } }
        ] } ] });
        assert_eq!(parse_roster_status(&v).unwrap(), PlayerStatus::Active);
    }

    #[test]
    fn injured_list_status_code() {
        let v = json!({ "people": [ { "rosterEntries": [
            { "status": { "code": "D60", "description": "Injured 60-Day" } }
        ] } ] });
        assert_eq!(parse_roster_status(&v).unwrap(), PlayerStatus::Injured);
    }

    #[test]
    fn missing_roster_entries_is_unknown() {
        let v = json!({ "people": [ { "id": 1 } ] });
        assert_eq!(parse_roster_status(&v).unwrap(), PlayerStatus::Unknown);

        let v = json!({ "people": [ { "rosterEntries": [ { "status": { "code": "RM" } } ] } ] });
        assert_eq!(parse_roster_status(&v).unwrap(), PlayerStatus::Unknown);
    }

    // -- leaders --

    #[test]
    fn leaders_parsed_in_source_order() {
        let v = json!({ "leagueLeaders": [ {
            "leaderCategory": "homeRuns",
            "leaders": [
                { "rank": 1, "value": "14", "person": { "id": 592450, "fullName": "Aaron Judge" },
                  "team": { "name": "New York Yankees" } },
                { "rank": 2, "value": "12", "person": { "id": 660271, "fullName": "Shohei Ohtani" },
                  "team": { "name": "Los Angeles Dodgers" } }
            ]
        } ] });
        let rows = parse_leaders(&v).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player, "Aaron Judge");
        assert_eq!(rows[0].team, "New York Yankees");
        assert_eq!(rows[0].value, 14);
        assert_eq!(
            rows[0].photo_url.as_deref(),
            Some("https://securea.mlb.com/mlb/images/players/head_shot/592450.jpg")
        );
        assert_eq!(rows[1].rank, 2);
    }

    #[test]
    fn leaders_skip_malformed_rows() {
        let v = json!({ "leagueLeaders": [ { "leaders": [
            { "rank": 1, "value": "n/a", "person": { "fullName": "Bad Value" } },
            { "value": 7, "person": { "fullName": "No Team" } },
            { "rank": 3, "value": "5" }
        ] } ] });
        let rows = parse_leaders(&v).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player, "No Team");
        assert_eq!(rows[0].rank, 2);
        assert_eq!(rows[0].team, "");
        assert_eq!(rows[0].photo_url, None);
    }

    #[test]
    fn leaders_skip_out_of_range_values() {
        let v = json!({ "leagueLeaders": [ { "leaders": [
            { "rank": 1, "value": 5_000_000_000u64, "person": { "fullName": "Overflow" } },
            { "rank": 2, "value": 9, "person": { "fullName": "Kept" } }
        ] } ] });
        let rows = parse_leaders(&v).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player, "Kept");
        assert_eq!(rows[0].value, 9);
    }

    #[test]
    fn empty_leaders_is_empty_vec() {
        let v = json!({ "leagueLeaders": [] });
        assert!(parse_leaders(&v).unwrap().is_empty());
    }

    // -- Integration-style tests with a mock TCP server --

    /// Serve one canned HTTP response per accepted connection, in order.
    async fn serve(responses: Vec<(u16, String)>) -> SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.flush().await.unwrap();
            }
        });

        addr
    }

    #[tokio::test]
    async fn mock_server_search_then_season() {
        let addr = serve(vec![
            (200, r#"{"people":[{"id":592450,"fullName":"Aaron Judge"}]}"#.to_string()),
            (200, r#"{"stats":[{"splits":[{"stat":{"homeRuns":21}}]}]}"#.to_string()),
        ])
        .await;

        let client = MlbStatsClient::new(format!("http://{addr}/"), Duration::from_secs(5));
        let id = client.search_player("Aaron Judge").await.unwrap();
        assert_eq!(id, Some(PlayerId(592450)));

        let hr = client
            .season_home_runs(PlayerId(592450), ReportingWindow::regular(2026))
            .await
            .unwrap();
        assert_eq!(hr, 21);
    }

    #[tokio::test]
    async fn mock_server_error_status() {
        let addr = serve(vec![(503, r#"{"message":"unavailable"}"#.to_string())]).await;

        let client = MlbStatsClient::new(format!("http://{addr}"), Duration::from_secs(5));
        let err = client
            .season_home_runs(PlayerId(1), ReportingWindow::regular(2026))
            .await
            .unwrap_err();
        match err {
            StatsError::Status { status, .. } => assert_eq!(status.as_u16(), 503),
            other => panic!("expected Status, got: {other}"),
        }
    }

    #[tokio::test]
    async fn mock_server_invalid_json() {
        let addr = serve(vec![(200, "not json".to_string())]).await;

        let client = MlbStatsClient::new(format!("http://{addr}"), Duration::from_secs(5));
        let err = client.search_player("Anyone").await.unwrap_err();
        assert!(matches!(err, StatsError::Decode { .. }));
    }
}
