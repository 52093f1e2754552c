// Aggregation pipeline: joins the roster with fetched metrics and derives
// standings, head-to-head comparisons, and monthly series.

use std::collections::{HashMap, HashSet};

use futures_util::stream::{self, StreamExt};
use tracing::info;

use crate::resolver::NameResolver;
use crate::roster::RosterEntry;
use crate::stats::StatFetcher;
use crate::types::{
    HeadToHead, MatchupCell, MatchupRow, Metric, MonthlySeries, PlayerRow, ReportingWindow,
    StandingsRow, TeamView,
};

// ---------------------------------------------------------------------------
// Team views
// ---------------------------------------------------------------------------

/// Attach metrics to every roster entry and group the rows by manager.
///
/// Fetches run concurrently, at most `concurrency` at a time, but the rows
/// keep roster order. Managers appear in order of their first roster row.
pub async fn build_team_views(
    fetcher: &StatFetcher,
    resolver: &NameResolver,
    roster: &[RosterEntry],
    window: ReportingWindow,
    concurrency: usize,
) -> Vec<TeamView> {
    let rows: Vec<PlayerRow> = stream::iter(roster)
        .map(|entry| async move {
            let metrics = fetcher.fetch(resolver.resolve(&entry.player), window).await;
            PlayerRow {
                entry: entry.clone(),
                metrics,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let views = group_by_manager(rows);
    info!(
        "Built {} team views for {} ({} players)",
        views.len(),
        window,
        roster.len()
    );
    views
}

/// Group rows by manager, preserving first-appearance order of managers and
/// row order within each manager.
pub fn group_by_manager(rows: Vec<PlayerRow>) -> Vec<TeamView> {
    let mut views: Vec<TeamView> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let slot = match index.get(&row.entry.manager) {
            Some(&i) => i,
            None => {
                index.insert(row.entry.manager.clone(), views.len());
                views.push(TeamView {
                    manager: row.entry.manager.clone(),
                    rows: Vec::new(),
                });
                views.len() - 1
            }
        };
        views[slot].rows.push(row);
    }
    views
}

/// Look up a manager's team view by name.
pub fn find_team<'a>(views: &'a [TeamView], manager: &str) -> Option<&'a TeamView> {
    views.iter().find(|v| v.manager == manager)
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

/// Per-manager totals of `metric`, highest first. Ties keep manager order.
pub fn standings(views: &[TeamView], metric: Metric) -> Vec<StandingsRow> {
    let mut rows: Vec<StandingsRow> = views
        .iter()
        .map(|v| StandingsRow {
            manager: v.manager.clone(),
            total: v.total(metric),
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

// ---------------------------------------------------------------------------
// Head-to-head
// ---------------------------------------------------------------------------

/// Each row paired with its position label and 0-based occurrence of that
/// position within the team.
fn position_slots(view: &TeamView) -> Vec<((&str, usize), &PlayerRow)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    view.rows
        .iter()
        .map(|row| {
            let pos = row.entry.position.as_str();
            let occurrence = seen.entry(pos).or_insert(0);
            let key = (pos, *occurrence);
            *occurrence += 1;
            (key, row)
        })
        .collect()
}

fn cell(row: Option<&PlayerRow>, metric: Metric) -> MatchupCell {
    match row {
        Some(r) => MatchupCell::Player {
            name: r.entry.player.clone(),
            value: metric.value(&r.metrics),
        },
        None => MatchupCell::Placeholder,
    }
}

/// Compare two teams slot by slot.
///
/// Rows are joined on (position, occurrence), so two outfielders on one side
/// and one on the other produce two rows, the second with a placeholder on
/// the short side. Rows follow `a`'s order, then slots only `b` has in
/// `b`'s order. The score is each team's total of `metric`.
pub fn head_to_head(a: &TeamView, b: &TeamView, metric: Metric) -> HeadToHead {
    let left = position_slots(a);
    let right = position_slots(b);
    let right_by_key: HashMap<(&str, usize), &PlayerRow> = right.iter().copied().collect();
    let left_keys: HashSet<(&str, usize)> = left.iter().map(|(k, _)| *k).collect();

    let mut rows = Vec::with_capacity(left.len().max(right.len()));
    for ((pos, slot), row) in &left {
        rows.push(MatchupRow {
            position: pos.to_string(),
            slot: *slot,
            left: cell(Some(*row), metric),
            right: cell(right_by_key.get(&(*pos, *slot)).copied(), metric),
        });
    }
    for ((pos, slot), row) in &right {
        if left_keys.contains(&(*pos, *slot)) {
            continue;
        }
        rows.push(MatchupRow {
            position: pos.to_string(),
            slot: *slot,
            left: MatchupCell::Placeholder,
            right: cell(Some(*row), metric),
        });
    }

    HeadToHead {
        rows,
        score: (a.total(metric), b.total(metric)),
    }
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

/// Sum every player's monthly home runs into month -> manager totals. Months
/// and managers without contributions are left out, including months a
/// player appeared in without homering.
pub fn monthly_series(views: &[TeamView]) -> MonthlySeries {
    let mut series = MonthlySeries::new();
    for view in views {
        for row in &view.rows {
            for (&month, &hr) in &row.metrics.monthly_totals {
                if hr == 0 {
                    continue;
                }
                *series
                    .entry(month)
                    .or_default()
                    .entry(view.manager.clone())
                    .or_insert(0) += hr;
            }
        }
    }
    series
}

// ---------------------------------------------------------------------------
// Draft steal
// ---------------------------------------------------------------------------

/// The single best player across all teams by `metric`, with their manager.
/// `None` until somebody has a non-zero value. Ties go to the earlier row.
pub fn draft_steal<'a>(views: &'a [TeamView], metric: Metric) -> Option<(&'a str, &'a PlayerRow)> {
    let mut best: Option<(&str, &PlayerRow, u32)> = None;
    for view in views {
        for row in &view.rows {
            let value = metric.value(&row.metrics);
            if value > best.map_or(0, |(_, _, v)| v) {
                best = Some((view.manager.as_str(), row, value));
            }
        }
    }
    best.map(|(manager, row, _)| (manager, row))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerMetrics;

    fn row(manager: &str, player: &str, position: &str, hr: u32) -> PlayerRow {
        PlayerRow {
            entry: RosterEntry {
                manager: manager.into(),
                player: player.into(),
                position: position.into(),
                team: String::new(),
            },
            metrics: PlayerMetrics {
                season_total: hr,
                ..PlayerMetrics::default()
            },
        }
    }

    fn with_months(mut r: PlayerRow, months: &[(u32, u32)]) -> PlayerRow {
        r.metrics.monthly_totals = months.iter().copied().collect();
        r
    }

    #[test]
    fn grouping_preserves_manager_and_row_order() {
        let views = group_by_manager(vec![
            row("Rob", "p1", "C", 0),
            row("Chris", "p2", "C", 0),
            row("Rob", "p3", "1B", 0),
        ]);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].manager, "Rob");
        assert_eq!(views[0].rows[0].entry.player, "p1");
        assert_eq!(views[0].rows[1].entry.player, "p3");
        assert_eq!(views[1].manager, "Chris");
    }

    #[test]
    fn standings_sum_and_sort_descending() {
        let views = group_by_manager(vec![
            row("A", "p1", "C", 3),
            row("A", "p2", "1B", 5),
            row("B", "p3", "C", 10),
        ]);
        let table = standings(&views, Metric::SeasonTotal);
        assert_eq!(
            table,
            vec![
                StandingsRow { manager: "B".into(), total: 10 },
                StandingsRow { manager: "A".into(), total: 8 },
            ]
        );
    }

    #[test]
    fn standings_ties_keep_manager_order() {
        let views = group_by_manager(vec![
            row("Mike", "p1", "C", 4),
            row("Kenyon", "p2", "C", 4),
            row("Chris", "p3", "C", 9),
        ]);
        let names: Vec<String> = standings(&views, Metric::SeasonTotal)
            .into_iter()
            .map(|r| r.manager)
            .collect();
        assert_eq!(names, vec!["Chris", "Mike", "Kenyon"]);
    }

    #[test]
    fn standings_use_selected_metric() {
        let mut a = row("A", "p1", "C", 1);
        a.metrics.recent_window_total = 3;
        let mut b = row("B", "p2", "C", 5);
        b.metrics.recent_window_total = 0;
        let views = group_by_manager(vec![a, b]);
        let table = standings(&views, Metric::RecentWindow);
        assert_eq!(table[0].manager, "A");
        assert_eq!(table[0].total, 3);
    }

    #[test]
    fn head_to_head_pairs_duplicate_positions_by_occurrence() {
        let views = group_by_manager(vec![
            row("A", "a_of1", "OF", 2),
            row("A", "a_of2", "OF", 1),
            row("B", "b_of1", "OF", 4),
        ]);
        let h2h = head_to_head(&views[0], &views[1], Metric::SeasonTotal);

        assert_eq!(h2h.rows.len(), 2);
        assert!(h2h.rows.iter().all(|r| r.position == "OF"));
        assert_eq!(
            h2h.rows[0].right,
            MatchupCell::Player { name: "b_of1".into(), value: 4 }
        );
        assert_eq!(h2h.rows[1].slot, 1);
        assert_eq!(h2h.rows[1].left.name(), "a_of2");
        assert_eq!(h2h.rows[1].right, MatchupCell::Placeholder);
        assert_eq!(h2h.score, (3, 4));
    }

    #[test]
    fn head_to_head_appends_right_only_slots() {
        let views = group_by_manager(vec![
            row("A", "a_c", "C", 1),
            row("B", "b_dh", "DH", 6),
            row("B", "b_c", "C", 2),
        ]);
        let h2h = head_to_head(&views[0], &views[1], Metric::SeasonTotal);

        assert_eq!(h2h.rows.len(), 2);
        assert_eq!(h2h.rows[0].position, "C");
        assert_eq!(h2h.rows[0].right.name(), "b_c");
        assert_eq!(h2h.rows[1].position, "DH");
        assert_eq!(h2h.rows[1].left, MatchupCell::Placeholder);
        assert_eq!(h2h.rows[1].left.value_text(), "-");
        assert_eq!(h2h.score, (1, 8));
    }

    #[test]
    fn head_to_head_is_not_a_cross_join() {
        let views = group_by_manager(vec![
            row("A", "a1", "OF", 0),
            row("A", "a2", "OF", 0),
            row("A", "a3", "OF", 0),
            row("B", "b1", "OF", 0),
            row("B", "b2", "OF", 0),
            row("B", "b3", "OF", 0),
        ]);
        let h2h = head_to_head(&views[0], &views[1], Metric::SeasonTotal);
        assert_eq!(h2h.rows.len(), 3);
        assert_eq!(h2h.rows[2].left.name(), "a3");
        assert_eq!(h2h.rows[2].right.name(), "b3");
    }

    #[test]
    fn monthly_series_sums_per_manager() {
        let views = group_by_manager(vec![
            with_months(row("A", "p1", "C", 0), &[(4, 2), (5, 1)]),
            with_months(row("A", "p2", "1B", 0), &[(4, 3)]),
            with_months(row("B", "p3", "C", 0), &[(5, 4)]),
        ]);
        let series = monthly_series(&views);
        assert_eq!(series[&4]["A"], 5);
        assert_eq!(series[&5]["A"], 1);
        assert_eq!(series[&5]["B"], 4);
        // Sparse: B has nothing in April.
        assert!(!series[&4].contains_key("B"));
        assert!(!series.contains_key(&6));
    }

    #[test]
    fn monthly_series_ignores_homerless_months() {
        let views = group_by_manager(vec![
            with_months(row("A", "p1", "C", 0), &[(3, 0), (4, 2)]),
            with_months(row("B", "p2", "C", 0), &[(4, 0)]),
        ]);
        let series = monthly_series(&views);
        assert!(!series.contains_key(&3));
        assert_eq!(series[&4].len(), 1);
        assert_eq!(series[&4]["A"], 2);
    }

    #[test]
    fn draft_steal_picks_top_player() {
        let views = group_by_manager(vec![
            row("A", "p1", "C", 3),
            row("B", "p2", "C", 7),
            row("B", "p3", "1B", 7),
        ]);
        let (manager, best) = draft_steal(&views, Metric::SeasonTotal).unwrap();
        assert_eq!(manager, "B");
        assert_eq!(best.entry.player, "p2");
    }

    #[test]
    fn draft_steal_none_before_first_homer() {
        let views = group_by_manager(vec![row("A", "p1", "C", 0)]);
        assert!(draft_steal(&views, Metric::SeasonTotal).is_none());
    }

    #[test]
    fn find_team_by_manager_name() {
        let views = group_by_manager(vec![row("A", "p1", "C", 0)]);
        assert!(find_team(&views, "A").is_some());
        assert!(find_team(&views, "Z").is_none());
    }
}
