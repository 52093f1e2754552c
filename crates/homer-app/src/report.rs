// Plain-text rendering of dashboard tables for stdout.

use std::fmt::Write;

use homer_core::dashboard::Snapshot;
use homer_core::stats::leaderboard::position_label;
use homer_core::types::{
    HeadToHead, LeaderboardRow, Metric, MonthlySeries, PlayerRow, StandingsRow, TeamView,
};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("???")
}

/// Title line plus the window being reported.
pub fn header(league: &str, snapshot: &Snapshot) -> String {
    format!(
        "{league} | {} {} ({})\n",
        snapshot.window.season,
        snapshot.window.game_type.label(),
        snapshot.window
    )
}

pub fn standings(rows: &[StandingsRow], metric: Metric) -> String {
    let mut out = String::new();
    let width = rows
        .iter()
        .map(|r| r.manager.len())
        .max()
        .unwrap_or(0)
        .max("Manager".len());
    let _ = writeln!(out, "{:>4}  {:<width$}  {}", "Rank", "Manager", metric.label());
    for (i, row) in rows.iter().enumerate() {
        let _ = writeln!(out, "{:>4}  {:<width$}  {:>3}", i + 1, row.manager, row.total);
    }
    out
}

pub fn team(view: &TeamView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.manager);
    let width = view
        .rows
        .iter()
        .map(|r| r.entry.player.len())
        .max()
        .unwrap_or(0)
        .max("Player".len());
    let _ = writeln!(
        out,
        "  {:<4} {:<width$}  {:<4} {:>3} {:>3} {:>3}  {}",
        "Pos", "Player", "Team", "HR", "7d", "15g", "Status"
    );
    for row in &view.rows {
        let _ = writeln!(
            out,
            "  {:<4} {:<width$}  {:<4} {:>3} {:>3} {:>3}  {}{}",
            row.entry.position,
            row.entry.player,
            row.entry.team,
            row.metrics.season_total,
            row.metrics.recent_window_total,
            row.metrics.short_window_total,
            row.metrics.status.label(),
            missing_marker(row),
        );
    }
    let _ = writeln!(
        out,
        "  Total: {} HR, {} in 7d, {} in 15g",
        view.total(Metric::SeasonTotal),
        view.total(Metric::RecentWindow),
        view.total(Metric::ShortWindow),
    );
    out
}

/// Flags rows whose numbers are defaults rather than fetched values.
fn missing_marker(row: &PlayerRow) -> &'static str {
    if row.metrics.is_fetched(Metric::SeasonTotal) {
        ""
    } else {
        "  (no data)"
    }
}

pub fn head_to_head(a: &str, b: &str, h2h: &HeadToHead, metric: Metric) -> String {
    let mut out = String::new();
    let left_width = h2h
        .rows
        .iter()
        .map(|r| r.left.name().len())
        .max()
        .unwrap_or(0)
        .max(a.len());
    let _ = writeln!(
        out,
        "{:<4} {:<left_width$} {:>4} | {:<4} {}",
        "Pos", a, metric.label(), metric.label(), b
    );
    for row in &h2h.rows {
        let _ = writeln!(
            out,
            "{:<4} {:<left_width$} {:>4} | {:<4} {}",
            row.position,
            row.left.name(),
            row.left.value_text(),
            row.right.value_text(),
            row.right.name(),
        );
    }
    let (score_a, score_b) = h2h.score;
    let _ = writeln!(out, "Score: {a} {score_a} - {score_b} {b}");
    out
}

pub fn leaders(position: &str, rows: &[LeaderboardRow]) -> String {
    let label = position_label(position).unwrap_or(position);
    let mut out = String::new();
    let _ = writeln!(out, "Top {} home-run hitters: {label}", rows.len());
    if rows.is_empty() {
        let _ = writeln!(out, "  No leaderboard data available.");
        return out;
    }
    for row in rows {
        let _ = writeln!(
            out,
            "{:>3}. {:<28} {:<4} {:>3}",
            row.rank, row.player, row.team, row.value
        );
    }
    out
}

/// Month-by-manager grid. Managers with no homers in a month show 0.
pub fn monthly<'a>(series: &MonthlySeries, managers: impl Iterator<Item = &'a str>) -> String {
    let managers: Vec<&str> = managers.collect();
    let mut out = String::new();
    if series.is_empty() {
        let _ = writeln!(out, "No monthly home runs yet.");
        return out;
    }
    let width = managers.iter().map(|m| m.len()).max().unwrap_or(0).max(3);
    let _ = write!(out, "{:<5}", "Month");
    for m in &managers {
        let _ = write!(out, " {:>width$}", m);
    }
    out.push('\n');
    for (month, by_manager) in series {
        let _ = write!(out, "{:<5}", month_name(*month));
        for m in &managers {
            let hr = by_manager.get(*m).copied().unwrap_or(0);
            let _ = write!(out, " {:>width$}", hr);
        }
        out.push('\n');
    }
    out
}

pub fn draft_steal(steal: Option<&(String, PlayerRow)>) -> String {
    match steal {
        Some((manager, row)) => format!(
            "Draft steal: {} ({}) with {} HR, drafted by {manager}\n",
            row.entry.player, row.entry.position, row.metrics.season_total
        ),
        None => "Waiting for the first home run of the season.\n".to_string(),
    }
}
