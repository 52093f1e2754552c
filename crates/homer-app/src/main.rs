// Home-run league dashboard entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries the report)
// 2. Parse command line
// 3. Load config
// 4. Build the dashboard and pick the reporting window
// 5. Run the requested view (or the watch loop)

mod report;

use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{error, info};

use homer_core::config;
use homer_core::types::{GameType, Metric, ReportingWindow};
use homer_core::{Dashboard, Snapshot};

#[derive(Parser)]
#[command(name = "homer", version, about = "Fantasy home-run league dashboard")]
struct Cli {
    /// Override the season phase (spring or regular).
    #[arg(long, global = true, value_parser = parse_phase)]
    phase: Option<GameType>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// League standings.
    Standings {
        /// season, week or last15.
        #[arg(long, default_value = "season", value_parser = parse_metric)]
        metric: Metric,
    },
    /// One manager's roster with every metric.
    Team { manager: String },
    /// Position-by-position comparison of two managers.
    H2h {
        a: String,
        b: String,
        #[arg(long, default_value = "season", value_parser = parse_metric)]
        metric: Metric,
    },
    /// League-wide home-run leaders at a position.
    Leaders {
        #[arg(long, default_value = "C")]
        position: String,
    },
    /// Home runs per month for each manager.
    Monthly,
    /// Score the current roster against another season.
    Simulate {
        #[arg(long)]
        season: i32,
    },
    /// Re-render standings periodically. Type `r` to refresh, `q` to quit.
    Watch {
        #[arg(long, default_value_t = 60)]
        interval: u64,
    },
}

fn parse_phase(s: &str) -> Result<GameType, String> {
    GameType::from_str_phase(s).ok_or_else(|| format!("unknown phase `{s}` (spring or regular)"))
}

fn parse_metric(s: &str) -> Result<Metric, String> {
    Metric::from_str_primary(s).ok_or_else(|| format!("unknown metric `{s}` (season, week, last15)"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("homer starting up");

    // 2. Parse command line
    let cli = Cli::parse();

    // 3. Load config
    let mut config = config::load_config().context("failed to load configuration")?;
    if let Some(phase) = cli.phase {
        config.league.phase = Some(phase);
    }
    info!(
        "Config loaded: league={}, season={}, roster={}",
        config.league.name, config.league.season, config.roster_source
    );

    // 4. Build the dashboard
    let league = config.league.name.clone();
    let dashboard = Dashboard::from_config(config);
    let window = dashboard.active_window(Local::now().date_naive());
    info!("Reporting window: {window}");

    // 5. Run the requested view
    match cli.command {
        Command::Standings { metric } => {
            let snap = load_snapshot(&dashboard, window).await?;
            print!("{}", report::header(&league, &snap));
            print!("{}", report::standings(&snap.standings_by(metric), metric));
            print!("{}", report::draft_steal(snap.steal.as_ref()));
        }
        Command::Team { manager } => {
            let snap = load_snapshot(&dashboard, window).await?;
            let Some(view) = snap.team(&manager) else {
                bail!(
                    "unknown manager `{manager}` (managers: {})",
                    snap.managers().collect::<Vec<_>>().join(", ")
                );
            };
            print!("{}", report::header(&league, &snap));
            print!("{}", report::team(view));
        }
        Command::H2h { a, b, metric } => {
            let snap = load_snapshot(&dashboard, window).await?;
            let h2h = dashboard.head_to_head(&snap, &a, &b, metric)?;
            print!("{}", report::header(&league, &snap));
            print!("{}", report::head_to_head(&a, &b, &h2h, metric));
        }
        Command::Leaders { position } => {
            let rows = dashboard.leaders(&position, window).await;
            println!("{league} | {window}");
            print!("{}", report::leaders(&position, &rows));
        }
        Command::Monthly => {
            let snap = load_snapshot(&dashboard, window).await?;
            print!("{}", report::header(&league, &snap));
            print!("{}", report::monthly(&snap.monthly, snap.managers()));
        }
        Command::Simulate { season } => {
            let snap = dashboard
                .simulate_year(window, season)
                .await
                .with_context(|| format!("failed to simulate season {season}"))?;
            print!("{}", report::header(&league, &snap));
            print!("{}", report::standings(&snap.standings, Metric::SeasonTotal));
            print!("{}", report::draft_steal(snap.steal.as_ref()));
        }
        Command::Watch { interval } => {
            let interval = Duration::from_secs(interval.max(1));
            watch(&dashboard, &league, window, interval, tokio::io::stdin()).await?;
        }
    }

    info!("homer finished");
    Ok(())
}

async fn load_snapshot(dashboard: &Dashboard, window: ReportingWindow) -> anyhow::Result<Snapshot> {
    dashboard.snapshot(window).await.with_context(|| {
        format!(
            "could not load the roster from {}",
            dashboard.config().roster_source
        )
    })
}

/// Redraw standings on every tick. A line `r` on `input` clears all caches
/// and redraws immediately; `q` stops the loop. Once `input` is closed the
/// loop keeps redrawing on the interval.
async fn watch<R: AsyncRead + Unpin>(
    dashboard: &Dashboard,
    league: &str,
    window: ReportingWindow,
    interval: Duration,
    input: R,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    let mut lines = BufReader::new(input).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            line = lines.next_line(), if input_open => {
                match line.context("failed to read stdin")? {
                    Some(cmd) if cmd.trim().eq_ignore_ascii_case("r") => {
                        info!("Manual refresh requested");
                        dashboard.refresh();
                    }
                    Some(cmd) if cmd.trim().eq_ignore_ascii_case("q") => break,
                    Some(_) => continue,
                    None => {
                        info!("stdin closed, refreshing on the interval only");
                        input_open = false;
                        continue;
                    }
                }
            }
        }

        match dashboard.snapshot(window).await {
            Ok(snap) => {
                print!("{}", report::header(league, &snap));
                print!("{}", report::standings(&snap.standings, Metric::SeasonTotal));
                print!("{}", report::draft_steal(snap.steal.as_ref()));
                println!("[r] refresh  [q] quit");
            }
            Err(e) => {
                error!("Roster load failed: {e}");
                eprintln!("Could not load the roster: {e}");
            }
        }
    }

    Ok(())
}

/// Initialize tracing to log to a file so stdout stays a clean report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("homer.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("homer_core=info,homer_app=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
