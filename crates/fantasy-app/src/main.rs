// Fantasy advisor entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout is reserved for the report)
// 2. Parse arguments
// 3. Load config
// 4. Load the snapshot and optional fixtures CSV
// 5. Run the advisory pass and print JSON

use fantasy_app::advice;
use fantasy_app::snapshot;
use fantasy_core::config;

use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing::info;

const USAGE: &str = "usage: fantasy-advisor <snapshot.json> [--fixtures <fixtures.csv>]";

struct Args {
    snapshot: PathBuf,
    fixtures: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut snapshot = None;
    let mut fixtures = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fixtures" => match args.next() {
                Some(path) => fixtures = Some(PathBuf::from(path)),
                None => bail!("--fixtures needs a path\n{USAGE}"),
            },
            "-h" | "--help" => bail!("{USAGE}"),
            _ if snapshot.is_none() => snapshot = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument '{arg}'\n{USAGE}"),
        }
    }
    let Some(snapshot) = snapshot else {
        bail!("missing snapshot path\n{USAGE}");
    };
    Ok(Args { snapshot, fixtures })
}

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Fantasy advisor starting up");

    // 2. Parse arguments
    let args = parse_args(std::env::args().skip(1))?;

    // 3. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: alpha={}, horizon={}, strategies={:?}",
        config.form.alpha, config.forecast.horizon, config.strategies
    );

    // 4. Load inputs
    let snapshot = snapshot::load_snapshot(&args.snapshot)
        .with_context(|| format!("failed to load snapshot {}", args.snapshot.display()))?;
    info!(
        "Snapshot loaded: {} squad players, {} market players, {} rivals",
        snapshot.team.players.len(),
        snapshot.market.available_players.len(),
        snapshot.rivals.len()
    );

    let fixtures = match &args.fixtures {
        Some(path) => snapshot::load_fixtures(path)
            .with_context(|| format!("failed to load fixtures {}", path.display()))?,
        None => Vec::new(),
    };
    if args.fixtures.is_some() {
        info!("Loaded {} fixtures", fixtures.len());
    }

    // 5. Advise
    let advice = advice::advise(&config, &snapshot, &fixtures);
    let json = serde_json::to_string_pretty(&advice).context("failed to serialize report")?;
    println!("{json}");

    info!("Fantasy advisor finished");
    Ok(())
}

/// Initialize tracing to log to a file so stdout carries only the report.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("fantasy-advisor.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fantasy_core=info,fantasy_app=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
