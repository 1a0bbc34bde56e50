use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod surfaces;

#[derive(Parser)]
#[command(name = "smoketrace", version, about = "SmokeTrace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Burn a cigarette from a scripted sequence of pointer events
    Simulate(commands::simulate::SimulateArgs),
    /// Global totals and active users
    Stats(commands::stats::StatsArgs),
    /// Per-day global counts
    Daily(commands::stats::DailyArgs),
    /// Money and time lost for a number of cigarettes
    Calc(commands::calc::CalcArgs),
    /// Share a summary, falling back to the clipboard
    Share(commands::share::ShareArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SMOKETRACE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args).await,
        Commands::Stats(args) => commands::stats::run_stats(args).await,
        Commands::Daily(args) => commands::stats::run_daily(args).await,
        Commands::Calc(args) => commands::calc::run(args),
        Commands::Share(args) => commands::share::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
