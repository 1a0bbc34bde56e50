use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use smoketrace_core::store::{subscribe_active_user_count, subscribe_aggregate_stats};
use smoketrace_core::{Config, CounterStore};

use super::{remote_store, CmdResult};

#[derive(Args)]
pub struct StatsArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
    /// Keep polling for this many seconds, printing each change
    #[arg(long, value_name = "SECS")]
    watch: Option<u64>,
}

#[derive(Args)]
pub struct DailyArgs {
    /// Number of most recent days with any cigarettes
    #[arg(long, default_value = "7")]
    days: usize,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run_stats(args: StatsArgs) -> CmdResult {
    let config = Config::load()?;
    let store = Arc::new(remote_store(&config)?);

    if let Some(secs) = args.watch {
        let json = args.json;
        let every = config.store.poll_interval();
        let _stats = subscribe_aggregate_stats(Arc::clone(&store), every, move |stats| {
            if json {
                println!("{}", serde_json::json!({ "type": "Stats", "stats": stats }));
            } else {
                println!("today: {}  total: {}", stats.today_count, stats.total_count);
            }
        });
        let _users = subscribe_active_user_count(Arc::clone(&store), every, move |users| {
            if json {
                println!("{}", serde_json::json!({ "type": "ActiveUsers", "users": users }));
            } else {
                println!("active: {}  burning: {}", users.total, users.burning);
            }
        });
        tokio::time::sleep(Duration::from_secs(secs)).await;
        return Ok(());
    }

    let stats = store.aggregate_stats().await?;
    let users = store.active_users().await?;
    if args.json {
        let out = serde_json::json!({ "stats": stats, "active_users": users });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Today:        {}", stats.today_count);
        println!("All time:     {}", stats.total_count);
        println!("Active users: {} ({} burning)", users.total, users.burning);
    }
    Ok(())
}

pub async fn run_daily(args: DailyArgs) -> CmdResult {
    let config = Config::load()?;
    let store = remote_store(&config)?;
    let days = store.daily_stats(args.days).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }
    if days.is_empty() {
        println!("no cigarettes recorded yet");
    }
    for day in days {
        println!("{}  {}", day.date, day.count);
    }
    Ok(())
}
