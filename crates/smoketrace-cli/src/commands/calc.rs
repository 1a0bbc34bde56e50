use clap::Args;

use smoketrace_core::{Config, DerivedStats};

use super::CmdResult;

#[derive(Args)]
pub struct CalcArgs {
    /// Number of cigarettes
    count: u64,
    /// Price per cigarette (defaults to pricing.unit_price)
    #[arg(long)]
    price: Option<u64>,
    /// Minutes of life per cigarette (defaults to pricing.unit_minutes)
    #[arg(long)]
    minutes: Option<u64>,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: CalcArgs) -> CmdResult {
    let mut pricing = Config::load()?.pricing;
    if let Some(price) = args.price {
        pricing.unit_price = price;
    }
    if let Some(minutes) = args.minutes {
        pricing.unit_minutes = minutes;
    }

    let stats = DerivedStats::for_count(args.count, &pricing);
    let money = stats.money_label(&pricing.currency_symbol);
    let time_lost = stats.time_lost_label();

    if args.json {
        let out = serde_json::json!({
            "stats": stats,
            "money_label": money,
            "time_lost_label": time_lost,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Cigarettes:  {}", stats.count);
        println!("Money spent: {money}");
        println!("Time lost:   {time_lost}");
    }
    Ok(())
}
