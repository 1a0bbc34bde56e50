use clap::Args;

use smoketrace_core::completion::CompletionSummary;
use smoketrace_core::{share_or_copy, Config, CoreError, ShareOutcome};

use super::CmdResult;
use crate::surfaces::{ClipboardShare, OpenShare};

#[derive(Args)]
pub struct ShareArgs {
    /// Number of cigarettes to share
    count: u64,
    /// Only print the share text
    #[arg(long)]
    print: bool,
}

pub fn run(args: ShareArgs) -> CmdResult {
    let pricing = Config::load()?.pricing;
    let text = CompletionSummary::new(args.count, &pricing).share_text();

    if args.print {
        println!("{text}");
        return Ok(());
    }

    match share_or_copy(&text, &OpenShare, &ClipboardShare) {
        ShareOutcome::Shared => println!("opened share page"),
        ShareOutcome::Copied => println!("copied to clipboard"),
        ShareOutcome::Failed { reason } => {
            println!("{text}");
            return Err(CoreError::Custom(format!("could not share: {reason}")));
        }
    }
    Ok(())
}
