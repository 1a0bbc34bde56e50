use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use smoketrace_core::storage::{data_dir, load_or_create_user_id};
use smoketrace_core::{
    AppUpdate, Config, CoreError, Event, PointerEvent, PointerKind, RemoteStore, SessionApp,
};

use super::CmdResult;
use crate::surfaces::{CountdownInterstitial, PrintSummary, TerminalRender};

#[derive(Args)]
pub struct SimulateArgs {
    /// Steps separated by spaces or commas: press, release, leave,
    /// touch-press, touch-release, wait:<ms>
    #[arg(long)]
    script: String,
    /// Keep counts local instead of writing to the shared database
    #[arg(long)]
    offline: bool,
    /// Print events and the summary as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Pointer(PointerEvent),
    Wait(Duration),
}

pub fn parse_script(script: &str) -> Result<Vec<Step>, String> {
    script
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(parse_step)
        .collect()
}

fn parse_step(token: &str) -> Result<Step, String> {
    if let Some(ms) = token.strip_prefix("wait:") {
        let ms: u64 = ms
            .parse()
            .map_err(|_| format!("invalid wait duration: {token}"))?;
        return Ok(Step::Wait(Duration::from_millis(ms)));
    }
    let event = match token {
        "press" => PointerEvent::mouse(PointerKind::Down),
        "release" => PointerEvent::mouse(PointerKind::Up),
        "leave" => PointerEvent::mouse(PointerKind::Leave),
        "touch-press" => PointerEvent::touch(PointerKind::Down),
        "touch-release" => PointerEvent::touch(PointerKind::Up),
        other => return Err(format!("unknown step: {other}")),
    };
    Ok(Step::Pointer(event))
}

pub async fn run(args: SimulateArgs) -> CmdResult {
    let config = Config::load()?;
    let steps = parse_script(&args.script).map_err(CoreError::Custom)?;
    let user_id = load_or_create_user_id(&data_dir()?)?;
    let store = if args.offline {
        RemoteStore::offline(&config.store, &user_id)
    } else {
        RemoteStore::from_config(&config.store, &user_id)?
    };

    let (app, mut updates) = SessionApp::start(
        &config,
        Arc::new(store),
        Arc::new(CountdownInterstitial::new(config.interstitial.clone())),
        Arc::new(PrintSummary::new(args.json)),
        TerminalRender::new(!args.json),
    );

    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            if let AppUpdate::Event(event) = update {
                print_event(&event, json);
            }
        }
    });

    for step in steps {
        match step {
            Step::Pointer(event) => app.pointer(event),
            Step::Wait(duration) => tokio::time::sleep(duration).await,
        }
    }

    let count = app.shutdown().await;
    printer
        .await
        .map_err(|e| CoreError::Custom(format!("event printer failed: {e}")))?;
    if json {
        println!("{}", serde_json::json!({ "type": "Finished", "count": count }));
    } else {
        println!("finished: {count} cigarette(s) this session");
    }
    Ok(())
}

fn print_event(event: &Event, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
        return;
    }
    match event {
        Event::BurnStarted { mode, progress, .. } => {
            eprintln!();
            println!("burning ({mode:?}) from {progress}%");
        }
        Event::BurnStopped { progress, .. } => {
            eprintln!();
            println!("stopped at {progress}%");
        }
        Event::AutoCancelled { progress, .. } => {
            eprintln!();
            println!("auto burn cancelled at {progress}%");
        }
        Event::SessionCompleted { count, .. } => {
            eprintln!();
            println!("cigarette finished (#{count})");
        }
        Event::Ticked { .. } | Event::StateSnapshot { .. } => {}
    }
}
