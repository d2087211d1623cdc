use clap::{command, Parser};
use herald::{
    config::HeraldConfig,
    event::EventWaiter,
    platform::memory::{InMemoryPlatform, PlatformCall},
    ui::{
        component::{Embed, MessageContent, ACTION_FIRST, ACTION_LAST, ACTION_NEXT, ACTION_PREV},
        Paginator,
    },
    Error,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "herald.json")]
    config: PathBuf,

    /// Number of pages to render
    #[arg(short, long, default_value_t = 3)]
    pages: usize,

    /// Enable debug mode
    #[arg(short, long)]
    verbose: bool,
}

const CHANNEL: &str = "demo-channel";
const USER: &str = "demo-user";

async fn run(cli: &Cli) -> Result<(), Error> {
    let config = HeraldConfig::from_file(&cli.config)?;
    info!("config loaded.");
    debug!("config: {:?}", config);

    let platform = Arc::new(InMemoryPlatform::new());
    let waiter = Arc::new(EventWaiter::new());
    waiter.attach(platform.as_ref());

    let paginator = Paginator::with_config(platform.clone(), waiter, CHANNEL, &config);
    paginator
        .add((1..=cli.pages).map(|i| {
            MessageContent::embed(Embed {
                title: Some(format!("Page {}", i)),
                description: Some(format!("Content of page {}", i)),
                footer: None,
            })
        }))
        .await?;

    let deploy = tokio::spawn({
        let paginator = paginator.clone();
        async move { paginator.deploy().await }
    });

    let widget = paginator.widget();
    let message_id = wait_for(move || async move { widget.message_id().await }).await?;
    print_render(&platform, &message_id)?;

    let memory = platform.as_ref();
    for action in [ACTION_NEXT, ACTION_NEXT, ACTION_PREV, ACTION_LAST, ACTION_FIRST] {
        let updates = update_count(memory).await;
        platform.click(USER, &message_id, action);
        println!("> {}", action);
        let waited = wait_for(move || async move {
            (update_count(memory).await > updates).then_some(())
        })
        .await;
        if waited.is_err() {
            println!("  (no re-render)");
            continue;
        }
        print_render(&platform, &message_id)?;
    }

    paginator.widget().cancel().await?;
    let phase = deploy
        .await
        .map_err(|e| Error::internal(format!("Deploy task failed: {}", e)))??;
    println!("Paginator finished: {}", phase);
    print_render(&platform, &message_id)?;

    Ok(())
}

async fn update_count(platform: &InMemoryPlatform) -> usize {
    platform
        .calls()
        .await
        .iter()
        .filter(|call| matches!(call, PlatformCall::Update { .. }))
        .count()
}

async fn wait_for<T, F, Fut>(mut poll: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Option<T>>,
{
    for _ in 0..200 {
        if let Some(value) = poll().await {
            return Ok(value);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    Err(Error::internal("Timed out waiting for the demo to progress"))
}

fn print_render(platform: &InMemoryPlatform, message_id: &str) -> Result<(), Error> {
    let message = platform
        .message(message_id)
        .ok_or_else(|| Error::internal(format!("Message {} not found", message_id)))?;
    let json = serde_json::to_string_pretty(&message.content)
        .map_err(|e| Error::internal(format!("Failed to render message: {}", e)))?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
