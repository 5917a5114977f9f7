use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use budget_buddy_core::events::EventBus;
use budget_buddy_core::llm::{ProviderKind, TipProvider};
use budget_buddy_core::storage::{FileKvStore, TipCache};
use budget_buddy_core::tips::fallback::FallbackTips;
use budget_buddy_core::tips::session::{SessionState, TipSession};
use budget_buddy_core::tips::TipGenerator;

mod render;
mod snapshot;

#[derive(Debug, Parser)]
#[command(name = "budget_buddy", about = "Personalised financial tips from your budget figures")]
struct Args {
    /// Key-value store file. Defaults to <data dir>/budget_buddy/store.json.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show tips for a snapshot, reusing cached tips younger than 24h.
    Generate {
        /// FinancialSnapshot JSON file; `-` reads stdin.
        #[arg(long)]
        snapshot: PathBuf,

        /// Ignore the cache and ask the provider again.
        #[arg(long)]
        refresh: bool,
    },
    /// Print the cached tips if still fresh.
    Show,
    /// Remove the cached tips.
    Clear,
    /// Print which provider the current environment selects.
    Provider,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = budget_buddy_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

async fn run(args: Args, settings: &budget_buddy_core::config::Settings) -> anyhow::Result<()> {
    let store_path = resolve_store_path(args.store)?;
    let cache = TipCache::new(Arc::new(FileKvStore::new(&store_path)));
    tracing::debug!(store = %store_path.display(), "using tip store");

    match args.command {
        Command::Provider => {
            let kind = ProviderKind::select(settings);
            println!("{}", render::provider(kind, args.json)?);
        }
        Command::Clear => {
            cache.clear().await?;
            println!("cleared cached tips");
        }
        Command::Show => {
            let now = chrono::Utc::now();
            match cache.load(now).await? {
                Some(entry) => println!("{}", render::cache_entry(&entry, args.json)?),
                None => println!("no fresh cached tips"),
            }
        }
        Command::Generate {
            snapshot: snapshot_path,
            refresh,
        } => {
            let snapshot = snapshot::load(&snapshot_path).await?;
            let provider = TipProvider::from_settings(settings)?;
            let generator = Arc::new(TipGenerator::new(provider, FallbackTips::new()));
            let events = Arc::new(EventBus::new());
            let mut notifications = events.subscribe();
            let session = TipSession::new(generator, cache, Arc::clone(&events));

            let now = chrono::Utc::now();
            let mut state = if refresh {
                session.refresh(&snapshot, now).await
            } else {
                session.start(&snapshot, now).await
            };
            // Nothing cached and nothing to personalise from: generate anyway, the user asked.
            if state == SessionState::Uninitialized {
                state = session.refresh(&snapshot, now).await;
            }

            while let Some(n) = notifications.try_recv() {
                eprintln!("[{:?}] {}", n.level, n.message);
            }
            notifications.unsubscribe();

            match state {
                SessionState::Ready(set) => println!("{}", render::tip_set(&set, args.json)?),
                SessionState::Errored { error } => {
                    anyhow::bail!("{error}; run again with --refresh to regenerate")
                }
                other => anyhow::bail!("unexpected tip session state: {other:?}"),
            }
        }
    }

    Ok(())
}

fn resolve_store_path(arg: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }
    let base = dirs::data_local_dir().context("no local data directory; pass --store")?;
    Ok(base.join("budget_buddy").join("store.json"))
}

fn init_sentry(settings: &budget_buddy_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
