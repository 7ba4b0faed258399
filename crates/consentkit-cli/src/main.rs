//! consentkit: inspect consent status and stored consent from the shell.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use consentkit_core::{normalize_scope, ConsentState, ConsentStatus, DialogMode, EngineOptions, SdkConfig};
use consentkit_decode::ConsentExport;
use consentkit_engine::{ConsentEngine, EnginePhase};
use consentkit_store::{keys, MemoryStore, PreferenceStore, SqliteStore};

#[derive(Debug, PartialEq)]
enum Command {
    Status {
        site_id: String,
        version: Option<String>,
        store: Option<PathBuf>,
    },
    Decode {
        store: PathBuf,
    },
    State {
        scope: String,
        force: bool,
    },
    Help,
}

fn resolve_config_path() -> PathBuf {
    std::env::var("CONSENTKIT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("consentkit.json"))
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some(command) = args.get(1) else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "status" => {
            let mut site_id = std::env::var("CONSENTKIT_SITE_ID").ok();
            let mut version = None;
            let mut store = None;
            let mut rest = args[2..].iter();
            while let Some(arg) = rest.next() {
                match arg.as_str() {
                    "--version" => version = Some(rest.next().context("--version needs a token")?.clone()),
                    "--store" => store = Some(PathBuf::from(rest.next().context("--store needs a path")?)),
                    other if other.starts_with("--") => bail!("Unknown option: {}", other),
                    other => site_id = Some(other.to_string()),
                }
            }
            let site_id = site_id.context("Usage: consentkit status <site-id> [--version <token>] [--store <db>]")?;
            Ok(Command::Status { site_id, version, store })
        }
        "decode" => {
            let store = args
                .get(2)
                .context("Usage: consentkit decode <store.db>")?;
            Ok(Command::Decode {
                store: PathBuf::from(store),
            })
        }
        "state" => {
            let scope = args
                .get(2)
                .context("Usage: consentkit state <scope> [force]")?
                .clone();
            let force = match args.get(3).map(String::as_str) {
                None | Some("false") => false,
                Some("force") | Some("true") => true,
                Some(other) => bail!("Expected 'force', 'true' or 'false', got {}", other),
            };
            Ok(Command::State { scope, force })
        }
        "--help" | "-h" | "help" => Ok(Command::Help),
        other => bail!("Unknown command: {}. Run 'consentkit help'.", other),
    }
}

fn print_help() {
    println!("consentkit: consent status and stored consent inspector");
    println!();
    println!("Usage: consentkit <command>");
    println!();
    println!("Commands:");
    println!("  status <site-id> [--version <token>] [--store <db>]");
    println!("                           Fetch the consent status and print the engine state");
    println!("  decode <store.db>        Print the decoded consent stored in a preferences database");
    println!("  state <scope> [force]    Evaluate the consent state for a scope offline");
    println!("  help                     Show this help");
    println!();
    println!("Environment:");
    println!("  CONSENTKIT_CONFIG        Engine options file (default: consentkit.json)");
    println!("  CONSENTKIT_STATUS_URL    Consent status origin");
    println!("  CONSENTKIT_SITE_ID       Default site id for 'status'");
    println!("  CONSENTKIT_INTEGRATIONS  Enabled integrations (comma separated)");
    println!("  RUST_LOG                 Log filter (overrides the configured logs mode)");
}

fn open_store(path: Option<&Path>) -> anyhow::Result<Arc<dyn PreferenceStore>> {
    let store: Arc<dyn PreferenceStore> = match path {
        Some(path) => Arc::new(
            SqliteStore::open(path).with_context(|| format!("opening store {}", path.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

async fn run_status(
    options: EngineOptions,
    site_id: String,
    version: Option<String>,
    store: Option<PathBuf>,
) -> anyhow::Result<bool> {
    let store = open_store(store.as_deref())?;
    if let Some(version) = version {
        store.put_string(keys::SERVER_REQUEST_VERSION, &version)?;
    }

    let engine = ConsentEngine::builder(store).options(options).build()?;
    engine.initialize(SdkConfig::new(site_id))?.wait().await;

    let snapshot = engine.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(snapshot.phase == EnginePhase::Ready)
}

fn run_decode(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("Store not found: {}", path.display());
    }
    let store = open_store(Some(path))?;
    let snapshot = ConsentExport::new(store).snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn evaluate_state(scope: &str, force: bool) -> serde_json::Value {
    let status = ConsentStatus::scoped(normalize_scope(scope), force);
    serde_json::json!({
        "status": status,
        "state": ConsentState::derive(Some(&status)),
        "opensDefault": DialogMode::Default.permits(&status),
        "opensResurface": DialogMode::Resurface.permits(&status),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = EngineOptions::load(&resolve_config_path());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("info,{}", options.logs_mode.directive()))
        }))
        .init();

    let args: Vec<String> = std::env::args().collect();
    match parse_args(&args)? {
        Command::Status {
            site_id,
            version,
            store,
        } => {
            info!("Checking consent status for site {}", site_id);
            let ready = run_status(options, site_id, version, store).await?;
            std::process::exit(if ready { 0 } else { 1 });
        }
        Command::Decode { store } => run_decode(&store)?,
        Command::State { scope, force } => {
            println!("{}", serde_json::to_string_pretty(&evaluate_state(&scope, force))?);
        }
        Command::Help => print_help(),
    }
    Ok(())
}
