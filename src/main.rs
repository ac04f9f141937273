use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};

use item_sound_effects::{
    AppResult, AudioBackend, Config, ItemCatalog, MemoryBackend, RodioBackend, ScanReport,
    SfxHost, SoundOverride,
};

const LOG_TARGET_STARTUP: &str = "item_sfx::startup";

/// Update rate used to drive fades
const FRAME: Duration = Duration::from_nanos(16_666_667);

/// Upper bound on how long `play` waits for a fade-out to finish
const FADE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "item-sfx", version, about = "Custom item sound effects")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the SFX folder and report which items get custom sounds
    Scan {
        /// Config file (defaults to config/config.json next to the executable)
        #[arg(long)]
        config: Option<PathBuf>,

        /// SFX root to scan instead of the configured one
        #[arg(long)]
        root: Option<PathBuf>,

        /// Item catalog instead of the configured one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Check files without opening an audio device
        #[arg(long)]
        headless: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play one item's custom sound through the default output device
    Play {
        /// Item id, raw name or display name
        item: String,

        #[arg(long, value_enum, default_value_t = SlotArg::Action)]
        slot: SlotArg,

        /// How long the action sound plays before it is faded out
        #[arg(long, default_value_t = 1000)]
        hold_ms: u64,

        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SlotArg {
    Action,
    Use,
}

/// Initialize tracing with file rotation
///
/// Logs are written to `<config dir>/ItemSoundEffects/logs/item-sfx.YYYY-MM-DD.log`.
/// Debug builds also log to stderr; stdout is kept for reports.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("ItemSoundEffects").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "item-sfx.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!(target: LOG_TARGET_STARTUP, "Log directory: {}", log_dir.display());
}

fn load_config(path: Option<PathBuf>) -> AppResult<(Config, PathBuf)> {
    let path = match path {
        Some(path) => path,
        None => Config::config_path().context("Failed to locate config file")?,
    };
    let config = Config::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok((config, path))
}

fn load_catalog(config: &Config, config_file: &Path, path: Option<PathBuf>) -> AppResult<ItemCatalog> {
    let path = path.unwrap_or_else(|| config.resolve(config_file, &config.catalog_path));
    let catalog = ItemCatalog::load(&path)
        .with_context(|| format!("Failed to load item catalog from {}", path.display()))?;
    tracing::info!(target: LOG_TARGET_STARTUP, "Loaded {} item(s) from {}", catalog.len(), path.display());
    Ok(catalog)
}

fn open_backend(config: &Config, headless: bool) -> AppResult<Rc<dyn AudioBackend>> {
    if headless {
        return Ok(Rc::new(MemoryBackend::new()));
    }
    let backend = RodioBackend::new(config.buses.clone()).context("Failed to open audio output")?;
    Ok(Rc::new(backend))
}

fn print_report(report: &ScanReport) {
    for scanned in &report.registered {
        println!("✓ {} ({}): {}", scanned.folder, scanned.item.id, scanned.outcome);
    }
    for scanned in &report.rejected {
        println!("✗ {} ({}): {}", scanned.folder, scanned.item.id, scanned.outcome);
    }
    for skipped in &report.skipped {
        println!("- {}: skipped ({:?})", skipped.folder, skipped.reason);
    }
    println!(
        "\n{} registered, {} rejected, {} skipped",
        report.registered.len(),
        report.rejected.len(),
        report.skipped.len()
    );
}

fn run_scan(
    config: Option<PathBuf>,
    root: Option<PathBuf>,
    catalog: Option<PathBuf>,
    headless: bool,
    json: bool,
) -> AppResult<()> {
    let (mut config, config_file) = load_config(config)?;
    let catalog = load_catalog(&config, &config_file, catalog)?;

    if let Some(root) = root {
        let root = std::env::current_dir()
            .context("Failed to read working directory")?
            .join(root);
        config.sfx_dir = root.display().to_string();
    }

    let backend = open_backend(&config, headless)?;
    let host = SfxHost::start(&config, &config_file, backend, catalog)
        .context("Failed to scan SFX folder")?;

    if json {
        let text = serde_json::to_string_pretty(host.report()).context("Failed to encode report")?;
        println!("{}", text);
    } else {
        println!("SFX root: {}\n", host.sfx_root().display());
        print_report(host.report());
    }

    host.stop();
    Ok(())
}

/// Call `update` at frame rate for `duration`, or until `done` returns true
fn drive(host: &SfxHost, duration: Duration, done: impl Fn(&SfxHost) -> bool) {
    let start = Instant::now();
    let mut last = start;
    while start.elapsed() < duration && !done(host) {
        thread::sleep(FRAME);
        let now = Instant::now();
        host.update((now - last).as_secs_f32());
        last = now;
    }
}

fn run_play(item: String, slot: SlotArg, hold_ms: u64, config: Option<PathBuf>) -> AppResult<()> {
    let (config, config_file) = load_config(config)?;
    let catalog = load_catalog(&config, &config_file, None)?;
    let backend = open_backend(&config, false)?;
    let host = SfxHost::start(&config, &config_file, backend, catalog)
        .context("Failed to scan SFX folder")?;

    let registry = host.registry();
    if registry.get(item.as_str()).is_none() {
        bail!("No custom sounds registered for '{}'", item);
    }

    let hold = Duration::from_millis(hold_ms);
    match slot {
        SlotArg::Action => {
            if registry.on_action_sound(item.as_str()) == SoundOverride::Default {
                bail!("'{}' has no custom action sound", item);
            }
            drive(&host, hold, |_| false);
            registry.on_stop_sound(item.as_str());
            drive(&host, FADE_TIMEOUT, |host| host.registry().active_fades() == 0);
        }
        SlotArg::Use => {
            if registry.on_use_sound(item.as_str()) == SoundOverride::Default {
                bail!("'{}' has no custom use sound", item);
            }
            drive(&host, hold, |_| false);
        }
    }

    host.stop();
    Ok(())
}

fn main() -> AppResult<()> {
    initialize_tracing();
    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "item-sfx {} starting",
        env!("CARGO_PKG_VERSION")
    );

    match Cli::parse().command {
        Command::Scan {
            config,
            root,
            catalog,
            headless,
            json,
        } => run_scan(config, root, catalog, headless, json),
        Command::Play {
            item,
            slot,
            hold_ms,
            config,
        } => run_play(item, slot, hold_ms, config),
    }
}
