//! active-window-notifier - user daemon relaying active window changes to D-Bus.
//!
//! Watches the window manager for activations and sends a one-way
//! `NotifyActiveWindow` call per activation.

use std::path::PathBuf;
use std::time::Duration;

use active_window_notifier::ActivationEvent;
use active_window_notifier::ActivationSource;
use active_window_notifier::EventForwarder;
use active_window_notifier::Notifier;
use active_window_notifier::config::Config;
use active_window_notifier::notifier::Bus;
use active_window_notifier::notifier::DbusNotifier;
use active_window_notifier::notifier::DryRunNotifier;
use active_window_notifier::source::HyprlandSource;
use active_window_notifier::source::JsonLinesSource;
use active_window_notifier::source::SourceError;
use active_window_notifier::source::SourceKind;
use active_window_notifier::source::X11Source;
use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Active window notifier.
///
/// Sends `NotifyActiveWindow` to ink.chyk.GesturesHelper whenever a window
/// gains focus.
#[derive(Parser, Debug)]
#[command(name = "active-window-notifier")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Activation source (overrides config).
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Message bus to send on (overrides config).
    #[arg(long, value_enum)]
    bus: Option<Bus>,

    /// Enable dry-run mode (log calls instead of sending them).
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print activation events to stdout.
    #[arg(long)]
    print_events: bool,

    /// Run in oneshot mode: connect, print a few events, then exit.
    #[arg(long)]
    oneshot: bool,

    /// Number of events to capture in oneshot mode.
    #[arg(long, default_value = "5")]
    oneshot_count: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("active-window-notifier v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(source) = args.source {
        config.source = source;
    }
    if let Some(bus) = args.bus {
        config.bus = bus;
    }
    if args.dry_run {
        config.dry_run = true;
    }

    info!(
        "Configuration loaded (source={:?}, bus={:?}, dry_run={})",
        config.source, config.bus, config.dry_run
    );

    let mut source = connect_source(config.source).await?;

    if args.oneshot {
        return run_oneshot(source.as_mut(), args.oneshot_count).await;
    }

    run_daemon(&config, source, args.print_events).await
}

/// Initialize logging with the specified level.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("active_window_notifier={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}

/// Connect the configured activation source.
async fn connect_source(kind: SourceKind) -> Result<Box<dyn ActivationSource>> {
    match kind {
        SourceKind::Hyprland => {
            for diag in HyprlandSource::get_diagnostics() {
                debug!("{}", diag);
            }
            match HyprlandSource::connect().await {
                Ok(source) => Ok(Box::new(source)),
                Err(e) => {
                    error!("Hyprland environment not detected.");
                    for diag in HyprlandSource::get_diagnostics() {
                        error!("  {}", diag);
                    }
                    error!(
                        "If running as a systemd user service, see: \
                         dbus-update-activation-environment --systemd XDG_RUNTIME_DIR"
                    );
                    Err(e).context("Failed to connect to Hyprland")
                }
            }
        }
        SourceKind::X11 => Ok(Box::new(
            X11Source::connect().context("Failed to connect to X11 display")?,
        )),
        SourceKind::Stdin => {
            info!("Reading JSON activation events from stdin");
            Ok(Box::new(JsonLinesSource::stdin()))
        }
    }
}

/// Run in oneshot mode: capture a few events and exit without forwarding.
async fn run_oneshot(source: &mut dyn ActivationSource, count: usize) -> Result<()> {
    info!("Running in oneshot mode, capturing {} events", count);

    let mut captured = 0;
    while captured < count {
        match tokio::time::timeout(Duration::from_secs(30), source.next_event()).await {
            Ok(Ok(event)) => {
                captured += 1;
                println!("[{captured}] | {}", describe(&event));
            }
            Ok(Err(e)) => {
                error!("Activation source error: {}", e);
                break;
            }
            Err(_) => {
                warn!("Timeout waiting for activation events");
                break;
            }
        }
    }

    info!("Oneshot mode complete, captured {} events", captured);
    Ok(())
}

/// Run daemon: subscribe once and forward until the source gives up.
async fn run_daemon(
    config: &Config,
    source: Box<dyn ActivationSource>,
    print_events: bool,
) -> Result<()> {
    let notifier: Box<dyn Notifier> = if config.dry_run {
        Box::new(DryRunNotifier)
    } else {
        Box::new(
            DbusNotifier::connect(config.bus)
                .await
                .context("Failed to connect to message bus")?,
        )
    };

    let forwarder = EventForwarder::new(notifier);
    let mut source = PrintingSource {
        inner: source,
        print: print_events,
    };

    info!("Daemon started, waiting for activation events...");

    let err = forwarder.subscribe(&mut source).await;
    Err(err).context("Activation source stopped")
}

/// Wraps a source to echo each event to stdout before it is forwarded.
struct PrintingSource {
    inner: Box<dyn ActivationSource>,
    print: bool,
}

#[async_trait]
impl ActivationSource for PrintingSource {
    async fn next_event(&mut self) -> Result<ActivationEvent, SourceError> {
        let event = self.inner.next_event().await?;
        if self.print {
            println!("[ACTIVATED] | {}", describe(&event));
        }
        Ok(event)
    }
}

fn describe(event: &ActivationEvent) -> String {
    format!(
        "caption={:?} class={:?} name={:?}",
        event.caption, event.resource_class, event.resource_name
    )
}
