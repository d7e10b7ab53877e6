mod app_state;
mod cli;
mod headless;
mod transport;

use std::path::Path;

use sandframe_common::{ConfigError, SandframeError};
use sandframe_config::SandframeConfig;
use sandframe_webview::{SessionOptions, ThemeData};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

use app_state::{AppEvent, SandframeApp};

/// Build session options from config plus CLI overrides.
fn session_options(config: &SandframeConfig, dev: bool) -> SessionOptions {
    SessionOptions {
        promotion_delay: config.swap.promotion_delay(),
        development_mode: dev || config.development.devtools,
        theme: ThemeData::new(config.theme.variables.clone(), config.theme.name.clone()),
    }
}

fn init_logging(directive: &str) {
    let directive = directive
        .parse()
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();
}

fn run_headless(config: &SandframeConfig, options: SessionOptions) -> sandframe_common::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(headless::run(
        tokio::io::BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        options,
        config.scroll.frame_interval(),
    ))?;
    Ok(())
}

fn run_windowed(config: SandframeConfig, options: SessionOptions) -> sandframe_common::Result<()> {
    let event_loop = EventLoop::<AppEvent>::with_user_event()
        .build()
        .map_err(|e| SandframeError::Other(format!("failed to create event loop: {e}")))?;
    app_state::spawn_stdin_reader(event_loop.create_proxy())?;

    let mut app = SandframeApp::new(config, options);
    tracing::info!("Entering event loop");
    event_loop
        .run_app(&mut app)
        .map_err(|e| SandframeError::Other(format!("event loop error: {e}")))
}

fn main() {
    let args = cli::parse();

    // Config is read before logging starts so its level can apply; any
    // error is reported once the subscriber is installed.
    let loaded = sandframe_config::load_config(args.config.as_deref().map(Path::new));
    let level = args.log_level.clone().unwrap_or_else(|| match &loaded {
        Ok(config) => config.logging.level.clone(),
        Err(_) => SandframeConfig::default().logging.level,
    });
    init_logging(&level);

    tracing::info!("Sandframe v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(path)) => {
            tracing::error!("Config file not found: {}", path.display());
            std::process::exit(2);
        }
        Err(e) => {
            tracing::warn!("Config load failed, using defaults: {e}");
            SandframeConfig::default()
        }
    };
    let options = session_options(&config, args.dev);
    tracing::info!(
        theme = %config.theme.name,
        promotion_delay_ms = config.swap.promotion_delay_ms,
        development = options.development_mode,
        headless = args.headless,
        "Config loaded"
    );

    let result = if args.headless {
        run_headless(&config, options)
    } else {
        run_windowed(config, options)
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}
