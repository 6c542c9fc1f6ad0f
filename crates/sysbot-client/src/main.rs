//! sysbot client entry point.
//!
//! Connects to a console automation peer, sends the controller configuration
//! handshake, runs one subcommand and disconnects.
//!
//! # Usage
//!
//! ```text
//! sysbot-client [OPTIONS] <COMMAND>
//!
//! Commands:
//!   info        Title ID, name, version and author of the running game
//!   title-id    Title ID only
//!   icon        Save the game icon as a JPEG (--out FILE)
//!   run         Replay a macro such as "+ZL,B,W1000,-ZL"
//!   stick       Deflect a stick: stick LEFT 0x7FFF 0 [--hold-ms 500]
//!   click       Press and release one button
//!
//! Options:
//!   --host <HOST>      Peer address [env: SYSBOT_HOST]
//!   --port <PORT>      Peer port [env: SYSBOT_PORT]
//!   --config <FILE>    Config file [env: SYSBOT_CONFIG]
//!   --pixel-peek-fallback
//! ```
//!
//! Flags override the config file; the config file overrides built-in
//! defaults.  Log verbosity comes from `RUST_LOG`, falling back to the
//! `[log] level` setting.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sysbot_core::domain::stick::parse_signed_hex;
use sysbot_core::{parse_macro, Button, SequenceStep, StickName, StickVector};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sysbot_client::application::configure_session::configure_controller;
use sysbot_client::application::query_game::QueryGameUseCase;
use sysbot_client::application::run_sequence::InputSequencer;
use sysbot_client::infrastructure::network::Session;
use sysbot_client::infrastructure::storage::config::{
    load_config, load_config_from, AppConfig, ConfigError,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote-control client for a console automation peer.
#[derive(Debug, Parser)]
#[command(
    name = "sysbot-client",
    about = "Query game metadata and inject controller input over the sysbot line protocol",
    version
)]
struct Cli {
    /// Hostname or IP address of the peer.
    #[arg(long, env = "SYSBOT_HOST")]
    host: Option<String>,

    /// TCP port of the peer.
    #[arg(long, env = "SYSBOT_PORT")]
    port: Option<u16>,

    /// Path to a TOML config file.  Defaults to the platform config directory.
    #[arg(long, env = "SYSBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Retry a failed icon fetch with `pixelPeek`.
    #[arg(long)]
    pixel_peek_fallback: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the running game's title ID, name, version and author.
    Info,
    /// Print the running game's title ID.
    TitleId,
    /// Save the running game's icon as a JPEG.
    Icon {
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Replay a comma-separated macro.
    Run {
        /// e.g. "+ZL,B,W1000,-ZL" or "%7FFF,0"
        sequence: String,
    },
    /// Set an analog stick, optionally returning it to neutral after a hold.
    Stick {
        /// LEFT or RIGHT
        stick: StickName,
        /// Signed hex X value, e.g. 0x7FFF or -0x8000
        #[arg(allow_hyphen_values = true, value_parser = parse_axis)]
        x: i64,
        /// Signed hex Y value (positive is up)
        #[arg(allow_hyphen_values = true, value_parser = parse_axis)]
        y: i64,
        /// Hold for this many milliseconds, then centre the stick.
        #[arg(long)]
        hold_ms: Option<u64>,
    },
    /// Press and release one button.
    Click { button: Button },
}

fn parse_axis(text: &str) -> Result<i64, String> {
    parse_signed_hex(text).ok_or_else(|| format!("{text:?} is not a signed hex value"))
}

/// Input validated before the session is opened.
#[derive(Debug, Default)]
enum Prepared {
    #[default]
    Nothing,
    Macro(Vec<SequenceStep>),
    Stick(StickVector),
}

/// Parses macros and range-checks stick values.  A bad value must fail
/// before anything touches the socket.
fn prepare(command: &Commands) -> anyhow::Result<Prepared> {
    match command {
        Commands::Run { sequence } => parse_macro(sequence)
            .map(Prepared::Macro)
            .with_context(|| format!("invalid macro {sequence:?}")),
        Commands::Stick { x, y, .. } => StickVector::try_new(*x, *y)
            .map(Prepared::Stick)
            .context("invalid stick value"),
        _ => Ok(Prepared::Nothing),
    }
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    fn app_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => match load_config() {
                Ok(config) => config,
                Err(ConfigError::NoPlatformConfigDir) => AppConfig::default(),
                Err(e) => return Err(e).context("failed to load config"),
            },
        };

        if let Some(host) = &self.host {
            config.console.host = host.clone();
        }
        if let Some(port) = self.port {
            config.console.port = port;
        }
        if self.pixel_peek_fallback {
            config.icon.pixel_peek_fallback = true;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.app_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log.level.as_str())),
        )
        .init();

    let prepared = prepare(&cli.command)?;

    let addr = config.address();
    let mut session = Session::connect(&addr, config.session_config())
        .await
        .with_context(|| format!("could not reach peer at {addr}"))?;
    configure_controller(&mut session, &config.controller_config())
        .await
        .context("controller configuration failed")?;

    let result = run_command(cli.command, prepared, &mut session, &config).await;
    session.disconnect().await;
    result
}

async fn run_command(
    command: Commands,
    prepared: Prepared,
    session: &mut Session,
    config: &AppConfig,
) -> anyhow::Result<()> {
    match (command, prepared) {
        (Commands::Info, _) => {
            let info = QueryGameUseCase::new(session, config.icon_options())
                .get_game_info()
                .await
                .context("game info query failed")?;
            println!("title id: {}", info.title_id);
            println!("name:     {}", info.name);
            println!("version:  {}", info.version);
            println!("author:   {}", info.author);
        }

        (Commands::TitleId, _) => {
            let title_id = QueryGameUseCase::new(session, config.icon_options())
                .get_title_id()
                .await
                .context("title ID query failed")?;
            println!("{title_id}");
        }

        (Commands::Icon { out }, _) => {
            let mut query = QueryGameUseCase::new(session, config.icon_options());
            let title_id = query.get_title_id().await.context("title ID query failed")?;
            if title_id.is_no_game_running() {
                bail!("no game running; there is no icon to fetch");
            }
            let icon = query.get_game_icon().await.context("icon fetch failed")?;
            tokio::fs::write(&out, icon.as_bytes())
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!("wrote {} byte icon to {}", icon.len(), out.display());
        }

        (Commands::Run { .. }, Prepared::Macro(steps)) => {
            let mut sequencer = InputSequencer::new(session);
            if let Err(e) = sequencer.replay(&steps).await {
                warn!("macro aborted; releasing held inputs");
                if let Err(cleanup) = sequencer.reset_inputs().await {
                    warn!("cleanup failed: {cleanup}");
                }
                return Err(e).context("macro failed");
            }
            info!("macro finished ({} steps)", steps.len());
        }

        (Commands::Stick { stick, hold_ms, .. }, Prepared::Stick(vector)) => {
            let mut sequencer = InputSequencer::new(session);
            match hold_ms {
                Some(ms) => sequencer
                    .deflect_stick_for(stick, vector, Duration::from_millis(ms))
                    .await
                    .context("stick deflection failed")?,
                None => sequencer
                    .set_stick_vector(stick, vector)
                    .await
                    .context("setStick failed")?,
            }
        }

        (Commands::Click { button }, _) => {
            InputSequencer::new(session)
                .click(button)
                .await
                .with_context(|| format!("click {button} failed"))?;
        }

        (command, prepared) => bail!("{command:?} was not prepared ({prepared:?})"),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
