// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bicap::app_config::{self, Settings};
use bicap::bridge::{BridgeClient, BridgeServer, HttpVendorFactory, LocalConnector};
use bicap::captions::{CaptionSource, HttpFetcher, TrackId};
use bicap::manifest::Manifest;
use bicap::session::{CaptionSession, Slot};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

/// Options shared by every command that runs a session
#[derive(Parser, Debug)]
struct SessionArgs {
    /// Saved player response (JSON)
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the caption tracks of a video
    Tracks {
        #[command(flatten)]
        session: SessionArgs,

        /// Also build the translated tracks (downloads the English caption)
        #[arg(short, long)]
        translations: bool,
    },

    /// Print the bilingual timeline of a video
    Show {
        #[command(flatten)]
        session: SessionArgs,

        /// Only print the lines on screen at this time (seconds)
        #[arg(short, long)]
        at: Option<f64>,

        /// Primary track id from `tracks` (e.g. n1, t3) instead of auto-selection
        #[arg(short, long)]
        primary: Option<TrackId>,

        /// Secondary track id from `tracks` instead of auto-selection
        #[arg(short, long)]
        secondary: Option<TrackId>,
    },

    /// Generate shell completions for bicap
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// bicap - Bilingual Captions
///
/// Lists, downloads and translates the caption tracks of a video and pairs
/// a primary and a secondary track into one bilingual timeline.
#[derive(Parser, Debug)]
#[command(name = "bicap")]
#[command(version)]
#[command(about = "Bilingual caption pipeline")]
#[command(long_about = "bicap reads a saved player response, builds the native and translated caption tracks, and prints them side by side.

EXAMPLES:
    bicap tracks manifest.json                  # List native tracks
    bicap tracks -t manifest.json               # Include translated tracks
    bicap show manifest.json                    # Auto-select and print both rows
    bicap show -p t7 -s n1 manifest.json        # Explicit primary/secondary tracks
    bicap show --at 42.5 manifest.json          # Lines on screen at 42.5s
    bicap completions bash > bicap.bash         # Generate bash completions

CONFIGURATION:
    Settings are stored in conf.json by default. Keys missing from the file
    take their default values. If the file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level.max(log::max_level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config is loaded
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "bicap", &mut std::io::stdout());
            Ok(())
        }
        Commands::Tracks {
            session,
            translations,
        } => run_tracks(session, translations).await,
        Commands::Show {
            session,
            at,
            primary,
            secondary,
        } => run_show(session, at, primary, secondary).await,
    }
}

fn load_settings(options: &SessionArgs) -> Result<Settings> {
    if let Some(level) = options.log_level {
        log::set_max_level(level_filter(level.into()));
    }

    let config_path = Path::new(&options.config_path);
    let mut settings = if config_path.exists() {
        Settings::load(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", options.config_path);
        let settings = Settings::default();
        settings.save(config_path)?;
        settings
    };

    match options.log_level {
        Some(level) => settings.log_level = level.into(),
        None => log::set_max_level(level_filter(settings.log_level)),
    }

    settings.validate().context("Configuration validation failed")?;
    Ok(settings)
}

/// Session wired to real HTTP fetches and an in-process trusted bridge
fn build_session(options: &SessionArgs) -> Result<CaptionSession> {
    let settings = load_settings(options)?;
    let manifest = Manifest::load(&options.manifest)?;

    let client = reqwest::Client::new();
    let server = Arc::new(BridgeServer::new(
        settings.clone(),
        Arc::new(HttpVendorFactory::new(client.clone())),
    ));
    let bridge = Arc::new(BridgeClient::new(
        Arc::new(LocalConnector::new(server)),
        settings.redacted(),
    ));

    CaptionSession::from_manifest(
        &manifest,
        settings,
        Arc::new(HttpFetcher::with_client(client)),
        bridge,
    )
}

async fn run_tracks(options: SessionArgs, translations: bool) -> Result<()> {
    let session = build_session(&options)?;
    if translations {
        if let Err(e) = session.build_translations().await {
            error!("Failed to build translated tracks: {:#}", e);
        }
    }

    println!(
        "{}",
        session.video_id().unwrap_or("<unknown video>")
    );
    for (id, source) in session.manager().tracks() {
        let mut flags = Vec::new();
        if source.is_auto_generated() {
            flags.push("auto-generated");
        }
        if source.is_paid() {
            flags.push("paid");
        }
        println!(
            "  {:<4} {:<10} {:<8} {}{}",
            id.to_string(),
            source.language_code(),
            source.state().to_string(),
            source.display_name(),
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        );
    }
    Ok(())
}

async fn run_show(
    options: SessionArgs,
    at: Option<f64>,
    primary: Option<TrackId>,
    secondary: Option<TrackId>,
) -> Result<()> {
    let session = build_session(&options)?;
    session.start().await;

    for (slot, id) in [(Slot::Primary, primary), (Slot::Secondary, secondary)] {
        if let Some(id) = id {
            session
                .select(slot, id)
                .ok_or_else(|| anyhow!("No track with id {}", id))?;
        }
    }
    let selection = session.selection();

    for source in [&selection.primary, &selection.secondary].into_iter().flatten() {
        if let Err(e) = source.download().await {
            error!("{} unavailable: {}", source, e);
        }
    }
    info!(
        "Primary: {}, secondary: {}",
        describe(selection.primary.as_deref()),
        describe(selection.secondary.as_deref())
    );

    match at {
        Some(time) => {
            let (primary_lines, secondary_lines) = session.active_lines(time);
            for line in primary_lines.iter().chain(secondary_lines.iter()) {
                println!("{}", line.text);
            }
        }
        None => {
            let Some(primary) = selection.primary.as_ref() else {
                warn!("No primary caption selected");
                return Ok(());
            };
            for line in primary.lines().iter() {
                println!("[{:>8.2} → {:>8.2}] {}", line.start, line.end, line.text);
                if let Some(secondary) = selection.secondary.as_ref() {
                    for other in secondary.active_lines(line.start) {
                        println!("{:>23} {}", "", other.text);
                    }
                }
            }
        }
    }
    Ok(())
}

fn describe(source: Option<&CaptionSource>) -> String {
    source
        .map(|source| source.to_string())
        .unwrap_or_else(|| "none".to_string())
}
