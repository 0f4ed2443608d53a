mod commands;
mod config;
mod daemon;
mod signal;
mod store;

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use selector::SavedSelection;

/// Picks audio and subtitle tracks for the files mpv plays
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Read this config file instead of the default one
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// mpv's ipc socket, overrides the config
    #[arg(long, global = true)]
    socket: Option<PathBuf>,
    /// Log everything
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Select tracks for every file mpv loads
    Run,
    /// Select tracks once for the file mpv is playing
    Select {
        /// Look up the saved selection of this path instead of mpv's
        path: Option<String>,
    },
    /// Show the tracks of the file mpv is playing
    Tracks,
    /// Inspect or change the saved selections
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
}

#[derive(Subcommand, Clone)]
enum SavedAction {
    List,
    Forget {
        path: String,
    },
    Set {
        path: String,
        /// 0 means nothing is saved
        #[arg(long, default_value_t = 0)]
        audio: i64,
        /// 0 means subtitles are off
        #[arg(long, default_value_t = 0)]
        subtitle: i64,
    },
}

fn init_logger(journal: bool, verbose: bool) {
    use log::LevelFilter;
    use systemd_journal_logger::{connected_to_journal, JournalLog};

    const TARGETS: &[&str] = &["trackd", "selector", "mpvipc"];

    fn ours(target: &str) -> bool {
        TARGETS.iter().any(|t| target.starts_with(t))
    }

    fn install_systemd_logger() -> bool {
        struct FilteringJournalLog(JournalLog);
        impl log::Log for FilteringJournalLog {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                log::Log::enabled(&self.0, metadata)
            }

            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) && ours(record.target()) {
                    log::Log::log(&self.0, record);
                }
            }

            fn flush(&self) {
                log::Log::flush(&self.0)
            }
        }

        let logger = match JournalLog::new() {
            Ok(logger) => logger,
            Err(e) => {
                eprintln!("Failed to create the systemd logger: {e:?}");
                return false;
            }
        };

        log::set_max_level(LevelFilter::Trace);
        log::set_boxed_logger(Box::new(FilteringJournalLog(logger)))
            .expect("no logger should have been set yet");
        true
    }

    fn install_stdout_logger(level: LevelFilter) {
        use fern_format::{Format, Stream};
        let mut dispatch = fern::Dispatch::new().level(LevelFilter::Off);
        for target in TARGETS {
            dispatch = dispatch.level_for(*target, level);
        }
        dispatch
            .format(Format::new().color_if_supported(Stream::Stdout).callback())
            .chain(std::io::stdout())
            .apply()
            .expect("no logger should have been set yet");
    }

    let level = if verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };

    if !journal || !connected_to_journal() || !install_systemd_logger() {
        install_stdout_logger(level);
    }
}

#[tokio::main]
async fn async_main(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run => daemon::run(config::socket()?).await,
        Commands::Select { path } => commands::select(config::socket()?, path).await,
        Commands::Tracks => commands::tracks(config::socket()?).await,
        Commands::Saved { action } => match action {
            SavedAction::List => commands::saved_list(),
            SavedAction::Forget { path } => commands::saved_forget(&path),
            SavedAction::Set {
                path,
                audio,
                subtitle,
            } => commands::saved_set(&path, SavedSelection::new(audio, subtitle)),
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(matches!(cli.command, Commands::Run), cli.verbose);

    if let Err(e) = config::init_config(cli.config.as_deref(), cli.socket) {
        log::error!("Failed to read config: {:?}", e);
        return ExitCode::FAILURE;
    }

    match async_main(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}
