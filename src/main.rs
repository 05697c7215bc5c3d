//! mtb CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use mtb_tools::{
    commands::{
        cmd_check_db, cmd_clear_cache, cmd_dump, cmd_extract_history, cmd_import_history,
        cmd_init, cmd_populate_media, cmd_show_phase, print_check_report, print_clear_cache,
        print_dump_stats, print_extract_stats, print_import_stats, print_init_report,
        print_media_stats, print_phase_view, prompt_confirmation, ClearCacheOptions, InitOptions,
    },
    config::{Config, CONFIG_FILE_NAME, DEFAULT_CACHE_ALIAS},
    error::Result,
    phase::Phase,
    progress::LogWriterFactory,
    store::TargetDb,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "mtb")]
#[command(version, about = "Migration and maintenance tools for the mtb phase archive", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MTB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the target database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Dump every table of a SQLite database to JSON
    Dump {
        /// Path to the SQLite database file
        db_file: PathBuf,

        /// Path to the output JSON file
        output_file: PathBuf,
    },

    /// Extract history rows with cleaned content to JSON and a text preview
    #[command(alias = "history-extract")]
    ExtractHistory {
        /// Path to the SQLite database file
        db_file: PathBuf,

        /// Path to the output JSON file
        output_file: PathBuf,
    },

    /// Import history from the legacy database, creating missing pages
    #[command(alias = "history-import")]
    ImportHistory,

    /// Populate the media table from the phase folders
    #[command(alias = "media-populate")]
    PopulateMedia,

    /// Clear a configured cache
    #[command(alias = "cache-clear")]
    ClearCache {
        /// Skip confirmation prompt
        #[arg(long)]
        no_confirm: bool,

        /// Cache alias to clear
        #[arg(long, default_value = DEFAULT_CACHE_ALIAS)]
        alias: String,

        /// Clear only keys matching this glob pattern
        #[arg(long)]
        pattern: Option<String>,

        /// Show what would be cleared without clearing
        #[arg(long)]
        dry_run: bool,

        /// Show cache statistics before and after clearing
        #[arg(long)]
        show_stats: bool,
    },

    /// Report table counts of a database (defaults to the target database)
    CheckDb {
        /// Path to the SQLite database file
        db_file: Option<PathBuf>,
    },

    /// Show the media and history of a phase
    Show {
        /// Phase code, e.g. 1 or 01
        #[arg(long, default_value = "01")]
        phase: Phase,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    // Handle init command specially (doesn't need existing config)
    if let Commands::Init { force } = cli.command {
        let (base_dir, config_path) = init_paths(cli.config.as_deref());
        let report = cmd_init(InitOptions {
            base_dir,
            config_path,
            force,
        })
        .await?;
        return emit(cli.json, &report, print_init_report);
    }

    // Handle completions command (doesn't need config/db)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "mtb", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Dump {
            db_file,
            output_file,
        } => {
            let stats = cmd_dump(&db_file, &output_file).await?;
            emit(cli.json, &stats, print_dump_stats)?;
        }

        Commands::ExtractHistory {
            db_file,
            output_file,
        } => {
            let stats =
                cmd_extract_history(&db_file, &output_file, &config.import.table_hint).await?;
            emit(cli.json, &stats, print_extract_stats)?;
        }

        Commands::ImportHistory => {
            let db = TargetDb::open(&config.target_db_path()).await?;
            let result = cmd_import_history(&config, &db).await;
            db.close().await;
            emit(cli.json, &result?, print_import_stats)?;
        }

        Commands::PopulateMedia => {
            let db = TargetDb::open(&config.target_db_path()).await?;
            let result = cmd_populate_media(&config, &db).await;
            db.close().await;
            emit(cli.json, &result?, print_media_stats)?;
        }

        Commands::ClearCache {
            no_confirm,
            alias,
            pattern,
            dry_run,
            show_stats,
        } => {
            let options = ClearCacheOptions {
                alias,
                pattern,
                no_confirm,
                dry_run,
                show_stats,
            };
            let db = TargetDb::open(&config.target_db_path()).await?;
            let result = cmd_clear_cache(&config, &db, &options, &prompt_confirmation).await;
            db.close().await;
            emit(cli.json, &result?, print_clear_cache)?;
        }

        Commands::CheckDb { db_file } => {
            let path = db_file.unwrap_or_else(|| config.target_db_path());
            let report = cmd_check_db(&path).await?;
            emit(cli.json, &report, print_check_report)?;
        }

        Commands::Show { phase } => {
            let db = TargetDb::open(&config.target_db_path()).await?;
            let result = cmd_show_phase(&config, &db, phase).await;
            db.close().await;
            emit(cli.json, &result?, print_phase_view)?;
        }
    }

    Ok(())
}

/// Print a command result as pretty JSON or through its printer
fn emit<T: Serialize>(json: bool, value: &T, print: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

/// Base directory and config path for `init`
///
/// A `--config` path ending in `.toml` is the file itself, anything else is
/// treated as a directory.
fn init_paths(path: Option<&Path>) -> (PathBuf, PathBuf) {
    match path {
        Some(path) if path.extension().is_some_and(|e| e == "toml") => {
            let base = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            (base, path.to_path_buf())
        }
        Some(dir) => (dir.to_path_buf(), dir.join(CONFIG_FILE_NAME)),
        None => (PathBuf::from("."), Config::default_config_path()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
