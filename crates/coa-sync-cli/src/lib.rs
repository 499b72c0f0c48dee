mod config;
mod show;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, CommandFactory as _, Parser, Subcommand};
use coa_sync::reconcile::SyncConfig;
use coa_sync::source::{CsvSource, SourceReader as _};
use coa_sync::target::{LedgerFile, TargetSystem as _};
use coa_sync::writer::{WriteConfig, Writer};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt};

use config::{Config, ConfigLog};
use show::ReportOptions;

const DEFAULT_LOG_FILTER: &str = "coa_sync=info,coa_sync_cli=info";

#[derive(Parser)]
#[command(
    name = "coa-sync",
    about = "Reconcile a chart of accounts against a target and add the missing accounts"
)]
#[command(disable_help_subcommand = true)]
struct Args {
    #[command(flatten)]
    files: FileArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(ClapArgs)]
struct FileArgs {
    /// Config file. Defaults to coa-sync.toml or .coa-sync.toml in the working directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// CSV export of the chart of accounts
    #[arg(short, long, global = true)]
    source: Option<PathBuf>,

    /// Ledger file of the target system
    #[arg(short, long, global = true)]
    target: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile and add the new accounts to the target (default)
    Sync {
        /// Also list unchanged accounts
        #[arg(short, long)]
        all: bool,
    },
    /// Show differences between the source and the target without writing anything
    Diff {
        /// Also list unchanged accounts
        #[arg(short, long)]
        all: bool,
    },
    /// List the accounts stored in the target
    List,
    /// Add every source account to the target without reconciling first
    Add,
    /// Delete accounts from the target
    Delete {
        /// Target ids of the accounts to delete
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Source, target and write settings after merging flags over the config file.
struct Settings {
    source: Option<PathBuf>,
    target: Option<PathBuf>,
    write: WriteConfig,
}

impl Settings {
    fn new(files: FileArgs, base_dir: &Path, config: &Config) -> Self {
        let source = files.source.or_else(|| {
            let source = config.source.as_ref()?;
            Some(base_dir.join(&source.file))
        });
        let target = files.target.or_else(|| {
            let target = config.target.as_ref()?;
            Some(base_dir.join(&target.ledger))
        });

        Settings {
            source,
            target,
            write: WriteConfig::from(&config.sync),
        }
    }

    fn source(&self) -> Result<CsvSource> {
        let path = self.source.as_ref().context(
            "No source file given. Pass --source or set `file` in the [source] section of coa-sync.toml",
        )?;
        Ok(CsvSource::new(path))
    }

    fn target(&self) -> Result<LedgerFile> {
        let path = self.target.as_ref().context(
            "No target ledger given. Pass --target or set `ledger` in the [target] section of coa-sync.toml",
        )?;
        Ok(LedgerFile::new(path))
    }
}

pub fn run(args: impl IntoIterator<Item = String>) -> Result<()> {
    clap_complete::CompleteEnv::with_factory(Args::command).complete();

    let args = Args::parse_from(args);

    let (base_dir, config) = match &args.files.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::find_and_load()?.unwrap_or_default(),
    };
    init_logging(&config.log, &base_dir)?;

    let settings = Settings::new(args.files, &base_dir, &config);
    debug!(
        "Source {:?}, target {:?}, policy {:?}",
        settings.source, settings.target, settings.write.on_error
    );
    let command = args.command.unwrap_or(Commands::Sync { all: false });
    match command {
        Commands::Sync { all } => show::show_sync(
            &settings.source()?,
            &mut settings.target()?,
            &SyncConfig::new(settings.write.clone()),
            ReportOptions {
                dry_run: false,
                all,
            },
        ),
        Commands::Diff { all } => show::show_sync(
            &settings.source()?,
            &mut settings.target()?,
            &SyncConfig {
                write_back: false,
                write: settings.write.clone(),
            },
            ReportOptions { dry_run: true, all },
        ),
        Commands::List => show::show_accounts(&settings.target()?.load()?),
        Commands::Add => add_accounts(&settings),
        Commands::Delete { ids } => delete_accounts(&settings, &ids),
    }
}

fn init_logging(log: &ConfigLog, base_dir: &Path) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives = log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
            EnvFilter::try_new(directives)
                .with_context(|| format!("Invalid log filter in config: '{directives}'"))?
        }
    };

    let audit_log = match &log.file {
        Some(path) => {
            let path = base_dir.join(path);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(audit_log)
        .try_init();

    Ok(())
}

fn add_accounts(settings: &Settings) -> Result<()> {
    let source = settings.source()?;
    let mut target = settings.target()?;

    let records = source.read_all()?;
    let write_back = Writer::new(&settings.write).add_accounts(&mut target, &records)?;

    for record in write_back.added() {
        let id = record.target_id.as_deref().unwrap_or_default();
        println!("Added {} [{id}]", record.name);
    }
    for failure in &write_back.failures {
        println!("Failed to add {}: {}", failure.name, failure.reason);
    }
    Ok(())
}

fn delete_accounts(settings: &Settings, ids: &[String]) -> Result<()> {
    let mut target = settings.target()?;
    let mut session = target.open_session()?;

    for id in ids {
        session
            .delete(id)
            .with_context(|| format!("Failed to delete account {id}"))?;
        println!("Deleted {id}");
    }

    Ok(())
}
