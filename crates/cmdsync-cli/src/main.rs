mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::backup::BackupSubcommand;
use cmd::command::{AddArgs, EditArgs, Selector};
use cmd::config::ConfigSubcommand;
use cmd::Ctx;
use cmdsync_core::{Scope, Service};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cmdsync",
    about = "Keep AI assistant commands in sync across Claude Code, Cursor and Windsurf",
    version,
    propagate_version = true
)]
struct Cli {
    /// Home directory holding each service's user commands (default: $HOME)
    #[arg(long, global = true, env = "CMDSYNC_HOME")]
    home: Option<PathBuf>,

    /// Project root (default: auto-detect from .git/)
    #[arg(long, global = true, env = "CMDSYNC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which services are installed, enabled and how many commands each holds
    Status,

    /// List commands across services
    List {
        #[arg(long, short = 's')]
        service: Option<Service>,
        #[arg(long)]
        scope: Option<Scope>,
        /// Case-insensitive text search over name, description and content
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one command in full
    Show {
        #[command(flatten)]
        selector: Selector,
    },

    /// Create a command in one service
    Add(AddArgs),

    /// Change a command's description, body, globs or mode
    Edit(EditArgs),

    /// Rename a command within its service
    Rename {
        #[command(flatten)]
        selector: Selector,
        /// New name
        new_name: String,
    },

    /// Delete a command
    Delete {
        #[command(flatten)]
        selector: Selector,
        /// Also delete the matching copies in every other service
        #[arg(long)]
        all_services: bool,
    },

    /// Copy a command into other services
    Sync {
        #[command(flatten)]
        selector: Selector,
        /// Target services, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        to: Vec<Service>,
    },

    /// Copy every command of one service into another
    SyncAll {
        #[arg(long)]
        from: Service,
        #[arg(long)]
        to: Service,
    },

    /// Show or set exactly which services hold a command
    Services {
        #[command(flatten)]
        selector: Selector,
        /// Services that should hold the command; empty removes it everywhere
        #[arg(long, value_delimiter = ',', num_args = 0..)]
        set: Option<Vec<Service>>,
    },

    /// Inspect and restore command file backups
    Backup {
        #[command(subcommand)]
        subcommand: BackupSubcommand,
    },

    /// Inspect and modify configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = Ctx::new(cli.home.as_deref(), root, cli.json).and_then(|mut ctx| {
        match cli.command {
            Commands::Status => cmd::status::run(&ctx),
            Commands::List {
                service,
                scope,
                search,
            } => cmd::command::list(&ctx, service, scope, search),
            Commands::Show { selector } => cmd::command::show(&ctx, selector),
            Commands::Add(args) => cmd::command::add(&ctx, args),
            Commands::Edit(args) => cmd::command::edit(&ctx, args),
            Commands::Rename { selector, new_name } => {
                cmd::command::rename(&ctx, selector, &new_name)
            }
            Commands::Delete {
                selector,
                all_services,
            } => cmd::command::delete(&ctx, selector, all_services),
            Commands::Sync { selector, to } => cmd::sync::sync_one(&ctx, selector, &to),
            Commands::SyncAll { from, to } => cmd::sync::sync_all(&ctx, from, to),
            Commands::Services { selector, set } => cmd::sync::services(&ctx, selector, set),
            Commands::Backup { subcommand } => cmd::backup::run(&ctx, subcommand),
            Commands::Config { subcommand } => cmd::config::run(&mut ctx, subcommand),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
