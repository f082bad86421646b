pub mod backup;
pub mod command;
pub mod config;
pub mod status;
pub mod sync;

use anyhow::Context;
use cmdsync_core::availability::{available_services, HostDetector};
use cmdsync_core::config::Config;
use cmdsync_core::sync::SyncSettings;
use cmdsync_core::{paths, Command, CommandStore, Scope, Service, SyncEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a subcommand needs to reach the user's command files.
pub struct Ctx {
    pub home: PathBuf,
    pub root: Option<PathBuf>,
    pub config: Config,
    pub json: bool,
}

impl Ctx {
    pub fn new(home: Option<&Path>, root: Option<PathBuf>, json: bool) -> anyhow::Result<Self> {
        let home = paths::home_dir(home).context("failed to resolve home directory")?;
        let config = Config::load(&home).context("failed to load config")?;
        Ok(Self {
            home,
            root,
            config,
            json,
        })
    }

    /// Load every available service's user commands, then the commands of the
    /// current project and of each project remembered in config. Services that
    /// fail to load are logged and skipped.
    pub fn open_store(&self) -> anyhow::Result<CommandStore> {
        let available = available_services(&HostDetector::new(&self.home));
        let backups = Arc::new(self.config.backup_manager(&self.home));
        let mut store = CommandStore::for_host(&self.home, available).with_backups(backups);

        store.load_all();
        for root in self.project_roots() {
            store.load_project_commands(&root);
        }
        Ok(store)
    }

    /// The current root first, then configured projects, without repeats.
    fn project_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for root in self.root.iter().chain(self.config.projects.iter()) {
            if !roots.contains(root) {
                roots.push(root.clone());
            }
        }
        roots
    }

    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(SyncSettings::from_config(&self.config))
    }

    pub fn project_root(&self) -> anyhow::Result<&Path> {
        self.root
            .as_deref()
            .context("no project root; pass --root or run inside a git repository")
    }

    /// Pick the single command called `name`, narrowed by service and scope.
    pub fn select(
        &self,
        store: &CommandStore,
        name: &str,
        service: Option<Service>,
        scope: Option<Scope>,
    ) -> anyhow::Result<Command> {
        let candidates: Vec<&Command> = store
            .commands()
            .iter()
            .filter(|c| c.name == name)
            .filter(|c| service.map_or(true, |s| c.source_service == s))
            .filter(|c| scope.map_or(true, |s| c.scope == s))
            .filter(|c| {
                c.scope == Scope::User || self.root.is_none() || c.project_path == self.root
            })
            .collect();

        match candidates.as_slice() {
            [] => anyhow::bail!("command '{name}' not found"),
            [only] => Ok((*only).clone()),
            many => {
                let places: Vec<String> = many
                    .iter()
                    .map(|c| format!("{}/{}", c.source_service, c.scope))
                    .collect();
                anyhow::bail!(
                    "command '{name}' exists in several places ({}); narrow it with --service or --scope",
                    places.join(", ")
                )
            }
        }
    }
}

/// Read a command body from `--content` or `--file`.
pub fn read_content(content: Option<String>, file: Option<&Path>) -> anyhow::Result<Option<String>> {
    match (content, file) {
        (Some(_), Some(_)) => anyhow::bail!("pass either --content or --file, not both"),
        (Some(c), None) => Ok(Some(c)),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("failed to read {}", path.display())),
        (None, None) => Ok(None),
    }
}
