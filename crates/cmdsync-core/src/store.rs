//! In-memory collection of every loaded command.
//!
//! All mutations go to disk first through the owning service's adapter; the
//! in-memory list only changes once that I/O has succeeded. The store assumes
//! a single writer and does no locking of its own.

use crate::adapter::{standard_adapters, CommandAdapter};
use crate::backup::BackupManager;
use crate::command::Command;
use crate::error::{Result, SyncError};
use crate::types::{Scope, Service};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of a bulk load. Failed services are listed, not fatal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub failures: Vec<(Service, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct CommandFilter {
    pub service: Option<Service>,
    pub scope: Option<Scope>,
    pub project: Option<PathBuf>,
    pub query: Option<String>,
}

/// Full matching identity plus owning service. Keying on the whole tuple keeps
/// same-named commands from different scopes or projects apart.
type LinkKey = (Service, String, Scope, Option<String>, Option<PathBuf>);

fn link_key(command: &Command) -> LinkKey {
    (
        command.source_service,
        command.name.clone(),
        command.scope,
        command.namespace.clone(),
        match command.scope {
            Scope::Project => command.project_path.clone(),
            Scope::User => None,
        },
    )
}

// ---------------------------------------------------------------------------
// CommandStore
// ---------------------------------------------------------------------------

pub struct CommandStore {
    commands: Vec<Command>,
    adapters: BTreeMap<Service, Box<dyn CommandAdapter>>,
    available: BTreeSet<Service>,
    backups: Option<Arc<BackupManager>>,
    linked: RefCell<HashMap<LinkKey, Vec<Service>>>,
}

impl CommandStore {
    /// An empty store with no adapters; only `available` services are loaded.
    pub fn new(available: BTreeSet<Service>) -> Self {
        Self {
            commands: Vec::new(),
            adapters: BTreeMap::new(),
            available,
            backups: None,
            linked: RefCell::new(HashMap::new()),
        }
    }

    /// A store with the three standard adapters rooted at `home`.
    pub fn for_host(home: &Path, available: BTreeSet<Service>) -> Self {
        standard_adapters(home)
            .into_iter()
            .fold(Self::new(available), |store, adapter| store.register(adapter))
    }

    pub fn register(mut self, adapter: Box<dyn CommandAdapter>) -> Self {
        self.adapters.insert(adapter.service(), adapter);
        self
    }

    pub fn with_backups(mut self, backups: Arc<BackupManager>) -> Self {
        self.backups = Some(backups);
        self
    }

    pub fn available_services(&self) -> &BTreeSet<Service> {
        &self.available
    }

    pub fn is_available(&self, service: Service) -> bool {
        self.available.contains(&service)
    }

    /// The adapter for `service`, refused when the service is not installed.
    fn adapter(&self, service: Service) -> Result<&dyn CommandAdapter> {
        if !self.is_available(service) {
            return Err(SyncError::ServiceUnavailable(service));
        }
        self.adapters
            .get(&service)
            .map(|a| a.as_ref())
            .ok_or(SyncError::AdapterNotFound(service))
    }

    fn invalidate(&self) {
        self.linked.borrow_mut().clear();
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Replace the collection with every available service's user commands.
    /// A failing service is logged and skipped.
    pub fn load_all(&mut self) -> LoadSummary {
        self.commands.clear();
        self.invalidate();

        let mut summary = LoadSummary::default();
        for service in self.available.clone() {
            let loaded = self
                .adapter(service)
                .and_then(|adapter| adapter.load_user_commands());
            match loaded {
                Ok(commands) => {
                    summary.loaded += commands.len();
                    self.commands.extend(commands);
                }
                Err(e) => {
                    tracing::warn!(service = %service, error = %e, "failed to load user commands");
                    summary.failures.push((service, e.to_string()));
                }
            }
        }
        tracing::debug!(count = summary.loaded, "loaded user commands");
        summary
    }

    /// Append every available service's commands for `root`. Commands whose id
    /// is already present are skipped, so the first copy loaded wins.
    pub fn load_project_commands(&mut self, root: &Path) -> LoadSummary {
        let mut summary = LoadSummary::default();
        let mut seen: HashSet<String> = self.commands.iter().map(|c| c.id.clone()).collect();

        for service in self.available.clone() {
            let loaded = self
                .adapter(service)
                .and_then(|adapter| adapter.load_project_commands(root));
            match loaded {
                Ok(commands) => {
                    for cmd in commands {
                        if seen.insert(cmd.id.clone()) {
                            summary.loaded += 1;
                            self.commands.push(cmd);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        service = %service,
                        root = %root.display(),
                        error = %e,
                        "failed to load project commands"
                    );
                    summary.failures.push((service, e.to_string()));
                }
            }
        }
        self.invalidate();
        summary
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.id == id)
    }

    /// Look up one command by its user-facing coordinates.
    pub fn find(
        &self,
        name: &str,
        service: Service,
        scope: Scope,
        project: Option<&Path>,
    ) -> Option<&Command> {
        self.commands.iter().find(|c| {
            c.name == name
                && c.source_service == service
                && c.scope == scope
                && (scope == Scope::User || c.project_path.as_deref() == project)
        })
    }

    pub fn by_service(&self, service: Service) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| c.source_service == service)
            .collect()
    }

    pub fn filter(&self, filter: &CommandFilter) -> Vec<&Command> {
        let query = filter.query.as_deref().map(str::to_lowercase);
        self.commands
            .iter()
            .filter(|c| filter.service.map_or(true, |s| c.source_service == s))
            .filter(|c| filter.scope.map_or(true, |s| c.scope == s))
            .filter(|c| {
                filter
                    .project
                    .as_deref()
                    .map_or(true, |p| c.project_path.as_deref() == Some(p))
            })
            .filter(|c| query.as_deref().map_or(true, |q| text_matches(c, q)))
            .collect()
    }

    /// Case-insensitive substring search over name, description and content.
    pub fn search(&self, query: &str) -> Vec<&Command> {
        self.filter(&CommandFilter {
            query: Some(query.to_string()),
            ..CommandFilter::default()
        })
    }

    /// Copies of `command` held by other services.
    pub fn linked_commands(&self, command: &Command) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|c| c.source_service != command.source_service && c.matches(command))
            .collect()
    }

    /// The entry in `service` that a sync of `command` would overwrite: a
    /// matching copy, or whatever is already stored in the file the copy would
    /// be written to (Windsurf's single global file, for instance).
    pub fn counterpart(&self, command: &Command, service: Service) -> Option<&Command> {
        self.counterpart_index(command, service)
            .map(|idx| &self.commands[idx])
    }

    fn counterpart_index(&self, command: &Command, service: Service) -> Option<usize> {
        let in_service = |c: &Command| c.source_service == service;
        self.commands
            .iter()
            .position(|c| in_service(c) && c.matches(command))
            .or_else(|| {
                let adapter = self.adapters.get(&service)?;
                let path = adapter.target_path(&command.retarget(service)).ok()?;
                self.commands
                    .iter()
                    .position(|c| in_service(c) && c.file_path.as_deref() == Some(path.as_path()))
            })
    }

    /// Sorted, deduplicated services other than the owner that hold a matching
    /// command. Served from a cache that every mutation clears.
    pub fn synced_services(&self, command: &Command) -> Vec<Service> {
        let key = link_key(command);
        let cached = self.linked.borrow().get(&key).cloned();
        if let Some(hit) = cached {
            return hit;
        }
        let services = self.compute_synced_services(command);
        self.linked.borrow_mut().insert(key, services.clone());
        services
    }

    /// Uncached form of [`CommandStore::synced_services`].
    pub fn compute_synced_services(&self, command: &Command) -> Vec<Service> {
        self.linked_commands(command)
            .into_iter()
            .map(|c| c.source_service)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    fn index_of(&self, id: &str) -> Result<usize> {
        self.commands
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| SyncError::CommandNotFound(id.to_string()))
    }

    fn backup(&self, path: &Path) -> Result<()> {
        if let Some(backups) = &self.backups {
            backups.backup(path)?;
        }
        Ok(())
    }

    /// Validate, back up whatever is about to be overwritten, then save.
    fn persist(&self, command: &mut Command) -> Result<()> {
        command.validate()?;
        let adapter = self.adapter(command.source_service)?;
        let target = adapter.target_path(command)?;
        self.backup(&target)?;
        adapter.save_command(command)
    }

    /// Insert or replace the entry backed by the same file as `command`.
    fn put(&mut self, command: Command) {
        let slot = self
            .commands
            .iter()
            .position(|c| c.id == command.id || (c.file_path.is_some() && c.file_path == command.file_path));
        match slot {
            Some(idx) => self.commands[idx] = command,
            None => self.commands.push(command),
        }
        self.invalidate();
    }

    pub fn add(&mut self, mut command: Command) -> Result<Command> {
        self.persist(&mut command)?;
        tracing::info!(name = %command.name, service = %command.source_service, "added command");
        self.put(command.clone());
        Ok(command)
    }

    /// Save new content for an existing command. The stored copy's service,
    /// scope and project are kept; a changed name is handled as a rename.
    pub fn update(&mut self, mut command: Command) -> Result<Command> {
        let idx = self.index_of(&command.id)?;
        let current = &self.commands[idx];
        command.source_service = current.source_service;
        command.scope = current.scope;
        command.project_path = current.project_path.clone();
        let renamed = current.name != command.name;
        let backing_file = current.file_path.clone();

        if renamed {
            return self.rename_to(idx, command);
        }

        command.file_path = backing_file;
        self.persist(&mut command)?;
        self.commands[idx] = command.clone();
        self.invalidate();
        Ok(command)
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<Command> {
        let idx = self.index_of(id)?;
        let mut renamed = self.commands[idx].clone();
        renamed.name = new_name.to_string();
        self.rename_to(idx, renamed)
    }

    /// Write the new file first and only then remove the old one. If the old
    /// file cannot be removed the new one is deleted again.
    fn rename_to(&mut self, idx: usize, mut renamed: Command) -> Result<Command> {
        let old = self.commands[idx].clone();
        renamed.file_path = None;
        renamed.validate()?;

        let adapter = self.adapter(old.source_service)?;
        let new_path = adapter.target_path(&renamed)?;
        let same_file = old.file_path.as_deref() == Some(new_path.as_path());

        self.backup(&new_path)?;
        if let (false, Some(old_path)) = (same_file, &old.file_path) {
            self.backup(old_path)?;
        }

        adapter.save_command(&mut renamed)?;
        if !same_file {
            if let Err(e) = adapter.delete_command(&old) {
                if let Err(undo) = adapter.delete_command(&renamed) {
                    tracing::warn!(
                        path = %new_path.display(),
                        error = %undo,
                        "failed to roll back rename"
                    );
                }
                return Err(e);
            }
        }

        tracing::info!(from = %old.name, to = %renamed.name, service = %old.source_service, "renamed command");
        self.commands[idx] = renamed.clone();
        // Another entry may have been backed by the file we just wrote.
        self.commands
            .retain(|c| c.id == renamed.id || c.file_path.is_none() || c.file_path != renamed.file_path);
        self.invalidate();
        Ok(renamed)
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let idx = self.index_of(id)?;
        let cmd = &self.commands[idx];
        let adapter = self.adapter(cmd.source_service)?;
        if let Some(path) = &cmd.file_path {
            self.backup(path)?;
        }
        adapter.delete_command(cmd)?;
        tracing::info!(name = %cmd.name, service = %cmd.source_service, "deleted command");
        self.commands.remove(idx);
        self.invalidate();
        Ok(())
    }

    /// Write `source`'s content into `target`: overwrite the counterpart there
    /// (keeping its id, name and file) or append a retargeted copy.
    pub fn upsert_into(&mut self, source: &Command, target: Service) -> Result<Command> {
        self.adapter(target)?;
        match self.counterpart_index(source, target) {
            Some(idx) => {
                let mut copy = self.commands[idx].clone();
                copy.overwrite_from(source);
                self.persist(&mut copy)?;
                self.commands[idx] = copy.clone();
                self.invalidate();
                Ok(copy)
            }
            None => self.add(source.retarget(target)),
        }
    }

    /// Make `targets` exactly the set of services holding the logical command
    /// `id`: missing copies are written, existing ones refreshed, copies in
    /// services outside `targets` (the owner included) removed.
    pub fn update_command_services(
        &mut self,
        id: &str,
        targets: &BTreeSet<Service>,
    ) -> Result<Vec<Service>> {
        if targets.is_empty() {
            self.delete_from_all_services(id)?;
            return Ok(Vec::new());
        }
        let source = self
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::CommandNotFound(id.to_string()))?;

        for &target in targets {
            if target != source.source_service {
                self.upsert_into(&source, target)?;
            }
        }

        let stale: Vec<String> = self
            .commands
            .iter()
            .filter(|c| c.matches(&source) && !targets.contains(&c.source_service))
            .map(|c| c.id.clone())
            .collect();
        for stale_id in stale {
            self.delete(&stale_id)?;
        }
        Ok(targets.iter().copied().collect())
    }

    /// Delete `id` and every matching copy in other services.
    pub fn delete_from_all_services(&mut self, id: &str) -> Result<()> {
        let source = self
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::CommandNotFound(id.to_string()))?;
        let ids: Vec<String> = self
            .commands
            .iter()
            .filter(|c| c.matches(&source))
            .map(|c| c.id.clone())
            .collect();
        for target in ids {
            self.delete(&target)?;
        }
        Ok(())
    }
}

fn text_matches(command: &Command, query_lower: &str) -> bool {
    command.name.to_lowercase().contains(query_lower)
        || command.description.to_lowercase().contains(query_lower)
        || command.content.to_lowercase().contains(query_lower)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
