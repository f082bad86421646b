//! Per-service translation between [`Command`] and on-disk files.
//!
//! Each adapter owns one service's layout and serialization. Loading a missing
//! location yields an empty list; any other I/O fault aborts the whole call so
//! the caller can decide whether to isolate it.

pub mod claude;
pub mod cursor;
pub mod windsurf;

pub use claude::ClaudeAdapter;
pub use cursor::CursorAdapter;
pub use windsurf::WindsurfAdapter;

use crate::command::Command;
use crate::error::Result;
use crate::io;
use crate::types::{ActivationMode, Service};
use std::path::{Path, PathBuf};

pub trait CommandAdapter: Send + Sync {
    fn service(&self) -> Service;

    fn load_user_commands(&self) -> Result<Vec<Command>>;

    /// Commands stored under `root`. Adapters may read several locations and
    /// merge what they find.
    fn load_project_commands(&self, root: &Path) -> Result<Vec<Command>>;

    /// File that [`CommandAdapter::save_command`] would write for `command`.
    fn target_path(&self, command: &Command) -> Result<PathBuf>;

    /// Serialized file contents for `command`.
    fn render(&self, command: &Command) -> String;

    /// Write `command` unconditionally, creating parent directories, and record
    /// the backing file on success.
    fn save_command(&self, command: &mut Command) -> Result<()> {
        let path = self.target_path(command)?;
        io::atomic_write(&path, self.render(command).as_bytes())?;
        command.last_modified = io::modified_at(&path)?;
        command.file_path = Some(path);
        Ok(())
    }

    /// Remove the backing file. Commands that were never saved are a no-op.
    fn delete_command(&self, command: &Command) -> Result<()> {
        if let Some(path) = &command.file_path {
            io::remove_if_exists(path)?;
        }
        Ok(())
    }
}

/// Activation mode a service would infer for a command with these fields.
pub fn native_activation(
    service: Service,
    always_apply: bool,
    globs: &[String],
    description: &str,
) -> ActivationMode {
    match service {
        Service::Claude => ActivationMode::Manual,
        Service::Cursor => cursor::derive_activation(always_apply, globs, description),
        Service::Windsurf => ActivationMode::Always,
    }
}

/// The three built-in adapters rooted at `home`.
pub fn standard_adapters(home: &Path) -> Vec<Box<dyn CommandAdapter>> {
    vec![
        Box::new(ClaudeAdapter::new(home)),
        Box::new(CursorAdapter::new(home)),
        Box::new(WindsurfAdapter::new(home)),
    ]
}

/// Skeleton of a command read from `file`: identity, scope and file metadata
/// filled in, format-specific fields left for the adapter.
pub(crate) fn loaded_command(
    service: Service,
    file: &Path,
    name: String,
    project: Option<&Path>,
) -> Result<Command> {
    let mut cmd = match project {
        Some(root) => Command::new_project(name, String::new(), service, root),
        None => Command::new(name, String::new(), service),
    };
    cmd.id = Command::id_for_file(file);
    cmd.last_modified = io::modified_at(file)?;
    cmd.file_path = Some(file.to_path_buf());
    Ok(cmd)
}
