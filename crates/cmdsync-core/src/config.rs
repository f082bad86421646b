use crate::backup::{self, BackupManager};
use crate::error::Result;
use crate::paths;
use crate::types::Service;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Conflict policy
// ---------------------------------------------------------------------------

/// Recorded preference for resolving divergent copies. Sync always
/// overwrites; this is surfaced to the user, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    #[default]
    NewerWins,
    SourceWins,
    AskUser,
}

impl ConflictResolution {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictResolution::NewerWins => "newer_wins",
            ConflictResolution::SourceWins => "source_wins",
            ConflictResolution::AskUser => "ask_user",
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConflictResolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "newer_wins" | "newer-wins" => Ok(ConflictResolution::NewerWins),
            "source_wins" | "source-wins" => Ok(ConflictResolution::SourceWins),
            "ask_user" | "ask-user" | "ask" => Ok(ConflictResolution::AskUser),
            other => Err(format!(
                "unknown conflict resolution '{other}'; valid values: newer-wins, source-wins, ask-user"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    #[default]
    Manual,
    OnChange,
}

impl SyncTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncTrigger::Manual => "manual",
            SyncTrigger::OnChange => "on_change",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncTrigger {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SyncTrigger::Manual),
            "on_change" | "on-change" => Ok(SyncTrigger::OnChange),
            other => Err(format!(
                "unknown sync trigger '{other}'; valid values: manual, on-change"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// BackupConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_keep")]
    pub keep: usize,
    /// Overrides `~/.cmdsync/backups`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_keep() -> usize {
    backup::DEFAULT_KEEP
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            keep: default_keep(),
            dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_enabled_services")]
    pub enabled_services: BTreeSet<Service>,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
    #[serde(default)]
    pub sync_trigger: SyncTrigger,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<PathBuf>,
}

fn default_version() -> u32 {
    1
}

fn default_enabled_services() -> BTreeSet<Service> {
    Service::all().iter().copied().collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            enabled_services: default_enabled_services(),
            conflict_resolution: ConflictResolution::default(),
            sync_trigger: SyncTrigger::default(),
            backup: BackupConfig::default(),
            projects: Vec::new(),
        }
    }
}

impl Config {
    /// Load `~/.cmdsync/config.yaml`, falling back to defaults when absent.
    pub fn load(home: &Path) -> Result<Self> {
        let path = paths::config_path(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, home: &Path) -> Result<()> {
        let path = paths::config_path(home);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn backup_manager(&self, home: &Path) -> BackupManager {
        let dir = self
            .backup
            .dir
            .clone()
            .unwrap_or_else(|| paths::backups_dir(home));
        BackupManager::new(dir, self.backup.keep)
    }

    /// Remember a project root. Returns `false` if it was already known.
    pub fn add_project(&mut self, root: &Path) -> bool {
        if self.projects.iter().any(|p| p == root) {
            return false;
        }
        self.projects.push(root.to_path_buf());
        true
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.enabled_services.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "no services enabled; sync has nowhere to write".to_string(),
            });
        }

        if self.backup.keep == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "backup.keep is 0; one backup per file will still be kept".to_string(),
            });
        }

        if self.conflict_resolution == ConflictResolution::AskUser {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "conflict_resolution 'ask_user' is advisory; sync overwrites without prompting"
                    .to_string(),
            });
        }

        for project in &self.projects {
            if !project.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("project '{}' does not exist", project.display()),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let home = TempDir::new().unwrap();
        let cfg = Config::load(home.path()).unwrap();
        assert_eq!(cfg.enabled_services.len(), 3);
        assert_eq!(cfg.conflict_resolution, ConflictResolution::NewerWins);
        assert_eq!(cfg.sync_trigger, SyncTrigger::Manual);
        assert_eq!(cfg.backup.keep, backup::DEFAULT_KEEP);
    }

    #[test]
    fn save_and_reload() {
        let home = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.enabled_services.remove(&Service::Windsurf);
        cfg.sync_trigger = SyncTrigger::OnChange;
        cfg.add_project(Path::new("/work/app"));
        cfg.save(home.path()).unwrap();

        let back = Config::load(home.path()).unwrap();
        assert!(!back.enabled_services.contains(&Service::Windsurf));
        assert_eq!(back.sync_trigger, SyncTrigger::OnChange);
        assert_eq!(back.projects, vec![PathBuf::from("/work/app")]);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("conflict_resolution: ask_user\n").unwrap();
        assert_eq!(cfg.conflict_resolution, ConflictResolution::AskUser);
        assert_eq!(cfg.enabled_services.len(), 3);
    }

    #[test]
    fn add_project_is_idempotent() {
        let mut cfg = Config::default();
        assert!(cfg.add_project(Path::new("/a")));
        assert!(!cfg.add_project(Path::new("/a")));
    }

    #[test]
    fn validate_flags_empty_services() {
        let mut cfg = Config::default();
        cfg.enabled_services.clear();
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }

    #[test]
    fn enum_parsing_accepts_kebab_case() {
        assert_eq!(
            "source-wins".parse::<ConflictResolution>().unwrap(),
            ConflictResolution::SourceWins
        );
        assert_eq!("on-change".parse::<SyncTrigger>().unwrap(), SyncTrigger::OnChange);
        assert!("later".parse::<SyncTrigger>().is_err());
    }
}
