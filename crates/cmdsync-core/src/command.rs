use crate::error::{Result, SyncError};
use crate::paths;
use crate::types::{ActivationMode, Scope, Service};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One reusable prompt, independent of the format it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub globs: Vec<String>,
    #[serde(default)]
    pub activation_mode: ActivationMode,
    pub source_service: Service,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl Command {
    /// A new, unsaved user-scope command.
    pub fn new(name: impl Into<String>, content: impl Into<String>, service: Service) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            content: content.into(),
            scope: Scope::User,
            namespace: None,
            globs: Vec::new(),
            activation_mode: ActivationMode::Manual,
            source_service: service,
            last_modified: None,
            project_path: None,
            file_path: None,
        }
    }

    /// A new, unsaved command bound to the project at `root`.
    pub fn new_project(
        name: impl Into<String>,
        content: impl Into<String>,
        service: Service,
        root: impl Into<PathBuf>,
    ) -> Self {
        let mut cmd = Self::new(name, content, service);
        cmd.scope = Scope::Project;
        cmd.project_path = Some(root.into());
        cmd
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_globs(mut self, globs: Vec<String>) -> Self {
        self.globs = globs;
        self
    }

    pub fn with_activation(mut self, mode: ActivationMode) -> Self {
        self.activation_mode = mode;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Stable id for a command read from `file`: the same file always maps to
    /// the same id across reloads.
    pub fn id_for_file(file: &Path) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, file.to_string_lossy().as_bytes()).to_string()
    }

    /// `namespace:name` when a namespace is set, otherwise the bare name.
    pub fn display_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}:{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Checks that must hold before an adapter is asked to persist this command.
    pub fn validate(&self) -> Result<()> {
        paths::validate_name(&self.name)?;
        if self.scope == Scope::Project && self.project_path.is_none() {
            return Err(SyncError::MissingProjectPath(self.name.clone()));
        }
        Ok(())
    }

    /// True when `other` is the same logical command held by some service.
    /// `source_service` is deliberately not compared.
    pub fn matches(&self, other: &Command) -> bool {
        self.name == other.name
            && self.scope == other.scope
            && self.namespace == other.namespace
            && (self.scope != Scope::Project || self.project_path == other.project_path)
    }

    /// Copy of this command addressed to `service`: same fields, fresh id, no
    /// backing file yet.
    pub fn retarget(&self, service: Service) -> Command {
        Command {
            id: Uuid::new_v4().to_string(),
            source_service: service,
            file_path: None,
            last_modified: None,
            ..self.clone()
        }
    }

    /// Copy the shareable fields of `source` onto this command, keeping this
    /// copy's identity (id, service, backing file).
    pub fn overwrite_from(&mut self, source: &Command) {
        self.description = source.description.clone();
        self.content = source.content.clone();
        self.globs = source.globs.clone();
        self.activation_mode = source.activation_mode;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn project_command_carries_root() {
        let cmd = Command::new_project("lint", "run lint", Service::Cursor, "/p");
        assert_eq!(cmd.scope, Scope::Project);
        assert_eq!(cmd.project_path.as_deref(), Some(Path::new("/p")));
        cmd.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_name_and_missing_root() {
        let bad = Command::new("-x", "", Service::Claude);
        assert!(matches!(bad.validate(), Err(SyncError::InvalidName(_))));

        let mut orphan = Command::new("ok", "", Service::Claude);
        orphan.scope = Scope::Project;
        assert!(matches!(
            orphan.validate(),
            Err(SyncError::MissingProjectPath(_))
        ));
    }

    #[test]
    fn matching_ignores_service_and_content() {
        let a = Command::new("review", "one", Service::Claude);
        let b = Command::new("review", "two", Service::Cursor).with_description("d");
        assert!(a.matches(&b));
        assert!(!a.matches(&Command::new("other", "one", Service::Cursor)));
    }

    #[test]
    fn matching_compares_project_path_only_for_project_scope() {
        let a = Command::new_project("t", "", Service::Claude, "/a");
        let b = Command::new_project("t", "", Service::Cursor, "/b");
        assert!(!a.matches(&b));
        assert!(!a.matches(&Command::new("t", "", Service::Cursor)));

        let mut u1 = Command::new("t", "", Service::Claude);
        let u2 = Command::new("t", "", Service::Cursor);
        u1.project_path = Some(PathBuf::from("/stale"));
        assert!(u1.matches(&u2));
    }

    #[test]
    fn matching_compares_namespace() {
        let a = Command::new("t", "", Service::Claude).with_namespace("ops");
        let b = Command::new("t", "", Service::Cursor);
        assert!(!a.matches(&b));
        assert_eq!(a.display_name(), "ops:t");
    }

    #[test]
    fn retarget_resets_identity() {
        let mut src = Command::new("t", "body", Service::Claude);
        src.file_path = Some(PathBuf::from("/h/.claude/commands/t.md"));
        let copy = src.retarget(Service::Cursor);
        assert_ne!(copy.id, src.id);
        assert_eq!(copy.source_service, Service::Cursor);
        assert!(copy.file_path.is_none());
        assert_eq!(copy.content, "body");
        assert!(copy.matches(&src));
    }

    #[test]
    fn id_for_file_is_stable() {
        let p = Path::new("/h/.claude/commands/t.md");
        assert_eq!(Command::id_for_file(p), Command::id_for_file(p));
        assert_ne!(
            Command::id_for_file(p),
            Command::id_for_file(Path::new("/h/.claude/commands/u.md"))
        );
    }

    fn arb_command() -> impl Strategy<Value = Command> {
        (
            prop::sample::select(vec!["a", "b"]),
            any::<bool>(),
            prop::option::of(prop::sample::select(vec!["ns", "other"])),
            prop::option::of(prop::sample::select(vec!["/p", "/q"])),
            prop::sample::select(Service::all().to_vec()),
        )
            .prop_map(|(name, project, ns, root, service)| {
                let mut cmd = if project {
                    Command::new_project(name, "", service, root.unwrap_or("/p"))
                } else {
                    Command::new(name, "", service)
                };
                cmd.namespace = ns.map(str::to_string);
                cmd
            })
    }

    proptest! {
        #[test]
        fn matching_is_symmetric(a in arb_command(), b in arb_command()) {
            prop_assert_eq!(a.matches(&b), b.matches(&a));
        }

        #[test]
        fn matching_is_transitive(a in arb_command(), b in arb_command(), c in arb_command()) {
            if a.matches(&b) && b.matches(&c) {
                prop_assert!(a.matches(&c));
            }
        }
    }
}
