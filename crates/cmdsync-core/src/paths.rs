use crate::error::{Result, SyncError};
use crate::types::{Scope, Service};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CLAUDE_COMMANDS_DIR: &str = ".claude/commands";
pub const CURSOR_RULES_DIR: &str = ".cursor/rules";
pub const WINDSURF_RULES_DIR: &str = ".windsurf/rules";
pub const WINDSURF_GLOBAL_RULES_FILE: &str = ".codeium/windsurf/memories/global_rules.md";
pub const WINDSURF_LEGACY_RULES_FILE: &str = ".windsurfrules";

pub const APP_DIR: &str = ".cmdsync";
pub const CONFIG_FILE: &str = ".cmdsync/config.yaml";
pub const BACKUPS_DIR: &str = ".cmdsync/backups";

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Where a service keeps commands for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A directory holding one file per command.
    Directory(PathBuf),
    /// One fixed file holding a single command.
    File(PathBuf),
}

impl Location {
    pub fn path(&self) -> &Path {
        match self {
            Location::Directory(p) | Location::File(p) => p,
        }
    }
}

/// Resolve the canonical location for `service` at `scope`.
///
/// `home` anchors user-scope paths, `project` anchors project-scope paths and
/// is required when `scope` is [`Scope::Project`].
pub fn location(
    service: Service,
    scope: Scope,
    home: &Path,
    project: Option<&Path>,
) -> Result<Location> {
    match scope {
        Scope::User => Ok(match service {
            Service::Claude => Location::Directory(home.join(CLAUDE_COMMANDS_DIR)),
            Service::Cursor => Location::Directory(home.join(CURSOR_RULES_DIR)),
            Service::Windsurf => Location::File(home.join(WINDSURF_GLOBAL_RULES_FILE)),
        }),
        Scope::Project => {
            let root = project
                .ok_or_else(|| SyncError::MissingProjectPath(service.to_string()))?;
            Ok(Location::Directory(match service {
                Service::Claude => root.join(CLAUDE_COMMANDS_DIR),
                Service::Cursor => root.join(CURSOR_RULES_DIR),
                Service::Windsurf => root.join(WINDSURF_RULES_DIR),
            }))
        }
    }
}

/// The single-file project convention a service still honours, if any.
pub fn legacy_project_file(service: Service, root: &Path) -> Option<PathBuf> {
    match service {
        Service::Windsurf => Some(root.join(WINDSURF_LEGACY_RULES_FILE)),
        Service::Claude | Service::Cursor => None,
    }
}

/// File path for command `name` inside a directory location, or the fixed file
/// itself for a single-file location.
pub fn command_file(location: &Location, name: &str, extension: &str) -> PathBuf {
    match location {
        Location::Directory(dir) => dir.join(format!("{name}.{extension}")),
        Location::File(file) => file.clone(),
    }
}

// ---------------------------------------------------------------------------
// Host paths
// ---------------------------------------------------------------------------

/// Resolve the home directory, preferring an explicit override.
pub fn home_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    home::home_dir().ok_or(SyncError::HomeNotFound)
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_FILE)
}

pub fn backups_dir(home: &Path) -> PathBuf {
    home.join(BACKUPS_DIR)
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9_\-]*[A-Za-z0-9])?$").expect("static regex")
    })
}

pub fn is_valid_name(name: &str) -> bool {
    name_re().is_match(name)
}

pub fn validate_name(name: &str) -> Result<()> {
    if !is_valid_name(name) {
        return Err(SyncError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_names() {
        for name in ["deploy", "a", "Fix_Bug-2", "x1", "9lives"] {
            validate_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "-lead", "trail_", "has space", "dot.md", "slash/x", "ünï"] {
            assert!(validate_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn user_locations() {
        let home = Path::new("/home/u");
        assert_eq!(
            location(Service::Claude, Scope::User, home, None).unwrap(),
            Location::Directory(PathBuf::from("/home/u/.claude/commands"))
        );
        assert_eq!(
            location(Service::Windsurf, Scope::User, home, None).unwrap(),
            Location::File(PathBuf::from(
                "/home/u/.codeium/windsurf/memories/global_rules.md"
            ))
        );
    }

    #[test]
    fn project_location_requires_root() {
        let home = Path::new("/home/u");
        assert!(matches!(
            location(Service::Cursor, Scope::Project, home, None),
            Err(SyncError::MissingProjectPath(_))
        ));
        let loc = location(Service::Cursor, Scope::Project, home, Some(Path::new("/p"))).unwrap();
        assert_eq!(
            command_file(&loc, "lint", "mdc"),
            PathBuf::from("/p/.cursor/rules/lint.mdc")
        );
    }

    #[test]
    fn only_windsurf_has_legacy_file() {
        let root = Path::new("/p");
        assert_eq!(
            legacy_project_file(Service::Windsurf, root),
            Some(PathBuf::from("/p/.windsurfrules"))
        );
        assert!(legacy_project_file(Service::Claude, root).is_none());
        assert!(legacy_project_file(Service::Cursor, root).is_none());
    }

    #[test]
    fn single_file_location_ignores_name() {
        let loc = Location::File(PathBuf::from("/h/rules.md"));
        assert_eq!(command_file(&loc, "anything", "md"), PathBuf::from("/h/rules.md"));
    }

    proptest! {
        #[test]
        fn generated_valid_names_accepted(name in "[A-Za-z0-9]([A-Za-z0-9_-]{0,30}[A-Za-z0-9])?") {
            prop_assert!(is_valid_name(&name));
        }

        #[test]
        fn leading_or_trailing_separator_rejected(
            body in "[A-Za-z0-9_-]{0,20}",
            sep in "[-_]",
            leading in any::<bool>(),
        ) {
            let name = if leading { format!("{sep}{body}") } else { format!("{body}{sep}") };
            prop_assert!(!is_valid_name(&name));
        }

        #[test]
        fn illegal_character_rejected(
            head in "[A-Za-z0-9]{1,8}",
            bad in "[ ./:@!#$%^&*()+=]",
            tail in "[A-Za-z0-9]{1,8}",
        ) {
            let name = format!("{head}{bad}{tail}");
            prop_assert!(!is_valid_name(&name));
        }
    }
}
