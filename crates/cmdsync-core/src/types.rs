use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// An AI coding tool whose on-disk command convention we can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Claude,
    Cursor,
    Windsurf,
}

impl Service {
    pub fn all() -> &'static [Service] {
        &[Service::Claude, Service::Cursor, Service::Windsurf]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Service::Claude => "claude",
            Service::Cursor => "cursor",
            Service::Windsurf => "windsurf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Service::Claude => "Claude Code",
            Service::Cursor => "Cursor",
            Service::Windsurf => "Windsurf",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Service {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "claude" | "claude-code" | "claude_code" => Ok(Service::Claude),
            "cursor" => Ok(Service::Cursor),
            "windsurf" => Ok(Service::Windsurf),
            _ => Err(SyncError::UnknownService(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Global to the host.
    User,
    /// Bound to one project root.
    Project,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Project => "project",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" | "global" => Ok(Scope::User),
            "project" => Ok(Scope::Project),
            _ => Err(SyncError::UnknownScope(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActivationMode
// ---------------------------------------------------------------------------

/// Normalized trigger semantic shared by every service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationMode {
    Always,
    #[default]
    Manual,
    AutoAttach,
    ModelDecision,
}

impl ActivationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivationMode::Always => "always",
            ActivationMode::Manual => "manual",
            ActivationMode::AutoAttach => "auto_attach",
            ActivationMode::ModelDecision => "model_decision",
        }
    }
}

impl fmt::Display for ActivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivationMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(ActivationMode::Always),
            "manual" => Ok(ActivationMode::Manual),
            "auto_attach" | "auto-attach" => Ok(ActivationMode::AutoAttach),
            "model_decision" | "model-decision" => Ok(ActivationMode::ModelDecision),
            _ => Err(SyncError::UnknownActivationMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_parse_accepts_aliases() {
        assert_eq!("claude-code".parse::<Service>().unwrap(), Service::Claude);
        assert_eq!("Cursor".parse::<Service>().unwrap(), Service::Cursor);
        assert!(matches!(
            "vim".parse::<Service>(),
            Err(SyncError::UnknownService(_))
        ));
    }

    #[test]
    fn service_ordering_is_stable() {
        let mut v = vec![Service::Windsurf, Service::Claude, Service::Cursor];
        v.sort();
        assert_eq!(v, Service::all());
    }

    #[test]
    fn activation_mode_yaml_snake_case() {
        let yaml = serde_yaml::to_string(&ActivationMode::AutoAttach).unwrap();
        assert_eq!(yaml.trim(), "auto_attach");
        assert_eq!(
            "model-decision".parse::<ActivationMode>().unwrap(),
            ActivationMode::ModelDecision
        );
    }
}
