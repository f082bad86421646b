use super::{loaded_command, CommandAdapter};
use crate::command::Command;
use crate::error::Result;
use crate::io;
use crate::paths::{self, Location};
use crate::types::{ActivationMode, Scope, Service};
use std::path::{Path, PathBuf};

const EXTENSION: &str = "md";

/// Name given to the single user-scope rules file.
pub const GLOBAL_RULES_NAME: &str = "global-rules";
/// Name given to the legacy `.windsurfrules` project file.
pub const LEGACY_RULES_NAME: &str = "project-rules";
/// Windsurf files carry no description of their own.
pub const RULE_DESCRIPTION: &str = "Windsurf rule (always applied)";

/// Plain-text rules: one global file for the user, a rules directory plus the
/// legacy `.windsurfrules` file per project. Everything is always applied.
pub struct WindsurfAdapter {
    home: PathBuf,
}

impl WindsurfAdapter {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn load_file(&self, file: &Path, name: &str, project: Option<&Path>) -> Result<Command> {
        let content = std::fs::read_to_string(file)?;
        let mut cmd = loaded_command(Service::Windsurf, file, name.to_string(), project)?;
        cmd.content = content;
        cmd.description = RULE_DESCRIPTION.to_string();
        cmd.activation_mode = ActivationMode::Always;
        Ok(cmd)
    }

    /// Constant name of the fixed file at `path`, if `path` is one.
    fn fixed_name(&self, command: &Command, path: &Path) -> Option<&'static str> {
        match command.scope {
            Scope::User => Some(GLOBAL_RULES_NAME),
            Scope::Project => {
                let root = command.project_path.as_deref()?;
                let legacy = paths::legacy_project_file(Service::Windsurf, root)?;
                (legacy == path).then_some(LEGACY_RULES_NAME)
            }
        }
    }
}

impl CommandAdapter for WindsurfAdapter {
    fn service(&self) -> Service {
        Service::Windsurf
    }

    fn load_user_commands(&self) -> Result<Vec<Command>> {
        let loc = paths::location(Service::Windsurf, Scope::User, &self.home, None)?;
        let file = loc.path();
        if !file.is_file() {
            return Ok(Vec::new());
        }
        Ok(vec![self.load_file(file, GLOBAL_RULES_NAME, None)?])
    }

    fn load_project_commands(&self, root: &Path) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        if let Some(legacy) = paths::legacy_project_file(Service::Windsurf, root) {
            if legacy.is_file() {
                commands.push(self.load_file(&legacy, LEGACY_RULES_NAME, Some(root))?);
            }
        }

        let loc = paths::location(Service::Windsurf, Scope::Project, &self.home, Some(root))?;
        for file in io::list_files(loc.path(), &[EXTENSION])? {
            commands.push(self.load_file(&file, &io::file_stem(&file), Some(root))?);
        }
        tracing::debug!(root = %root.display(), count = commands.len(), "loaded windsurf rules");
        Ok(commands)
    }

    fn target_path(&self, command: &Command) -> Result<PathBuf> {
        let loc = paths::location(
            Service::Windsurf,
            command.scope,
            &self.home,
            command.project_path.as_deref(),
        )?;
        if let Location::File(file) = &loc {
            return Ok(file.clone());
        }
        if let Some(existing) = &command.file_path {
            return Ok(existing.clone());
        }
        Ok(paths::command_file(&loc, &command.name, EXTENSION))
    }

    fn render(&self, command: &Command) -> String {
        command.content.clone()
    }

    /// Only the body reaches disk, so the saved command takes the name,
    /// description and mode a reload would give it.
    fn save_command(&self, command: &mut Command) -> Result<()> {
        let path = self.target_path(command)?;
        io::atomic_write(&path, self.render(command).as_bytes())?;
        if let Some(name) = self.fixed_name(command, &path) {
            command.name = name.to_string();
        }
        command.description = RULE_DESCRIPTION.to_string();
        command.activation_mode = ActivationMode::Always;
        command.last_modified = io::modified_at(&path)?;
        command.file_path = Some(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn user_scope_is_one_fixed_file() {
        let home = TempDir::new().unwrap();
        let adapter = WindsurfAdapter::new(home.path());
        assert!(adapter.load_user_commands().unwrap().is_empty());

        let mut cmd = Command::new("anything", "Be concise.", Service::Windsurf);
        adapter.save_command(&mut cmd).unwrap();
        assert_eq!(cmd.name, GLOBAL_RULES_NAME);
        let file = home.path().join(".codeium/windsurf/memories/global_rules.md");
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "Be concise.");

        let loaded = adapter.load_user_commands().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, GLOBAL_RULES_NAME);
        assert_eq!(loaded[0].description, RULE_DESCRIPTION);
        assert_eq!(loaded[0].activation_mode, ActivationMode::Always);
    }

    #[test]
    fn description_is_not_round_tripped() {
        let home = TempDir::new().unwrap();
        let adapter = WindsurfAdapter::new(home.path());
        let mut cmd = Command::new("x", "Body", Service::Windsurf).with_description("mine");
        assert_eq!(adapter.render(&cmd), "Body");
        adapter.save_command(&mut cmd).unwrap();
        assert_eq!(
            adapter.load_user_commands().unwrap()[0].description,
            RULE_DESCRIPTION
        );
    }

    #[test]
    fn project_reads_legacy_file_and_rules_dir() {
        let home = TempDir::new().unwrap();
        let proj = TempDir::new().unwrap();
        std::fs::write(proj.path().join(".windsurfrules"), "Legacy").unwrap();
        std::fs::create_dir_all(proj.path().join(".windsurf/rules")).unwrap();
        std::fs::write(proj.path().join(".windsurf/rules/style.md"), "Style").unwrap();

        let adapter = WindsurfAdapter::new(home.path());
        let loaded = adapter.load_project_commands(proj.path()).unwrap();
        let names: Vec<_> = loaded.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![LEGACY_RULES_NAME, "style"]);
        assert!(loaded.iter().all(|c| c.scope == Scope::Project));
    }

    #[test]
    fn legacy_file_is_written_back_in_place() {
        let home = TempDir::new().unwrap();
        let proj = TempDir::new().unwrap();
        std::fs::write(proj.path().join(".windsurfrules"), "Old").unwrap();

        let adapter = WindsurfAdapter::new(home.path());
        let mut cmd = adapter.load_project_commands(proj.path()).unwrap().remove(0);
        cmd.content = "New".into();
        cmd.name = "something-else".into();
        adapter.save_command(&mut cmd).unwrap();
        assert_eq!(cmd.name, LEGACY_RULES_NAME);

        assert_eq!(
            std::fs::read_to_string(proj.path().join(".windsurfrules")).unwrap(),
            "New"
        );
        assert!(!proj.path().join(".windsurf/rules/project-rules.md").exists());
    }

    #[test]
    fn new_project_rule_goes_to_rules_dir() {
        let home = TempDir::new().unwrap();
        let proj = TempDir::new().unwrap();
        let adapter = WindsurfAdapter::new(home.path());
        let mut cmd = Command::new_project("tests", "Write tests", Service::Windsurf, proj.path());
        adapter.save_command(&mut cmd).unwrap();
        assert!(proj.path().join(".windsurf/rules/tests.md").exists());
        assert_eq!(cmd.name, "tests");
        assert_eq!(cmd.activation_mode, ActivationMode::Always);
    }
}
