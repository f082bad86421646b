use super::{loaded_command, CommandAdapter};
use crate::command::Command;
use crate::error::Result;
use crate::frontmatter;
use crate::io;
use crate::paths;
use crate::types::{ActivationMode, Scope, Service};
use std::path::{Path, PathBuf};

const EXTENSION: &str = "md";

/// Slash commands under `.claude/commands/`. The header is optional and only
/// carries a description; activation is always manual.
pub struct ClaudeAdapter {
    home: PathBuf,
}

impl ClaudeAdapter {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn load_dir(&self, dir: &Path, project: Option<&Path>) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        for file in io::list_files(dir, &[EXTENSION])? {
            let text = std::fs::read_to_string(&file)?;
            let (description, content) = parse(&text);
            let mut cmd = loaded_command(Service::Claude, &file, io::file_stem(&file), project)?;
            cmd.description = description;
            cmd.content = content;
            cmd.activation_mode = ActivationMode::Manual;
            commands.push(cmd);
        }
        tracing::debug!(dir = %dir.display(), count = commands.len(), "loaded claude commands");
        Ok(commands)
    }
}

impl CommandAdapter for ClaudeAdapter {
    fn service(&self) -> Service {
        Service::Claude
    }

    fn load_user_commands(&self) -> Result<Vec<Command>> {
        let loc = paths::location(Service::Claude, Scope::User, &self.home, None)?;
        self.load_dir(loc.path(), None)
    }

    fn load_project_commands(&self, root: &Path) -> Result<Vec<Command>> {
        let loc = paths::location(Service::Claude, Scope::Project, &self.home, Some(root))?;
        self.load_dir(loc.path(), Some(root))
    }

    fn target_path(&self, command: &Command) -> Result<PathBuf> {
        if let Some(existing) = &command.file_path {
            return Ok(existing.clone());
        }
        let loc = paths::location(
            Service::Claude,
            command.scope,
            &self.home,
            command.project_path.as_deref(),
        )?;
        Ok(paths::command_file(&loc, &command.name, EXTENSION))
    }

    fn render(&self, command: &Command) -> String {
        render(&command.description, &command.content)
    }
}

/// Split a command file into `(description, content)`.
pub fn parse(text: &str) -> (String, String) {
    match frontmatter::split(text) {
        (Some(header), body) => (
            frontmatter::scalar(header, "description").unwrap_or_default(),
            body.to_string(),
        ),
        (None, body) => (String::new(), body.to_string()),
    }
}

/// Header only when there is a description to carry, or when the content
/// itself opens with a `---` block that would otherwise be read as one.
pub fn render(description: &str, content: &str) -> String {
    let description = frontmatter::scalar_value(description);
    if description.is_empty() && !content.starts_with("---") {
        return content.to_string();
    }
    format!("---\ndescription: {description}\n---\n\n{content}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_plain_file() {
        let (d, c) = parse("Review the diff.\n");
        assert_eq!(d, "");
        assert_eq!(c, "Review the diff.\n");
    }

    #[test]
    fn parse_with_header() {
        let (d, c) = parse("---\ndescription: Review code\nallowed-tools: Bash\n---\n\nBody\n");
        assert_eq!(d, "Review code");
        assert_eq!(c, "Body\n");
    }

    #[test]
    fn header_without_description_yields_empty() {
        let (d, c) = parse("---\nmodel: opus\n---\n\nBody");
        assert_eq!(d, "");
        assert_eq!(c, "Body");
    }

    #[test]
    fn render_omits_empty_header() {
        assert_eq!(render("", "Body"), "Body");
        assert_eq!(
            render("Explain", "Body"),
            "---\ndescription: Explain\n---\n\nBody"
        );
    }

    #[test]
    fn content_with_own_delimiters_keeps_them() {
        let content = "---\ntitle: Rules\n---\n\nBody";
        let rendered = render("", content);
        assert_eq!(rendered, format!("---\ndescription: \n---\n\n{content}"));
        assert_eq!(parse(&rendered), (String::new(), content.to_string()));
    }

    #[test]
    fn save_then_load_user_command() {
        let dir = TempDir::new().unwrap();
        let adapter = ClaudeAdapter::new(dir.path());
        let mut cmd = Command::new("explain", "Explain this.\n", Service::Claude)
            .with_description("Explain code");
        adapter.save_command(&mut cmd).unwrap();

        let expected = dir.path().join(".claude/commands/explain.md");
        assert_eq!(cmd.file_path.as_deref(), Some(expected.as_path()));

        let loaded = adapter.load_user_commands().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "explain");
        assert_eq!(loaded[0].description, "Explain code");
        assert_eq!(loaded[0].content, "Explain this.\n");
        assert_eq!(loaded[0].activation_mode, ActivationMode::Manual);
        assert!(loaded[0].last_modified.is_some());
    }

    #[test]
    fn missing_directory_loads_empty() {
        let dir = TempDir::new().unwrap();
        let adapter = ClaudeAdapter::new(dir.path());
        assert!(adapter.load_user_commands().unwrap().is_empty());
        assert!(adapter
            .load_project_commands(&dir.path().join("proj"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn project_commands_carry_root() {
        let home = TempDir::new().unwrap();
        let proj = TempDir::new().unwrap();
        let adapter = ClaudeAdapter::new(home.path());
        let mut cmd = Command::new_project("test", "Run tests", Service::Claude, proj.path());
        adapter.save_command(&mut cmd).unwrap();
        assert!(proj.path().join(".claude/commands/test.md").exists());

        let loaded = adapter.load_project_commands(proj.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].scope, Scope::Project);
        assert_eq!(loaded[0].project_path.as_deref(), Some(proj.path()));
    }

    #[test]
    fn delete_without_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let adapter = ClaudeAdapter::new(dir.path());
        adapter
            .delete_command(&Command::new("never-saved", "", Service::Claude))
            .unwrap();
    }
}
