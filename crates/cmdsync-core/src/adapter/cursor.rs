use super::{loaded_command, CommandAdapter};
use crate::command::Command;
use crate::error::Result;
use crate::frontmatter;
use crate::io;
use crate::paths;
use crate::types::{ActivationMode, Scope, Service};
use std::path::{Path, PathBuf};

const EXTENSION: &str = "mdc";
const READ_EXTENSIONS: &[&str] = &["mdc", "md"];

// ---------------------------------------------------------------------------
// Rule format
// ---------------------------------------------------------------------------

/// Fields carried by a Cursor rule file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorRule {
    pub description: String,
    pub globs: Vec<String>,
    pub always_apply: bool,
    pub content: String,
}

impl CursorRule {
    pub fn activation_mode(&self) -> ActivationMode {
        derive_activation(self.always_apply, &self.globs, &self.description)
    }
}

/// `alwaysApply` beats globs, globs beat a bare description.
pub fn derive_activation(always_apply: bool, globs: &[String], description: &str) -> ActivationMode {
    if always_apply {
        ActivationMode::Always
    } else if !globs.is_empty() {
        ActivationMode::AutoAttach
    } else if !description.trim().is_empty() {
        ActivationMode::ModelDecision
    } else {
        ActivationMode::Manual
    }
}

pub fn parse(text: &str) -> CursorRule {
    match frontmatter::split(text) {
        (Some(header), body) => CursorRule {
            description: frontmatter::scalar(header, "description").unwrap_or_default(),
            globs: frontmatter::list(header, "globs"),
            always_apply: frontmatter::boolean(header, "alwaysApply").unwrap_or(false),
            content: body.to_string(),
        },
        (None, body) => CursorRule {
            content: body.to_string(),
            ..CursorRule::default()
        },
    }
}

/// Header is always written, fields in fixed order.
pub fn render(command: &Command) -> String {
    let mut out = String::from("---\n");
    out.push_str(&format!(
        "description: {}\n",
        frontmatter::scalar_value(&command.description)
    ));
    if !command.globs.is_empty() {
        out.push_str("globs:\n");
        for glob in &command.globs {
            out.push_str(&format!("  - {}\n", frontmatter::quote(glob)));
        }
    }
    out.push_str(&format!(
        "alwaysApply: {}\n",
        command.activation_mode == ActivationMode::Always
    ));
    out.push_str("---\n\n");
    out.push_str(&command.content);
    out
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Rules under `.cursor/rules/`, read from `.mdc` or `.md`, written as `.mdc`.
pub struct CursorAdapter {
    home: PathBuf,
}

impl CursorAdapter {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn load_dir(&self, dir: &Path, project: Option<&Path>) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        for file in io::list_files(dir, READ_EXTENSIONS)? {
            let text = std::fs::read_to_string(&file)?;
            let rule = parse(&text);
            let mut cmd = loaded_command(Service::Cursor, &file, io::file_stem(&file), project)?;
            cmd.activation_mode = rule.activation_mode();
            cmd.description = rule.description;
            cmd.globs = rule.globs;
            cmd.content = rule.content;
            commands.push(cmd);
        }
        tracing::debug!(dir = %dir.display(), count = commands.len(), "loaded cursor rules");
        Ok(commands)
    }
}

impl CommandAdapter for CursorAdapter {
    fn service(&self) -> Service {
        Service::Cursor
    }

    fn load_user_commands(&self) -> Result<Vec<Command>> {
        let loc = paths::location(Service::Cursor, Scope::User, &self.home, None)?;
        self.load_dir(loc.path(), None)
    }

    fn load_project_commands(&self, root: &Path) -> Result<Vec<Command>> {
        let loc = paths::location(Service::Cursor, Scope::Project, &self.home, Some(root))?;
        self.load_dir(loc.path(), Some(root))
    }

    fn target_path(&self, command: &Command) -> Result<PathBuf> {
        if let Some(existing) = &command.file_path {
            return Ok(existing.clone());
        }
        let loc = paths::location(
            Service::Cursor,
            command.scope,
            &self.home,
            command.project_path.as_deref(),
        )?;
        Ok(paths::command_file(&loc, &command.name, EXTENSION))
    }

    fn render(&self, command: &Command) -> String {
        render(command)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn globs_take_priority_over_description() {
        let rule = parse(
            "---\ndescription: TypeScript conventions\nglobs:\n  - \"**/*.ts\"\n---\n\nUse strict mode.\n",
        );
        assert_eq!(rule.globs, vec!["**/*.ts"]);
        assert!(!rule.always_apply);
        assert_eq!(rule.activation_mode(), ActivationMode::AutoAttach);
    }

    #[test]
    fn always_apply_beats_globs() {
        let rule = parse("---\ndescription: x\nglobs:\n  - \"*.rs\"\nalwaysApply: true\n---\n\nBody");
        assert_eq!(rule.activation_mode(), ActivationMode::Always);
    }

    #[test]
    fn description_only_is_model_decision() {
        let rule = parse("---\ndescription: Use when writing SQL\nalwaysApply: false\n---\n\nBody");
        assert_eq!(rule.activation_mode(), ActivationMode::ModelDecision);
    }

    #[test]
    fn no_header_is_manual() {
        let rule = parse("Just text");
        assert_eq!(rule.activation_mode(), ActivationMode::Manual);
        assert_eq!(rule.content, "Just text");
    }

    #[test]
    fn render_field_order_is_fixed() {
        let cmd = Command::new("ts", "Body", Service::Cursor)
            .with_description("TS rules")
            .with_globs(vec!["**/*.ts".into(), "src/**".into()])
            .with_activation(ActivationMode::AutoAttach);
        assert_eq!(
            render(&cmd),
            "---\ndescription: TS rules\nglobs:\n  - \"**/*.ts\"\n  - \"src/**\"\nalwaysApply: false\n---\n\nBody"
        );
    }

    #[test]
    fn render_omits_empty_globs() {
        let cmd = Command::new("all", "Body", Service::Cursor).with_activation(ActivationMode::Always);
        assert_eq!(
            render(&cmd),
            "---\ndescription: \nalwaysApply: true\n---\n\nBody"
        );
    }

    #[test]
    fn loads_md_and_mdc_and_writes_mdc() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join(".cursor/rules");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("legacy.md"), "Legacy body").unwrap();

        let adapter = CursorAdapter::new(home.path());
        let mut cmd = Command::new("fresh", "Fresh body", Service::Cursor);
        adapter.save_command(&mut cmd).unwrap();
        assert!(dir.join("fresh.mdc").exists());

        let names: Vec<_> = adapter
            .load_user_commands()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["fresh", "legacy"]);
    }

    #[test]
    fn existing_md_file_is_overwritten_in_place() {
        let home = TempDir::new().unwrap();
        let dir = home.path().join(".cursor/rules");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("legacy.md"), "Old").unwrap();

        let adapter = CursorAdapter::new(home.path());
        let mut cmd = adapter.load_user_commands().unwrap().remove(0);
        cmd.content = "New".into();
        adapter.save_command(&mut cmd).unwrap();

        assert!(!dir.join("legacy.mdc").exists());
        assert!(std::fs::read_to_string(dir.join("legacy.md"))
            .unwrap()
            .ends_with("New"));
    }

    #[test]
    fn quoted_description_survives_reload() {
        let home = TempDir::new().unwrap();
        let adapter = CursorAdapter::new(home.path());
        let mut cmd = Command::new("strict", "Body", Service::Cursor).with_description("\"strict\"");
        adapter.save_command(&mut cmd).unwrap();

        let loaded = adapter.load_user_commands().unwrap();
        assert_eq!(loaded[0].description, "\"strict\"");
    }

    fn arb_rule_command() -> impl Strategy<Value = Command> {
        (
            prop_oneof![
                Just(String::new()),
                "[A-Za-z0-9\"'][A-Za-z0-9 ,.\"']{0,30}[A-Za-z0-9.\"']",
            ],
            prop::collection::vec("[A-Za-z0-9*/._-]{1,12}", 0..4),
            any::<bool>(),
            "[ -~\n]{0,80}",
        )
            .prop_map(|(description, globs, always, content)| {
                let mode = derive_activation(always, &globs, &description);
                Command::new("rule", content, Service::Cursor)
                    .with_description(description)
                    .with_globs(globs)
                    .with_activation(mode)
            })
    }

    proptest! {
        #[test]
        fn render_then_parse_roundtrips(cmd in arb_rule_command()) {
            let rule = parse(&render(&cmd));
            let mut back = cmd.clone();
            back.activation_mode = rule.activation_mode();
            back.description = rule.description;
            back.globs = rule.globs;
            back.content = rule.content;
            prop_assert_eq!(back, cmd);
        }
    }
}
