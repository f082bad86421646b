use crate::cmd::Ctx;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use cmdsync_core::config::{ConflictResolution, SyncTrigger, WarnLevel};
use cmdsync_core::Service;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Allow sync to write to a service
    Enable { service: Service },

    /// Stop sync from writing to a service
    Disable { service: Service },

    /// Record the conflict policy: newer-wins, source-wins, or ask-user
    SetResolution { value: ConflictResolution },

    /// Choose when edits propagate: manual or on-change
    SetTrigger { value: SyncTrigger },

    /// Remember a project root (default: the current project)
    AddProject { path: Option<PathBuf> },

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &mut Ctx, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(ctx),
        ConfigSubcommand::Enable { service } => {
            ctx.config.enabled_services.insert(service);
            save(ctx, &format!("Enabled {}.", service.label()))
        }
        ConfigSubcommand::Disable { service } => {
            ctx.config.enabled_services.remove(&service);
            save(ctx, &format!("Disabled {}.", service.label()))
        }
        ConfigSubcommand::SetResolution { value } => {
            ctx.config.conflict_resolution = value;
            save(ctx, &format!("Conflict resolution set to {value}."))
        }
        ConfigSubcommand::SetTrigger { value } => {
            ctx.config.sync_trigger = value;
            save(ctx, &format!("Sync trigger set to {value}."))
        }
        ConfigSubcommand::AddProject { path } => add_project(ctx, path),
        ConfigSubcommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Ctx) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(&ctx.config);
    }
    let yaml = serde_yaml::to_string(&ctx.config)?;
    print!("{yaml}");
    Ok(())
}

fn save(ctx: &Ctx, message: &str) -> anyhow::Result<()> {
    ctx.config
        .save(&ctx.home)
        .context("failed to save config")?;
    if ctx.json {
        return print_json(&ctx.config);
    }
    println!("{message}");
    Ok(())
}

fn add_project(ctx: &mut Ctx, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(p) if p.is_relative() => std::env::current_dir()?.join(p),
        Some(p) => p,
        None => ctx.project_root()?.to_path_buf(),
    };
    if !path.is_dir() {
        anyhow::bail!("{} is not a directory", path.display());
    }
    if ctx.config.add_project(&path) {
        save(ctx, &format!("Added project {}.", path.display()))
    } else {
        println!("Project {} is already known.", path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(ctx: &Ctx) -> anyhow::Result<()> {
    let warnings = ctx.config.validate();

    if ctx.json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
