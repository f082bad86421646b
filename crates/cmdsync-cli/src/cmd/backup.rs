use crate::cmd::Ctx;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum BackupSubcommand {
    /// List saved backups of a command file, newest first
    List { path: PathBuf },

    /// Put the newest backup of a command file back in place
    Restore { path: PathBuf },
}

pub fn run(ctx: &Ctx, subcmd: BackupSubcommand) -> anyhow::Result<()> {
    match subcmd {
        BackupSubcommand::List { path } => list(ctx, &path),
        BackupSubcommand::Restore { path } => restore(ctx, &path),
    }
}

fn list(ctx: &Ctx, path: &Path) -> anyhow::Result<()> {
    let backups = ctx.config.backup_manager(&ctx.home);
    let entries = backups
        .list(path)
        .with_context(|| format!("failed to list backups of {}", path.display()))?;

    if ctx.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No backups of {}.", path.display());
        return Ok(());
    }
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                e.created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                e.path.display().to_string(),
            ]
        })
        .collect();
    print_table(&["CREATED", "BACKUP"], rows);
    Ok(())
}

fn restore(ctx: &Ctx, path: &Path) -> anyhow::Result<()> {
    let backups = ctx.config.backup_manager(&ctx.home);
    let from = backups
        .restore(path)
        .with_context(|| format!("failed to restore {}", path.display()))?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "restored": path,
            "from": from,
        }));
    }
    println!("Restored {} from {}.", path.display(), from.display());
    Ok(())
}
