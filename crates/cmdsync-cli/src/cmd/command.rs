use crate::cmd::{read_content, Ctx};
use crate::output::{print_json, print_table, service_list};
use anyhow::Context;
use clap::Args;
use cmdsync_core::adapter::native_activation;
use cmdsync_core::config::SyncTrigger;
use cmdsync_core::store::CommandFilter;
use cmdsync_core::{ActivationMode, Command, CommandStore, Scope, Service};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Argument types
// ---------------------------------------------------------------------------

/// Identifies one command by name, optionally narrowed to a service/scope.
#[derive(Args)]
pub struct Selector {
    /// Command name
    pub name: String,
    /// Service that owns the command (claude, cursor, windsurf)
    #[arg(long, short = 's')]
    pub service: Option<Service>,
    /// user or project
    #[arg(long)]
    pub scope: Option<Scope>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Command name (letters, digits, '-' and '_')
    pub name: String,
    #[arg(long, short = 's', default_value = "claude")]
    pub service: Service,
    #[arg(long, default_value = "user")]
    pub scope: Scope,
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,
    /// Command body
    #[arg(long, short = 'c')]
    pub content: Option<String>,
    /// Read the body from a file
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
    /// File pattern the command attaches to (repeatable)
    #[arg(long = "glob")]
    pub globs: Vec<String>,
    /// Apply the command to every request
    #[arg(long)]
    pub always: bool,
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub selector: Selector,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    #[arg(long, short = 'c')]
    pub content: Option<String>,
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
    /// Replace the glob list (repeatable)
    #[arg(long = "glob")]
    pub globs: Vec<String>,
    /// Set the activation mode (always, manual, auto_attach, model_decision)
    #[arg(long)]
    pub mode: Option<ActivationMode>,
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

pub fn list(
    ctx: &Ctx,
    service: Option<Service>,
    scope: Option<Scope>,
    search: Option<String>,
) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let filter = CommandFilter {
        service,
        scope,
        project: None,
        query: search,
    };
    let commands = store.filter(&filter);

    if ctx.json {
        let items: Vec<serde_json::Value> = commands
            .iter()
            .map(|c| with_links(&store, c))
            .collect();
        return print_json(&items);
    }

    if commands.is_empty() {
        println!("No commands found.");
        return Ok(());
    }

    let rows = commands
        .iter()
        .map(|c| {
            vec![
                c.display_name(),
                c.source_service.to_string(),
                c.scope.to_string(),
                c.activation_mode.to_string(),
                service_list(&store.synced_services(c)),
            ]
        })
        .collect();
    print_table(&["NAME", "SERVICE", "SCOPE", "MODE", "SYNCED TO"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

pub fn show(ctx: &Ctx, selector: Selector) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let cmd = ctx.select(&store, &selector.name, selector.service, selector.scope)?;

    if ctx.json {
        return print_json(&with_links(&store, &cmd));
    }

    println!("Name:        {}", cmd.display_name());
    println!("Service:     {}", cmd.source_service.label());
    println!("Scope:       {}", cmd.scope);
    if let Some(root) = &cmd.project_path {
        println!("Project:     {}", root.display());
    }
    println!("Mode:        {}", cmd.activation_mode);
    if !cmd.description.is_empty() {
        println!("Description: {}", cmd.description);
    }
    if !cmd.globs.is_empty() {
        println!("Globs:       {}", cmd.globs.join(", "));
    }
    if let Some(path) = &cmd.file_path {
        println!("File:        {}", path.display());
    }
    if let Some(ts) = cmd.last_modified {
        println!("Modified:    {}", ts.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("Synced to:   {}", service_list(&store.synced_services(&cmd)));
    println!();
    println!("{}", cmd.content);
    Ok(())
}

fn with_links(store: &CommandStore, cmd: &Command) -> serde_json::Value {
    serde_json::json!({
        "command": cmd,
        "synced_services": store.synced_services(cmd),
    })
}

// ---------------------------------------------------------------------------
// add
// ---------------------------------------------------------------------------

pub fn add(ctx: &Ctx, args: AddArgs) -> anyhow::Result<()> {
    let content = read_content(args.content, args.file.as_deref())?.unwrap_or_default();
    let base = match args.scope {
        Scope::User => Command::new(&args.name, content, args.service),
        Scope::Project => {
            Command::new_project(&args.name, content, args.service, ctx.project_root()?)
        }
    };
    let mode = native_activation(args.service, args.always, &args.globs, &args.description);
    let mut cmd = base
        .with_description(args.description)
        .with_globs(args.globs)
        .with_activation(mode);
    if let Some(ns) = args.namespace {
        cmd = cmd.with_namespace(ns);
    }

    let mut store = ctx.open_store()?;
    let saved = store
        .add(cmd)
        .with_context(|| format!("failed to add '{}'", args.name))?;

    if ctx.json {
        return print_json(&saved);
    }
    println!("Added {} to {}.", saved.display_name(), saved.source_service.label());
    Ok(())
}

// ---------------------------------------------------------------------------
// edit
// ---------------------------------------------------------------------------

pub fn edit(ctx: &Ctx, args: EditArgs) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let sel = &args.selector;
    let mut cmd = ctx.select(&store, &sel.name, sel.service, sel.scope)?;

    let retrigger = args.description.is_some() || !args.globs.is_empty();
    if let Some(d) = args.description {
        cmd.description = d;
    }
    if let Some(c) = read_content(args.content, args.file.as_deref())? {
        cmd.content = c;
    }
    if !args.globs.is_empty() {
        cmd.globs = args.globs;
    }
    match args.mode {
        Some(mode) => cmd.activation_mode = mode,
        None if retrigger => {
            cmd.activation_mode = native_activation(
                cmd.source_service,
                cmd.activation_mode == ActivationMode::Always,
                &cmd.globs,
                &cmd.description,
            );
        }
        None => {}
    }

    let linked = store.synced_services(&cmd);
    let saved = store
        .update(cmd)
        .with_context(|| format!("failed to save '{}'", sel.name))?;

    let mut propagated = Vec::new();
    if ctx.config.sync_trigger == SyncTrigger::OnChange && !linked.is_empty() {
        let engine = ctx.engine();
        if let Some(report) = engine.sync_command(&mut store, &saved.id, &linked)? {
            propagated = report.synced.into_iter().map(|e| e.service).collect();
        }
    }

    if ctx.json {
        return print_json(&serde_json::json!({
            "command": saved,
            "propagated_to": propagated,
        }));
    }
    println!("Saved {}.", saved.display_name());
    if !propagated.is_empty() {
        println!("Propagated to {}.", service_list(&propagated));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// rename
// ---------------------------------------------------------------------------

pub fn rename(ctx: &Ctx, selector: Selector, new_name: &str) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let cmd = ctx.select(&store, &selector.name, selector.service, selector.scope)?;
    let renamed = store
        .rename(&cmd.id, new_name)
        .with_context(|| format!("failed to rename '{}'", cmd.name))?;

    if ctx.json {
        return print_json(&renamed);
    }
    println!(
        "Renamed {} to {} in {}.",
        cmd.name,
        renamed.name,
        renamed.source_service.label()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

pub fn delete(ctx: &Ctx, selector: Selector, all_services: bool) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let cmd = ctx.select(&store, &selector.name, selector.service, selector.scope)?;

    let mut removed_from = vec![cmd.source_service];
    if all_services {
        removed_from.extend(store.synced_services(&cmd));
        removed_from.sort();
        store
            .delete_from_all_services(&cmd.id)
            .with_context(|| format!("failed to delete '{}'", cmd.name))?;
    } else {
        store
            .delete(&cmd.id)
            .with_context(|| format!("failed to delete '{}'", cmd.name))?;
    }

    if ctx.json {
        return print_json(&serde_json::json!({
            "name": cmd.name,
            "deleted_from": removed_from,
        }));
    }
    println!("Deleted {} from {}.", cmd.name, service_list(&removed_from));
    Ok(())
}
