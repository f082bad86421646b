use crate::cmd::command::Selector;
use crate::cmd::Ctx;
use crate::output::{print_json, print_table, service_list};
use anyhow::Context;
use cmdsync_core::sync::SyncReport;
use cmdsync_core::Service;
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// sync <name> --to ...
// ---------------------------------------------------------------------------

pub fn sync_one(ctx: &Ctx, selector: Selector, to: &[Service]) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let cmd = ctx.select(&store, &selector.name, selector.service, selector.scope)?;
    let engine = ctx.engine();

    let effective = engine.effective_targets(&store, &cmd, to);
    for s in to {
        if *s != cmd.source_service && !effective.contains(s) {
            tracing::warn!(service = %s, "service is disabled or not installed; skipping");
        }
    }

    let report = engine
        .sync_command(&mut store, &cmd.id, to)
        .with_context(|| format!("failed to sync '{}'", cmd.name))?;
    print_report(ctx, report)
}

// ---------------------------------------------------------------------------
// sync-all --from --to
// ---------------------------------------------------------------------------

pub fn sync_all(ctx: &Ctx, from: Service, to: Service) -> anyhow::Result<()> {
    if !ctx.config.enabled_services.contains(&to) {
        anyhow::bail!("{} is disabled in config", to.label());
    }
    let mut store = ctx.open_store()?;
    let report = ctx.engine().sync_all(&mut store, from, to)?;
    let failed = report.as_ref().map_or(0, |r| r.failures.len());
    print_report(ctx, report)?;
    if failed > 0 {
        anyhow::bail!("{failed} command(s) failed to sync");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// services <name> [--set a,b]
// ---------------------------------------------------------------------------

pub fn services(ctx: &Ctx, selector: Selector, set: Option<Vec<Service>>) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let cmd = ctx.select(&store, &selector.name, selector.service, selector.scope)?;

    let services = match set {
        None => {
            let mut held = store.synced_services(&cmd);
            held.push(cmd.source_service);
            held.sort();
            held
        }
        Some(targets) => {
            let targets: BTreeSet<Service> = targets.into_iter().collect();
            store
                .update_command_services(&cmd.id, &targets)
                .with_context(|| format!("failed to update services for '{}'", cmd.name))?
        }
    };

    if ctx.json {
        return print_json(&serde_json::json!({
            "name": cmd.name,
            "services": services,
        }));
    }
    println!("{}: {}", cmd.display_name(), service_list(&services));
    Ok(())
}

fn print_report(ctx: &Ctx, report: Option<SyncReport>) -> anyhow::Result<()> {
    let Some(report) = report else {
        println!("Another sync is already running; nothing done.");
        return Ok(());
    };

    if ctx.json {
        return print_json(&report);
    }

    if report.synced.is_empty() && report.failures.is_empty() {
        println!("Nothing to sync.");
        return Ok(());
    }

    let mut rows: Vec<Vec<String>> = report
        .synced
        .iter()
        .map(|e| {
            let action = if e.overwritten { "updated" } else { "created" };
            vec![e.name.clone(), e.service.to_string(), action.to_string()]
        })
        .collect();
    rows.extend(report.failures.iter().map(|f| {
        vec![
            f.name.clone(),
            f.service.to_string(),
            format!("failed: {}", f.error),
        ]
    }));
    print_table(&["NAME", "SERVICE", "RESULT"], rows);
    Ok(())
}
