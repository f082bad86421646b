use crate::cmd::Ctx;
use crate::output::{print_json, print_table};
use cmdsync_core::Service;

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.open_store()?;

    if ctx.json {
        let services: Vec<serde_json::Value> = Service::all()
            .iter()
            .map(|&s| {
                serde_json::json!({
                    "service": s,
                    "available": store.is_available(s),
                    "enabled": ctx.config.enabled_services.contains(&s),
                    "commands": store.by_service(s).len(),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "home": ctx.home,
            "root": ctx.root,
            "conflict_resolution": ctx.config.conflict_resolution,
            "sync_trigger": ctx.config.sync_trigger,
            "services": services,
        }));
    }

    println!("Home:    {}", ctx.home.display());
    match &ctx.root {
        Some(root) => println!("Project: {}", root.display()),
        None => println!("Project: (none)"),
    }
    println!(
        "Sync:    {} trigger, {} on conflict",
        ctx.config.sync_trigger, ctx.config.conflict_resolution
    );
    println!();

    let rows = Service::all()
        .iter()
        .map(|&s| {
            vec![
                s.label().to_string(),
                yes_no(store.is_available(s)),
                yes_no(ctx.config.enabled_services.contains(&s)),
                store.by_service(s).len().to_string(),
            ]
        })
        .collect();
    print_table(&["SERVICE", "INSTALLED", "ENABLED", "COMMANDS"], rows);
    Ok(())
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}
