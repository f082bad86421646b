//! Propagation of commands between services.
//!
//! The engine holds no command state; it orchestrates [`CommandStore`] writes.
//! Only one sync may run at a time: a call made while another is in flight
//! returns `Ok(None)` without touching anything.

use crate::command::Command;
use crate::config::{Config, ConflictResolution, SyncTrigger};
use crate::error::{Result, SyncError};
use crate::store::CommandStore;
use crate::types::Service;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

// ---------------------------------------------------------------------------
// Settings / reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub enabled: BTreeSet<Service>,
    /// Advisory only; propagation always overwrites.
    pub resolution: ConflictResolution,
    pub trigger: SyncTrigger,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.enabled_services.clone(),
            resolution: config.conflict_resolution,
            trigger: config.sync_trigger,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncedEntry {
    pub name: String,
    pub service: Service,
    /// True when an existing copy was overwritten rather than created.
    pub overwritten: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub name: String,
    pub service: Service,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub synced: Vec<SyncedEntry>,
    pub failures: Vec<SyncFailure>,
}

// ---------------------------------------------------------------------------
// Single-flight guard
// ---------------------------------------------------------------------------

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// SyncEngine
// ---------------------------------------------------------------------------

pub struct SyncEngine {
    settings: SyncSettings,
    in_flight: AtomicBool,
}

impl SyncEngine {
    pub fn new(settings: SyncSettings) -> Self {
        Self {
            settings,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Services a sync of `command` would actually write to: enabled,
    /// installed, and not the owner.
    pub fn effective_targets(
        &self,
        store: &CommandStore,
        command: &Command,
        targets: &[Service],
    ) -> Vec<Service> {
        targets
            .iter()
            .copied()
            .filter(|t| {
                *t != command.source_service
                    && self.settings.enabled.contains(t)
                    && store.is_available(*t)
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Copy command `id` into each target service, overwriting matching copies.
    /// The owning service and disabled or missing services are dropped from
    /// `targets`.
    /// The first write failure is returned; earlier writes stay in place.
    pub fn sync_command(
        &self,
        store: &mut CommandStore,
        id: &str,
        targets: &[Service],
    ) -> Result<Option<SyncReport>> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!(id, "sync already in flight; ignoring");
            return Ok(None);
        };

        let source = store
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::CommandNotFound(id.to_string()))?;
        let effective = self.effective_targets(store, &source, targets);
        tracing::debug!(
            name = %source.name,
            from = %source.source_service,
            targets = ?effective,
            resolution = %self.settings.resolution,
            "syncing command"
        );

        let mut report = SyncReport::default();
        for target in effective {
            let overwritten = store.counterpart(&source, target).is_some();
            store.upsert_into(&source, target)?;
            report.synced.push(SyncedEntry {
                name: source.name.clone(),
                service: target,
                overwritten,
            });
        }
        Ok(Some(report))
    }

    /// Copy every command owned by `source` into `target`, one at a time.
    /// Failures are collected and do not undo earlier copies.
    pub fn sync_all(
        &self,
        store: &mut CommandStore,
        source: Service,
        target: Service,
    ) -> Result<Option<SyncReport>> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::debug!(%source, %target, "sync already in flight; ignoring");
            return Ok(None);
        };

        let mut report = SyncReport::default();
        if source == target {
            return Ok(Some(report));
        }
        if !store.is_available(target) {
            return Err(SyncError::ServiceUnavailable(target));
        }

        let commands: Vec<Command> = store.by_service(source).into_iter().cloned().collect();
        for command in commands {
            let overwritten = store.counterpart(&command, target).is_some();
            match store.upsert_into(&command, target) {
                Ok(_) => report.synced.push(SyncedEntry {
                    name: command.name.clone(),
                    service: target,
                    overwritten,
                }),
                Err(e) => {
                    tracing::warn!(name = %command.name, %target, error = %e, "failed to sync command");
                    report.failures.push(SyncFailure {
                        name: command.name.clone(),
                        service: target,
                        error: e.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            %source,
            %target,
            synced = report.synced.len(),
            failed = report.failures.len(),
            "bulk sync finished"
        );
        Ok(Some(report))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
