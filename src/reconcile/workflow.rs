// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The compute and apply phases of a reconciliation run.

use crate::config::Config;
use crate::error::{AnnosyncError, Result};
use crate::kubernetes::ClusterAdapter;
use crate::reconcile::diff::diff;
use crate::reconcile::mutator::{ApplyReport, Mutator};
use crate::reconcile::planner::{preview, Confirmation};
use crate::reconcile::resolver::resolve;
use crate::types::{ReconciliationPlan, Workload, WorkloadKind};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// Stages of a single run. Runs only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Queried,
    Resolved,
    Diffed,
    Planned,
    AwaitingConfirmation,
    SkippedNoChanges,
    Applying,
    Done,
}

impl Stage {
    fn successors(self) -> &'static [Stage] {
        match self {
            Stage::Idle => &[Stage::Queried],
            Stage::Queried => &[Stage::Resolved],
            Stage::Resolved => &[Stage::Diffed],
            Stage::Diffed => &[Stage::Planned],
            Stage::Planned => &[
                Stage::AwaitingConfirmation,
                Stage::SkippedNoChanges,
                Stage::Done,
            ],
            Stage::AwaitingConfirmation => &[Stage::Applying, Stage::Done],
            Stage::SkippedNoChanges => &[Stage::Done],
            Stage::Applying => &[Stage::Done],
            Stage::Done => &[],
        }
    }

    pub fn can_advance_to(self, next: Stage) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks the stage of the current run
#[derive(Debug)]
pub struct Run {
    stage: Stage,
}

impl Run {
    pub fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    /// A run continuing from a plan persisted by an earlier compute phase
    pub fn from_saved_plan() -> Self {
        Self {
            stage: Stage::Planned,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn advance(&mut self, next: Stage) -> Result<()> {
        if !self.stage.can_advance_to(next) {
            return Err(AnnosyncError::InvalidTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }
        debug!("Run stage {} -> {}", self.stage, next);
        self.stage = next;
        Ok(())
    }
}

impl Default for Run {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the plan for the configured namespace and write it to the plan file.
///
/// An empty plan is written too. Fails only when no usable data could be read.
#[instrument(skip(adapter, config), fields(namespace = %config.namespace))]
pub async fn compute(adapter: &ClusterAdapter, config: &Config) -> Result<ReconciliationPlan> {
    let mut run = Run::new();
    debug!(
        "Recognized annotation keys: {:?}",
        config.annotation_keys.iter().collect::<Vec<_>>()
    );

    let sources = match adapter.list_configuration_sources().await {
        Ok(sources) => Some(sources),
        Err(e) => {
            error!("{}", e);
            None
        }
    };

    let mut workloads: Vec<Workload> = Vec::new();
    let mut visible_kinds = 0;
    for kind in [WorkloadKind::Deployment, WorkloadKind::StatefulSet] {
        match adapter.list_workloads(kind).await {
            Ok(mut found) => {
                visible_kinds += 1;
                workloads.append(&mut found);
            }
            Err(e) => warn!("{}, continuing without {} workloads", e, kind),
        }
    }

    let Some(sources) = sources else {
        return Err(AnnosyncError::SourceDataUnavailable(format!(
            "could not list configmaps in namespace {}",
            config.namespace
        )));
    };
    if visible_kinds == 0 {
        return Err(AnnosyncError::SourceDataUnavailable(format!(
            "could not list any workloads in namespace {}",
            config.namespace
        )));
    }
    run.advance(Stage::Queried)?;
    info!(
        "Found {} workloads and {} configmaps",
        workloads.len(),
        sources.len()
    );

    let resolved = resolve(&workloads, &sources, &config.annotation_keys);
    run.advance(Stage::Resolved)?;
    debug!("{} workloads bind configmaps with annotation keys", resolved.len());

    let current: BTreeMap<_, _> = workloads
        .into_iter()
        .map(|w| (w.id, w.annotations))
        .collect();
    let plan = diff(&resolved, &current);
    run.advance(Stage::Diffed)?;

    plan.save(&config.plan_file)?;
    run.advance(Stage::Planned)?;

    if plan.is_empty() {
        info!("No missing annotations detected");
    } else {
        info!(
            "{} annotations missing on {} workloads",
            plan.annotation_count(),
            plan.len()
        );
    }
    Ok(plan)
}

/// How an apply run ended
#[derive(Debug)]
pub enum ApplyStatus {
    /// The plan was empty, nothing to do
    NoChanges,
    /// Preview only, carries the rendered preview
    DryRun(String),
    /// The operator declined
    Declined,
    Applied(ApplyReport),
}

/// Load the saved plan, preview it, ask for confirmation and apply it.
///
/// Per-workload failures are part of the report, not an error. The plan
/// file is removed once it has been applied without failures.
#[instrument(skip(adapter, config, confirmation), fields(namespace = %config.namespace))]
pub async fn apply(
    adapter: &ClusterAdapter,
    config: &Config,
    confirmation: &dyn Confirmation,
    dry_run: bool,
) -> Result<ApplyStatus> {
    let plan = ReconciliationPlan::load(&config.plan_file)?;
    let mut run = Run::from_saved_plan();

    if plan.is_empty() {
        run.advance(Stage::SkippedNoChanges)?;
        info!("Plan is empty, nothing to apply");
        ReconciliationPlan::discard(&config.plan_file)?;
        run.advance(Stage::Done)?;
        return Ok(ApplyStatus::NoChanges);
    }

    let summary = preview(&plan, &config.namespace);
    if dry_run {
        run.advance(Stage::Done)?;
        return Ok(ApplyStatus::DryRun(summary));
    }

    run.advance(Stage::AwaitingConfirmation)?;
    if !confirmation.confirm(&summary)? {
        info!("Operator declined, plan left in {}", config.plan_file.display());
        run.advance(Stage::Done)?;
        return Ok(ApplyStatus::Declined);
    }

    run.advance(Stage::Applying)?;
    let results = Mutator::new(adapter, config).apply(&plan).await;
    let report = ApplyReport::from_results(&results);

    if report.has_failures() {
        warn!(
            "{} of {} workloads failed, keeping {}",
            report.failed.len(),
            report.total(),
            config.plan_file.display()
        );
    } else {
        ReconciliationPlan::discard(&config.plan_file)?;
    }
    run.advance(Stage::Done)?;

    Ok(ApplyStatus::Applied(report))
}
