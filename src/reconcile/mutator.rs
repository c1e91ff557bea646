// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Applies a plan one workload at a time, collecting per-workload outcomes.

use crate::config::Config;
use crate::constants::retry::MAX_BACKOFF_MS;
use crate::error::MutationError;
use crate::kubernetes::ClusterAdapter;
use crate::types::{PlanEntry, ReconciliationPlan, WorkloadId};
use futures::{stream, StreamExt};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Missing annotations were merged onto the workload
    Patched,
    /// The workload no longer exists
    SkippedStale,
    /// Every planned key was set by someone else since the plan was computed
    AlreadyPresent,
}

pub type MutationResult = (WorkloadId, Result<MutationOutcome, MutationError>);

pub struct Mutator<'a> {
    adapter: &'a ClusterAdapter,
    retries: u32,
    backoff: Duration,
    concurrency: usize,
}

impl<'a> Mutator<'a> {
    pub fn new(adapter: &'a ClusterAdapter, config: &Config) -> Self {
        Self {
            adapter,
            retries: config.mutation_retries,
            backoff: config.retry_backoff,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Patch every workload in the plan. A failure never stops the others.
    ///
    /// Results are sorted by workload identity.
    pub async fn apply(&self, plan: &ReconciliationPlan) -> Vec<MutationResult> {
        let mut results: Vec<MutationResult> = stream::iter(plan.iter())
            .map(move |(id, entry)| async move { (id.clone(), self.apply_one(id, entry).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    #[instrument(skip(self, entry), fields(workload = %id))]
    async fn apply_one(
        &self,
        id: &WorkloadId,
        entry: &PlanEntry,
    ) -> Result<MutationOutcome, MutationError> {
        let adapter = self.adapter;

        let current = self
            .with_retry(move || adapter.current_annotations(id))
            .await
            .inspect_err(|e| error!("Failed to read {}: {}", id, e))?;
        let Some(current) = current else {
            warn!("Skipping {}: workload no longer exists", id);
            return Ok(MutationOutcome::SkippedStale);
        };

        let missing = still_missing(&entry.missing_annotations, &current);
        if missing.is_empty() {
            info!("Skipping {}: planned annotations are already set", id);
            return Ok(MutationOutcome::AlreadyPresent);
        }
        if missing.len() < entry.missing_annotations.len() {
            warn!(
                "{} of {} planned annotations on {} were set since compute, leaving them",
                entry.missing_annotations.len() - missing.len(),
                entry.missing_annotations.len(),
                id
            );
        }

        let annotations = &missing;
        let found = self
            .with_retry(move || adapter.patch_annotations(id, annotations))
            .await
            .inspect_err(|e| error!("Failed to annotate {}: {}", id, e))?;
        if !found {
            warn!("Skipping {}: workload disappeared before patch", id);
            return Ok(MutationOutcome::SkippedStale);
        }

        info!("Added {} annotations to {}", annotations.len(), id);
        Ok(MutationOutcome::Patched)
    }

    /// Run `op`, retrying transient failures with exponential backoff
    async fn with_retry<T, F, Fut>(&self, mut op: F) -> Result<T, MutationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MutationError>>,
    {
        let mut attempt = 0;
        let mut backoff = self.backoff;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Transient error: {}, retry {}/{} in {:?}",
                        e, attempt, self.retries, backoff
                    );
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(Duration::from_millis(MAX_BACKOFF_MS));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Planned pairs whose key is absent from `current`
fn still_missing(
    planned: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    planned
        .iter()
        .filter(|(key, _)| !current.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Summary of an apply run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub patched: Vec<WorkloadId>,
    pub skipped: Vec<WorkloadId>,
    pub unchanged: Vec<WorkloadId>,
    pub failed: Vec<(WorkloadId, String)>,
}

impl ApplyReport {
    pub fn from_results(results: &[MutationResult]) -> Self {
        let mut report = Self::default();
        for (id, result) in results {
            match result {
                Ok(MutationOutcome::Patched) => report.patched.push(id.clone()),
                Ok(MutationOutcome::SkippedStale) => report.skipped.push(id.clone()),
                Ok(MutationOutcome::AlreadyPresent) => report.unchanged.push(id.clone()),
                Err(e) => report.failed.push((id.clone(), e.to_string())),
            }
        }
        report
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.patched.len() + self.skipped.len() + self.unchanged.len() + self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::types::AnnotationKeySet;
    use serde_json::json;

    const NS: &str = "ns1";

    fn config() -> Config {
        Config::new(NS, AnnotationKeySet::default()).with_retries(0, Duration::from_millis(1))
    }

    fn plan_for(ids: &[WorkloadId]) -> ReconciliationPlan {
        let mut plan = ReconciliationPlan::new();
        for id in ids {
            plan.insert(
                id.clone(),
                PlanEntry {
                    configmap: "cfg-a".to_string(),
                    missing_annotations: BTreeMap::from([(
                        "team.io/tier".to_string(),
                        "gold".to_string(),
                    )]),
                },
            );
        }
        plan
    }

    fn with_deployment(mock: MockService, name: &str) -> MockService {
        let path = format!("{}/{}", deployments_path(NS), name);
        let body = deployment_value(name, NS, &[], &["cfg-a"]).to_string();
        mock.on_get(&path, 200, &body).on_patch(&path, 200, &body)
    }

    #[tokio::test]
    async fn test_apply_partial_failure_continues() {
        let mut mock = MockService::new();
        for name in ["svc-a", "svc-b", "svc-d"] {
            mock = with_deployment(mock, name);
        }
        let broken = format!("{}/svc-c", deployments_path(NS));
        let mock = mock
            .on_get(
                &broken,
                200,
                &deployment_value("svc-c", NS, &[], &[]).to_string(),
            )
            .on_patch(
                &broken,
                422,
                &status_json(422, "Invalid", "metadata.annotations: Invalid value"),
            );
        let adapter = ClusterAdapter::new(mock.into_client(), NS);
        let plan = plan_for(&[
            WorkloadId::deployment("svc-a"),
            WorkloadId::deployment("svc-b"),
            WorkloadId::deployment("svc-c"),
            WorkloadId::deployment("svc-d"),
        ]);

        let results = Mutator::new(&adapter, &config()).apply(&plan).await;
        let report = ApplyReport::from_results(&results);

        assert_eq!(report.total(), 4);
        assert_eq!(report.patched.len(), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, WorkloadId::deployment("svc-c"));
    }

    #[tokio::test]
    async fn test_apply_vanished_workload_is_skipped() {
        let mock = with_deployment(MockService::new(), "svc-a");
        let adapter = ClusterAdapter::new(mock.clone().into_client(), NS);
        let plan = plan_for(&[WorkloadId::deployment("svc-a"), WorkloadId::deployment("gone")]);

        let results = Mutator::new(&adapter, &config()).apply(&plan).await;
        let report = ApplyReport::from_results(&results);

        assert_eq!(report.patched, vec![WorkloadId::deployment("svc-a")]);
        assert_eq!(report.skipped, vec![WorkloadId::deployment("gone")]);
        assert!(!report.has_failures());
        assert!(mock
            .requests_with_method("PATCH")
            .iter()
            .all(|r| !r.path.ends_with("/gone")));
    }

    #[tokio::test]
    async fn test_apply_results_sorted_with_concurrency() {
        let mut mock = MockService::new();
        for name in ["svc-c", "svc-a", "svc-b"] {
            mock = with_deployment(mock, name);
        }
        let adapter = ClusterAdapter::new(mock.into_client(), NS);
        let plan = plan_for(&[
            WorkloadId::deployment("svc-c"),
            WorkloadId::deployment("svc-a"),
            WorkloadId::deployment("svc-b"),
        ]);
        let config = config().with_concurrency(3);

        let results = Mutator::new(&adapter, &config).apply(&plan).await;

        let ids: Vec<&str> = results.iter().map(|(id, _)| id.name.as_str()).collect();
        assert_eq!(ids, vec!["svc-a", "svc-b", "svc-c"]);
        assert!(results.iter().all(|(_, r)| r.is_ok()));
    }

    #[tokio::test]
    async fn test_apply_leaves_annotations_set_after_compute() {
        let path = format!("{}/svc-a", deployments_path(NS));
        let body = deployment_value("svc-a", NS, &[("team.io/tier", "silver")], &["cfg-a"]);
        let mock = MockService::new()
            .on_get(&path, 200, &body.to_string())
            .on_patch(&path, 200, &body.to_string());
        let adapter = ClusterAdapter::new(mock.clone().into_client(), NS);

        let results = Mutator::new(&adapter, &config())
            .apply(&plan_for(&[WorkloadId::deployment("svc-a")]))
            .await;

        assert!(matches!(results[0].1, Ok(MutationOutcome::AlreadyPresent)));
        assert!(mock.requests_with_method("PATCH").is_empty());
        let report = ApplyReport::from_results(&results);
        assert_eq!(report.unchanged, vec![WorkloadId::deployment("svc-a")]);
        assert_eq!(report.total(), 1);
    }

    #[tokio::test]
    async fn test_apply_patches_only_keys_still_missing() {
        let path = format!("{}/svc-a", deployments_path(NS));
        let body = deployment_value("svc-a", NS, &[("team.io/owner", "infra")], &["cfg-a"]);
        let mock = MockService::new()
            .on_get(&path, 200, &body.to_string())
            .on_patch(&path, 200, &body.to_string());
        let adapter = ClusterAdapter::new(mock.clone().into_client(), NS);
        let mut plan = ReconciliationPlan::new();
        plan.insert(
            WorkloadId::deployment("svc-a"),
            PlanEntry {
                configmap: "cfg-a".to_string(),
                missing_annotations: BTreeMap::from([
                    ("team.io/owner".to_string(), "payments".to_string()),
                    ("team.io/tier".to_string(), "gold".to_string()),
                ]),
            },
        );

        let results = Mutator::new(&adapter, &config()).apply(&plan).await;

        assert!(matches!(results[0].1, Ok(MutationOutcome::Patched)));
        let patches = mock.requests_with_method("PATCH");
        assert_eq!(patches.len(), 1);
        assert_eq!(
            patches[0].body,
            Some(json!({ "metadata": { "annotations": { "team.io/tier": "gold" } } }))
        );
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let path = format!("{}/svc-a", deployments_path(NS));
        let mock = MockService::new()
            .on_get(&path, 200, &deployment_value("svc-a", NS, &[], &[]).to_string())
            .on_patch(
                &path,
                503,
                &status_json(503, "ServiceUnavailable", "etcd leader changed"),
            );
        let adapter = ClusterAdapter::new(mock.clone().into_client(), NS);
        let config = config().with_retries(2, Duration::from_millis(1));

        let results = Mutator::new(&adapter, &config)
            .apply(&plan_for(&[WorkloadId::deployment("svc-a")]))
            .await;

        assert!(matches!(
            results[0].1,
            Err(MutationError::Rejected { code: 503, .. })
        ));
        assert_eq!(mock.requests_with_method("PATCH").len(), 3);
    }
}
