// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::reconcile::resolver::ResolvedSource;
use crate::types::{PlanEntry, ReconciliationPlan, WorkloadId};
use std::collections::BTreeMap;

/// Build the plan of annotations each workload is missing.
///
/// Only absent keys count. A key already present with a different value is
/// left as it is.
pub fn diff(
    resolved: &BTreeMap<WorkloadId, ResolvedSource>,
    current: &BTreeMap<WorkloadId, BTreeMap<String, String>>,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::new();

    for (id, source) in resolved {
        let existing = current.get(id);
        let missing: BTreeMap<String, String> = source
            .annotations
            .iter()
            .filter(|(k, _)| !existing.is_some_and(|a| a.contains_key(*k)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if missing.is_empty() {
            continue;
        }

        plan.insert(
            id.clone(),
            PlanEntry {
                configmap: source.source_name.clone(),
                missing_annotations: missing,
            },
        );
    }

    plan
}
