// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation plan and its on-disk JSON form.

use crate::error::{AnnosyncError, Result};
use crate::types::workload::WorkloadId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Annotations one workload is missing, with the ConfigMap they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub configmap: String,
    #[serde(alias = "annotations")]
    pub missing_annotations: BTreeMap<String, String>,
}

/// Point-in-time set of annotation gaps, keyed by workload.
///
/// Every key in an entry was absent from the workload when the plan was
/// computed. The cluster may have moved on since.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, PlanEntry>",
    into = "BTreeMap<String, PlanEntry>"
)]
pub struct ReconciliationPlan {
    entries: BTreeMap<WorkloadId, PlanEntry>,
}

impl ReconciliationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: WorkloadId, entry: PlanEntry) {
        self.entries.insert(id, entry);
    }

    pub fn get(&self, id: &WorkloadId) -> Option<&PlanEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &WorkloadId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WorkloadId, &PlanEntry)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of workloads in the plan
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of annotations across all workloads
    pub fn annotation_count(&self) -> usize {
        self.entries
            .values()
            .map(|e| e.missing_annotations.len())
            .sum()
    }

    /// Write the plan as pretty JSON, replacing any previous plan
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)
            .map_err(|e| AnnosyncError::PlanFormat(e.to_string()))?;
        buf.push(b'\n');

        fs::write(path, buf).map_err(|source| AnnosyncError::PlanFile {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            "Saved plan with {} workloads to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Read a plan written by [`ReconciliationPlan::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => AnnosyncError::PlanFileMissing {
                path: path.to_path_buf(),
            },
            _ => AnnosyncError::PlanFile {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let plan: Self = serde_json::from_str(&contents)
            .map_err(|e| AnnosyncError::PlanFormat(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded plan with {} workloads from {}", plan.len(), path.display());
        Ok(plan)
    }

    /// Remove a consumed plan file. A file that is already gone is fine.
    pub fn discard(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed plan file {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(AnnosyncError::PlanFile {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<BTreeMap<String, PlanEntry>> for ReconciliationPlan {
    type Error = AnnosyncError;

    fn try_from(raw: BTreeMap<String, PlanEntry>) -> Result<Self> {
        let mut plan = Self::new();
        for (key, entry) in raw {
            plan.insert(WorkloadId::from_plan_key(&key)?, entry);
        }
        Ok(plan)
    }
}

impl From<ReconciliationPlan> for BTreeMap<String, PlanEntry> {
    fn from(plan: ReconciliationPlan) -> Self {
        plan.entries
            .into_iter()
            .map(|(id, entry)| (id.plan_key(), entry))
            .collect()
    }
}
