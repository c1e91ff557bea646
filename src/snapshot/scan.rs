// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed scan of a snapshot document for annotated workloads.

use crate::constants::DEFAULT_SNAPSHOT_NAMESPACE;
use crate::error::{AnnosyncError, Result};
use crate::types::{AnnotationKeySet, WorkloadKind};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

/// An object in a snapshot. `List` objects carry nested `items`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotObject {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: Option<ObjectMeta>,
    #[serde(default)]
    pub items: Vec<SnapshotObject>,
}

/// Where a workload kind was resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSource {
    Direct,
    OwnerReference,
}

/// Resolve the workload kind of an object.
///
/// An explicit `kind` decides on its own. Objects without one fall back to
/// the first owner reference naming a supported kind.
pub fn resolve_kind(object: &SnapshotObject) -> Option<(WorkloadKind, KindSource)> {
    if let Some(kind) = object.kind.as_deref().filter(|k| !k.is_empty()) {
        return WorkloadKind::from_kind(kind).map(|k| (k, KindSource::Direct));
    }

    object
        .metadata
        .as_ref()?
        .owner_references
        .as_ref()?
        .iter()
        .find_map(|owner| WorkloadKind::from_kind(&owner.kind))
        .map(|k| (k, KindSource::OwnerReference))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CapturedWorkload {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
    pub annotations: BTreeMap<String, String>,
}

/// Result of scanning a snapshot
#[derive(Debug, Default)]
pub struct SnapshotScan {
    pub deployments: usize,
    pub stateful_sets: usize,
    /// Workloads with at least one recognized annotation, keyed by (kind, namespace, name)
    pub captured: BTreeMap<(WorkloadKind, String, String), CapturedWorkload>,
}

impl SnapshotScan {
    pub fn workloads(&self) -> impl Iterator<Item = &CapturedWorkload> {
        self.captured.values()
    }

    /// Warnings for kinds found fewer times than expected
    pub fn shortfalls(
        &self,
        expected_deployments: Option<usize>,
        expected_stateful_sets: Option<usize>,
    ) -> Vec<String> {
        let mut warnings = Vec::new();
        let checks = [
            ("Deployments", self.deployments, expected_deployments),
            ("StatefulSets", self.stateful_sets, expected_stateful_sets),
        ];
        for (label, found, expected) in checks {
            if let Some(expected) = expected {
                if found < expected {
                    warnings.push(format!(
                        "Found {} {} but expected {}, the snapshot may be incomplete",
                        found, label, expected
                    ));
                }
            }
        }
        warnings
    }
}

/// Read a snapshot document from disk
pub fn load_snapshot(path: &Path) -> Result<SnapshotObject> {
    let file = File::open(path)
        .map_err(|e| AnnosyncError::Snapshot(format!("{}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AnnosyncError::Snapshot(format!("{}: {}", path.display(), e)))
}

/// Walk the document and capture recognized annotations of every workload
pub fn scan(document: &SnapshotObject, keys: &AnnotationKeySet) -> SnapshotScan {
    let mut result = SnapshotScan::default();
    let mut pending = vec![document];

    while let Some(object) = pending.pop() {
        // Reverse keeps document order when popping.
        pending.extend(object.items.iter().rev());

        let Some(metadata) = object.metadata.as_ref() else {
            continue;
        };
        let Some(name) = metadata.name.as_deref() else {
            continue;
        };
        let Some((kind, source)) = resolve_kind(object) else {
            continue;
        };

        match kind {
            WorkloadKind::Deployment => result.deployments += 1,
            WorkloadKind::StatefulSet => result.stateful_sets += 1,
        }
        let namespace = metadata
            .namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_SNAPSHOT_NAMESPACE.to_string());
        debug!("Found {} {}/{} ({:?})", kind, namespace, name, source);

        let annotations = metadata
            .annotations
            .as_ref()
            .map(|a| keys.filter(a))
            .unwrap_or_default();
        if annotations.is_empty() {
            continue;
        }

        let key = (kind, namespace.clone(), name.to_string());
        let captured = CapturedWorkload {
            kind,
            namespace,
            name: name.to_string(),
            annotations,
        };
        if let Some(previous) = result.captured.insert(key, captured.clone()) {
            if previous != captured {
                warn!(
                    "{} {}/{} appears more than once with different annotations, keeping the last",
                    kind, captured.namespace, captured.name
                );
            }
        }
    }

    result
}
