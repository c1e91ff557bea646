// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workload identity and the typed view of a Deployment or StatefulSet.

use crate::error::{AnnosyncError, Result};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
}

impl WorkloadKind {
    /// Lowercase resource name as accepted by kubectl
    pub fn resource_name(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::StatefulSet => "statefulset",
        }
    }

    /// Parse a kind case-insensitively, returning `None` for unsupported kinds
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "deployment" => Some(WorkloadKind::Deployment),
            "statefulset" => Some(WorkloadKind::StatefulSet),
            _ => None,
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

/// Identity of a workload within the namespace of a run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkloadId {
    pub kind: WorkloadKind,
    pub name: String,
}

impl WorkloadId {
    pub fn new(kind: WorkloadKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn deployment(name: impl Into<String>) -> Self {
        Self::new(WorkloadKind::Deployment, name)
    }

    pub fn stateful_set(name: impl Into<String>) -> Self {
        Self::new(WorkloadKind::StatefulSet, name)
    }

    /// Key used in the plan file: the bare name for Deployments, `<kind>/<name>` otherwise
    pub fn plan_key(&self) -> String {
        match self.kind {
            WorkloadKind::Deployment => self.name.clone(),
            kind => format!("{}/{}", kind.resource_name(), self.name),
        }
    }

    /// Inverse of [`WorkloadId::plan_key`]
    pub fn from_plan_key(key: &str) -> Result<Self> {
        let (kind, name) = match key.split_once('/') {
            Some((kind, name)) => {
                let kind = WorkloadKind::from_kind(kind).ok_or_else(|| {
                    AnnosyncError::PlanFormat(format!("unsupported workload kind in key '{}'", key))
                })?;
                (kind, name)
            }
            None => (WorkloadKind::Deployment, key),
        };

        if name.is_empty() || name.contains('/') {
            return Err(AnnosyncError::PlanFormat(format!(
                "invalid workload key '{}'",
                key
            )));
        }

        Ok(Self::new(kind, name))
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A workload as read from the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    pub id: WorkloadId,
    pub namespace: String,
    pub annotations: BTreeMap<String, String>,
    /// ConfigMap names bound through `envFrom`, in declaration order
    pub env_sources: Vec<String>,
}

impl Workload {
    pub fn from_deployment(deployment: &Deployment) -> Self {
        Self {
            id: WorkloadId::deployment(deployment.name_any()),
            namespace: deployment.namespace().unwrap_or_default(),
            annotations: deployment.annotations().clone(),
            env_sources: env_source_bindings(deployment.spec.as_ref().map(|s| &s.template)),
        }
    }

    pub fn from_stateful_set(stateful_set: &StatefulSet) -> Self {
        Self {
            id: WorkloadId::stateful_set(stateful_set.name_any()),
            namespace: stateful_set.namespace().unwrap_or_default(),
            annotations: stateful_set.annotations().clone(),
            env_sources: env_source_bindings(stateful_set.spec.as_ref().map(|s| &s.template)),
        }
    }
}

/// Collect ConfigMap names referenced by `envFrom` in init containers and then containers.
pub fn env_source_bindings(template: Option<&PodTemplateSpec>) -> Vec<String> {
    let Some(pod_spec) = template.and_then(|t| t.spec.as_ref()) else {
        return Vec::new();
    };

    pod_spec
        .init_containers
        .iter()
        .flatten()
        .chain(pod_spec.containers.iter())
        .filter_map(|c| c.env_from.as_ref())
        .flatten()
        .filter_map(|env_from| env_from.config_map_ref.as_ref())
        .map(|r| r.name.clone())
        .collect()
}
