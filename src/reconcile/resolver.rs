// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Matches workload `envFrom` bindings to ConfigMaps carrying recognized annotation keys.

use crate::types::{AnnotationKeySet, ConfigurationSource, Workload, WorkloadId};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Desired annotations for one workload and the ConfigMap they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub source_name: String,
    pub annotations: BTreeMap<String, String>,
}

/// Resolve each workload's bindings against the available sources.
///
/// Bindings are visited in declaration order and a later binding with
/// recognized keys replaces the whole earlier record for that workload.
/// Bindings to ConfigMaps that are not in `sources` are skipped.
pub fn resolve(
    workloads: &[Workload],
    sources: &[ConfigurationSource],
    keys: &AnnotationKeySet,
) -> BTreeMap<WorkloadId, ResolvedSource> {
    let by_name: HashMap<&str, &ConfigurationSource> =
        sources.iter().map(|s| (s.name.as_str(), s)).collect();
    let mut resolved = BTreeMap::new();

    for workload in workloads {
        for binding in &workload.env_sources {
            let Some(source) = by_name.get(binding.as_str()) else {
                debug!(
                    "{} binds configmap {} which was not found, skipping",
                    workload.id, binding
                );
                continue;
            };

            let annotations = keys.filter(&source.data);
            if annotations.is_empty() {
                continue;
            }

            let record = ResolvedSource {
                source_name: source.name.clone(),
                annotations,
            };
            if let Some(previous) = resolved.insert(workload.id.clone(), record) {
                warn!(
                    "{} binds several configmaps with annotation keys, {} replaces {}",
                    workload.id, source.name, previous.source_name
                );
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(name: &str, bindings: &[&str]) -> Workload {
        Workload {
            id: WorkloadId::deployment(name),
            namespace: "ns1".to_string(),
            annotations: BTreeMap::new(),
            env_sources: bindings.iter().map(|b| b.to_string()).collect(),
        }
    }

    fn source(name: &str, data: &[(&str, &str)]) -> ConfigurationSource {
        ConfigurationSource {
            name: name.to_string(),
            namespace: "ns1".to_string(),
            data: data
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn keys() -> AnnotationKeySet {
        AnnotationKeySet::new(["team.io/owner", "team.io/tier", "team.io/unused"]).unwrap()
    }

    #[test]
    fn test_resolve_intersects_with_key_set() {
        let workloads = vec![workload("svc-a", &["cfg-a"])];
        let sources = vec![source(
            "cfg-a",
            &[
                ("team.io/owner", "payments"),
                ("team.io/tier", "gold"),
                ("LOG_LEVEL", "debug"),
            ],
        )];

        let resolved = resolve(&workloads, &sources, &keys());

        let entry = resolved.get(&WorkloadId::deployment("svc-a")).unwrap();
        assert_eq!(entry.source_name, "cfg-a");
        assert_eq!(entry.annotations.len(), 2);
        assert!(!entry.annotations.contains_key("LOG_LEVEL"));
    }

    #[test]
    fn test_resolve_skips_unbound_workloads() {
        let workloads = vec![workload("lonely", &[])];
        let sources = vec![source("cfg-a", &[("team.io/tier", "gold")])];

        assert!(resolve(&workloads, &sources, &keys()).is_empty());
    }

    #[test]
    fn test_resolve_skips_missing_source() {
        let workloads = vec![workload("svc-a", &["cfg-missing"])];
        let sources = vec![source("cfg-a", &[("team.io/tier", "gold")])];

        assert!(resolve(&workloads, &sources, &keys()).is_empty());
    }

    #[test]
    fn test_resolve_skips_source_without_recognized_keys() {
        let workloads = vec![workload("svc-a", &["cfg-env"])];
        let sources = vec![source("cfg-env", &[("LOG_LEVEL", "debug")])];

        assert!(resolve(&workloads, &sources, &keys()).is_empty());
    }

    #[test]
    fn test_resolve_last_binding_wins() {
        let workloads = vec![workload("svc-a", &["cfg-first", "cfg-env", "cfg-second"])];
        let sources = vec![
            source(
                "cfg-first",
                &[("team.io/owner", "first"), ("team.io/tier", "bronze")],
            ),
            source("cfg-env", &[("LOG_LEVEL", "debug")]),
            source("cfg-second", &[("team.io/owner", "second")]),
        ];

        let resolved = resolve(&workloads, &sources, &keys());

        let entry = resolved.get(&WorkloadId::deployment("svc-a")).unwrap();
        assert_eq!(entry.source_name, "cfg-second");
        assert_eq!(
            entry.annotations,
            BTreeMap::from([("team.io/owner".to_string(), "second".to_string())])
        );
    }
}
