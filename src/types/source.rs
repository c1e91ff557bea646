// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// A named key/value store a workload can bind, backed by a ConfigMap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSource {
    pub name: String,
    pub namespace: String,
    pub data: BTreeMap<String, String>,
}

impl ConfigurationSource {
    pub fn from_config_map(config_map: &ConfigMap) -> Self {
        Self {
            name: config_map.name_any(),
            namespace: config_map.namespace().unwrap_or_default(),
            data: config_map.data.clone().unwrap_or_default(),
        }
    }
}
