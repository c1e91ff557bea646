// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{retry, DEFAULT_PLAN_FILE};
use crate::types::AnnotationKeySet;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for one run, passed explicitly to each component
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace whose workloads and ConfigMaps are reconciled
    pub namespace: String,
    pub plan_file: PathBuf,
    pub annotation_keys: AnnotationKeySet,
    /// kubeconfig context, current context when unset
    pub kube_context: Option<String>,
    pub mutation_retries: u32,
    pub retry_backoff: Duration,
    /// Maximum number of workloads patched at once
    pub concurrency: usize,
}

impl Config {
    pub fn new(namespace: impl Into<String>, annotation_keys: AnnotationKeySet) -> Self {
        Config {
            namespace: namespace.into(),
            plan_file: PathBuf::from(DEFAULT_PLAN_FILE),
            annotation_keys,
            kube_context: None,
            mutation_retries: retry::DEFAULT_MUTATION_RETRIES,
            retry_backoff: Duration::from_millis(retry::DEFAULT_BACKOFF_MS),
            concurrency: 1,
        }
    }

    pub fn with_plan_file(mut self, plan_file: impl Into<PathBuf>) -> Self {
        self.plan_file = plan_file.into();
        self
    }

    pub fn with_kube_context(mut self, context: Option<String>) -> Self {
        self.kube_context = context;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.mutation_retries = retries;
        self.retry_backoff = backoff;
        self
    }
}

#[derive(Debug, Deserialize)]
struct KeysFile {
    keys: Vec<String>,
}

/// Load the annotation key set from explicit keys and an optional YAML file
pub fn load_annotation_keys(keys: &[String], keys_file: Option<&Path>) -> Result<AnnotationKeySet> {
    let mut all: Vec<String> = keys.to_vec();

    if let Some(path) = keys_file {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read annotation keys file {}", path.display()))?;
        let parsed: KeysFile = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse annotation keys file {}", path.display()))?;
        all.extend(parsed.keys);
    }

    let set = AnnotationKeySet::new(&all)?;
    if set.is_empty() {
        bail!("No annotation keys configured, pass --key or --keys-file");
    }
    Ok(set)
}
