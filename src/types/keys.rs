// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{AnnosyncError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// The annotation keys that may be propagated. Anything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationKeySet {
    keys: BTreeSet<String>,
}

impl AnnotationKeySet {
    /// Build a key set, validating that each key looks like an annotation key
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for key in keys {
            let key = key.as_ref().trim();
            if key.is_empty() {
                continue;
            }
            validate_key(key)?;
            set.insert(key.to_string());
        }
        Ok(Self { keys: set })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Keep only entries whose key is in this set
    pub fn filter(&self, data: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        data.iter()
            .filter(|(k, _)| self.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Accepts `name` or `prefix/name`, no whitespace.
fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason: &str| AnnosyncError::Config(format!("annotation key '{}' {}", key, reason));

    if key.chars().any(char::is_whitespace) {
        return Err(invalid("contains whitespace"));
    }

    let name = match key.split_once('/') {
        Some((prefix, name)) => {
            if prefix.is_empty() {
                return Err(invalid("has an empty prefix"));
            }
            name
        }
        None => key,
    };

    if name.is_empty() || name.contains('/') {
        return Err(invalid("must have the form [prefix/]name"));
    }

    Ok(())
}
