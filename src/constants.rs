// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Field manager name sent with merge patches
pub const FIELD_MANAGER: &str = "annosync";

/// Plan file written by `compute` and consumed by `apply`
pub const DEFAULT_PLAN_FILE: &str = "annotations.json";

/// Script written by `snapshot`
pub const DEFAULT_SCRIPT_FILE: &str = "kubectl_annotations.sh";

/// Namespace assumed for snapshot objects without one
pub const DEFAULT_SNAPSHOT_NAMESPACE: &str = "default";

/// Environment variables the CLI reads through clap `env` arguments
pub mod env {
    pub const NAMESPACE: &str = "ANNOSYNC_NAMESPACE";
    pub const PLAN_FILE: &str = "ANNOSYNC_PLAN_FILE";
    /// Comma-separated annotation keys
    pub const KEYS: &str = "ANNOSYNC_KEYS";
    /// YAML file with a `keys` list
    pub const KEYS_FILE: &str = "ANNOSYNC_KEYS_FILE";
}

/// Retry configuration for transient patch failures
pub mod retry {
    /// Retries after the first attempt
    pub const DEFAULT_MUTATION_RETRIES: u32 = 1;
    /// Initial backoff in milliseconds, doubled on each retry
    pub const DEFAULT_BACKOFF_MS: u64 = 500;
    /// Backoff cap in milliseconds
    pub const MAX_BACKOFF_MS: u64 = 5_000;
}
