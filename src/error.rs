// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnosyncError {
    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("Failed to query {resource} in namespace {namespace}: {source}")]
    Query {
        resource: &'static str,
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("Source data unavailable: {0}")]
    SourceDataUnavailable(String),

    #[error("Plan file {} not found, run `annosync compute` first", path.display())]
    PlanFileMissing { path: PathBuf },

    #[error("Failed to access plan file {}: {source}", path.display())]
    PlanFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plan file: {0}")]
    PlanFormat(String),

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Invalid workflow transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Write failure for a single workload. Never aborts the rest of an apply run.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rejected with status {code}: {message}")]
    Rejected { code: u16, message: String },

    #[error("transport error: {0}")]
    Transport(kube::Error),
}

impl MutationError {
    /// Server-side 5xx, throttling and transport failures are worth a retry.
    pub fn is_transient(&self) -> bool {
        match self {
            MutationError::Conflict(_) => false,
            MutationError::Rejected { code, .. } => *code >= 500 || *code == 429,
            MutationError::Transport(_) => true,
        }
    }
}

impl From<kube::Error> for MutationError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(err) if err.code == 409 => MutationError::Conflict(err.message),
            kube::Error::Api(err) => MutationError::Rejected {
                code: err.code,
                message: err.message,
            },
            other => MutationError::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnosyncError>;
