// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation

use crate::config::Config;
use crate::error::{AnnosyncError, Result};
use kube::{config::KubeConfigOptions, Client, Config as KConfig};
use tracing::{debug, info};

/// Create a client for the configured kubeconfig context, or the inferred default
pub async fn create_client(config: &Config) -> Result<Client> {
    let client_config = match &config.kube_context {
        Some(context) => {
            debug!("Using kubeconfig context '{}'", context);
            let options = KubeConfigOptions {
                context: Some(context.clone()),
                ..Default::default()
            };
            KConfig::from_kubeconfig(&options).await.map_err(|e| {
                AnnosyncError::Kubeconfig(format!(
                    "Failed to load kubeconfig context {}: {}",
                    context, e
                ))
            })?
        }
        None => KConfig::infer()
            .await
            .map_err(|e| AnnosyncError::Kubeconfig(format!("Failed to infer config: {}", e)))?,
    };

    info!("Connecting to {}", client_config.cluster_url);

    Client::try_from(client_config)
        .map_err(|e| AnnosyncError::Kubeconfig(format!("Failed to create client: {}", e)))
}
