// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace-scoped reads and annotation patches against the cluster.

use crate::constants::FIELD_MANAGER;
use crate::error::{AnnosyncError, MutationError, Result};
use crate::types::{ConfigurationSource, Workload, WorkloadId, WorkloadKind};
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{ListParams, Patch, PatchParams},
    Api, Client, Resource, ResourceExt,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, instrument};

pub struct ClusterAdapter {
    client: Client,
    namespace: String,
}

impl ClusterAdapter {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// List all workloads of one kind in the namespace
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn list_workloads(&self, kind: WorkloadKind) -> Result<Vec<Workload>> {
        let workloads: Vec<Workload> = match kind {
            WorkloadKind::Deployment => self
                .list::<Deployment>("deployments")
                .await?
                .iter()
                .map(Workload::from_deployment)
                .collect(),
            WorkloadKind::StatefulSet => self
                .list::<StatefulSet>("statefulsets")
                .await?
                .iter()
                .map(Workload::from_stateful_set)
                .collect(),
        };

        debug!("Found {} {} workloads", workloads.len(), kind);
        Ok(workloads)
    }

    /// List all ConfigMaps in the namespace
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn list_configuration_sources(&self) -> Result<Vec<ConfigurationSource>> {
        let sources: Vec<ConfigurationSource> = self
            .list::<ConfigMap>("configmaps")
            .await?
            .iter()
            .map(ConfigurationSource::from_config_map)
            .collect();

        debug!("Found {} configmaps", sources.len());
        Ok(sources)
    }

    /// Current annotations of a workload, `None` if it no longer exists
    #[instrument(skip(self), fields(namespace = %self.namespace, workload = %id))]
    pub async fn current_annotations(
        &self,
        id: &WorkloadId,
    ) -> std::result::Result<Option<BTreeMap<String, String>>, MutationError> {
        match id.kind {
            WorkloadKind::Deployment => self.get_annotations::<Deployment>(&id.name).await,
            WorkloadKind::StatefulSet => self.get_annotations::<StatefulSet>(&id.name).await,
        }
    }

    /// Merge-patch the given annotations onto a workload.
    ///
    /// Only the given keys are sent, other annotations are left alone.
    /// Returns `false` when the workload no longer exists.
    #[instrument(skip(self, annotations), fields(namespace = %self.namespace, workload = %id))]
    pub async fn patch_annotations(
        &self,
        id: &WorkloadId,
        annotations: &BTreeMap<String, String>,
    ) -> std::result::Result<bool, MutationError> {
        match id.kind {
            WorkloadKind::Deployment => self.patch::<Deployment>(&id.name, annotations).await,
            WorkloadKind::StatefulSet => self.patch::<StatefulSet>(&id.name, annotations).await,
        }
    }

    fn api<K>(&self) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    async fn list<K>(&self, resource: &'static str) -> Result<Vec<K>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let list = self
            .api::<K>()
            .list(&ListParams::default())
            .await
            .map_err(|source| AnnosyncError::Query {
                resource,
                namespace: self.namespace.clone(),
                source,
            })?;
        Ok(list.items)
    }

    async fn get_annotations<K>(
        &self,
        name: &str,
    ) -> std::result::Result<Option<BTreeMap<String, String>>, MutationError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let object = self.api::<K>().get_opt(name).await?;
        Ok(object.map(|o| o.annotations().clone()))
    }

    async fn patch<K>(
        &self,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> std::result::Result<bool, MutationError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let patch = json!({ "metadata": { "annotations": annotations } });
        let pp = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        match self.api::<K>().patch(name, &pp, &Patch::Merge(&patch)).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(err)) if err.code == 404 => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
