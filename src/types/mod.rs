// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Domain types shared by the query, reconcile and snapshot layers.

pub mod keys;
pub mod plan;
pub mod source;
pub mod workload;

pub use keys::AnnotationKeySet;
pub use plan::{PlanEntry, ReconciliationPlan};
pub use source::ConfigurationSource;
pub use workload::{Workload, WorkloadId, WorkloadKind};
