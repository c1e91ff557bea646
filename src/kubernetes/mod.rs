// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation and the namespace-scoped cluster adapter.

pub mod adapter;
pub mod client;

pub use adapter::ClusterAdapter;
pub use client::create_client;
