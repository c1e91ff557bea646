// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Capture annotations from a cluster snapshot and emit a re-apply script.

pub mod scan;
pub mod script;

pub use scan::{load_snapshot, resolve_kind, scan, CapturedWorkload, SnapshotObject, SnapshotScan};
pub use script::{annotate_command, render_script};
