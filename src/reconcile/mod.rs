// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Annotation reconciliation: resolve, diff, preview, confirm and patch.

pub mod diff;
pub mod mutator;
pub mod planner;
pub mod resolver;
pub mod workflow;

pub use diff::diff;
pub use mutator::{ApplyReport, MutationOutcome, Mutator};
pub use planner::{preview, AssumeYes, Confirmation, TerminalConfirmation};
pub use resolver::{resolve, ResolvedSource};
pub use workflow::{apply, compute, ApplyStatus, Run, Stage};
