// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Human-readable plan preview and the operator confirmation gate.

use crate::error::Result;
use crate::types::ReconciliationPlan;
use std::fmt::Write;

/// Values longer than this are shortened in the preview
const MAX_VALUE_WIDTH: usize = 60;

/// Render the plan as a change summary. Pure, no side effects.
pub fn preview(plan: &ReconciliationPlan, namespace: &str) -> String {
    let mut out = String::new();

    if plan.is_empty() {
        let _ = writeln!(out, "No missing annotations in namespace {}.", namespace);
        return out;
    }

    let _ = writeln!(
        out,
        "{} annotations to add on {} workloads in namespace {}:",
        plan.annotation_count(),
        plan.len(),
        namespace
    );

    for (id, entry) in plan.iter() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {} (from configmap {})", id, entry.configmap);
        for (key, value) in &entry.missing_annotations {
            let _ = writeln!(out, "    + {} = {}", key, shorten(value));
        }
    }

    out
}

fn shorten(value: &str) -> String {
    let single_line = value.replace('\n', "\\n");
    if single_line.chars().count() <= MAX_VALUE_WIDTH {
        return single_line;
    }
    let head: String = single_line.chars().take(MAX_VALUE_WIDTH).collect();
    format!("{}... ({} chars)", head, value.chars().count())
}

/// Decides whether a previewed plan may be applied
pub trait Confirmation {
    fn confirm(&self, preview: &str) -> Result<bool>;
}

/// Prints the preview and asks on the terminal
pub struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn confirm(&self, preview: &str) -> Result<bool> {
        println!("{}", preview);
        let answer = dialoguer::Confirm::new()
            .with_prompt("Apply these annotations?")
            .default(false)
            .interact()?;
        Ok(answer)
    }
}

/// Prints the preview and proceeds without asking (`--yes`)
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&self, preview: &str) -> Result<bool> {
        println!("{}", preview);
        Ok(true)
    }
}
