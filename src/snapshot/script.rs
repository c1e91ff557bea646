// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::snapshot::scan::{CapturedWorkload, SnapshotScan};
use std::fmt::Write;

/// Render a bash script that re-applies every captured annotation
pub fn render_script(scan: &SnapshotScan) -> String {
    let mut out = String::from("#!/bin/bash\n\n");
    for workload in scan.workloads() {
        out.push_str(&annotate_command(workload));
        out.push('\n');
    }
    out
}

/// `kubectl annotate` command for one workload
pub fn annotate_command(workload: &CapturedWorkload) -> String {
    let mut cmd = format!(
        "kubectl annotate {} {} -n {}",
        workload.kind.resource_name(),
        shell_quote(&workload.name),
        shell_quote(&workload.namespace)
    );
    for (key, value) in &workload.annotations {
        let _ = write!(cmd, " {}", shell_quote(&format!("{}={}", key, value)));
    }
    cmd.push_str(" --overwrite");
    cmd
}

/// Quote for POSIX shells; plain words are left alone
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
