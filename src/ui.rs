// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Console output for operators.

use crate::reconcile::ApplyReport;
use crate::snapshot::SnapshotScan;
use colored::Colorize;

pub fn print_section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
    println!("{}", "─".repeat(title.chars().count()).bright_black());
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// End-of-run summary listing every failed workload
pub fn print_apply_report(report: &ApplyReport) {
    print_section("Apply summary");
    println!(
        "  {} patched, {} skipped (no longer exist), {} already annotated, {} failed",
        report.patched.len().to_string().green(),
        report.skipped.len().to_string().yellow(),
        report.unchanged.len(),
        report.failed.len().to_string().red()
    );
    for id in &report.skipped {
        println!("  {} {}", "skipped".yellow(), id);
    }
    for id in &report.unchanged {
        println!("  {} {}", "unchanged".dimmed(), id);
    }
    for (id, reason) in &report.failed {
        println!("  {} {}: {}", "failed".red(), id, reason);
    }

    if report.has_failures() {
        print_warning("Some workloads could not be annotated, see the log for details");
    } else {
        print_success("Annotation restoration complete");
    }
}

/// Counts found in a snapshot plus each captured workload
pub fn print_snapshot_report(scan: &SnapshotScan, verbose: bool) {
    print_section("Snapshot summary");
    println!("  Deployments:  {}", scan.deployments);
    println!("  StatefulSets: {}", scan.stateful_sets);
    println!("  Workloads to annotate: {}", scan.captured.len());

    if verbose {
        for workload in scan.workloads() {
            println!(
                "  {} {}/{}",
                workload.kind.resource_name().cyan(),
                workload.namespace,
                workload.name
            );
            for (key, value) in &workload.annotations {
                println!("    - {}: {}", key, value);
            }
        }
    }
}
