// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use annosync::config::{load_annotation_keys, Config};
use annosync::constants::{env, retry, DEFAULT_PLAN_FILE, DEFAULT_SCRIPT_FILE};
use annosync::error::AnnosyncError;
use annosync::kubernetes::{create_client, ClusterAdapter};
use annosync::reconcile::{self, preview, ApplyStatus, AssumeYes, Confirmation, TerminalConfirmation};
use annosync::snapshot::{self, load_snapshot, render_script};
use annosync::types::AnnotationKeySet;
use annosync::ui;

/// Fill missing workload annotations from the ConfigMaps they bind.
#[derive(Parser)]
#[command(name = "annosync", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute missing annotations and save them to the plan file
    Compute {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        keys: KeyArgs,
    },

    /// Preview, confirm and apply a saved plan
    Apply {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        options: ApplyArgs,
    },

    /// Capture annotations from a snapshot into a kubectl script
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct TargetArgs {
    /// Namespace to reconcile
    #[arg(short, long, env = env::NAMESPACE)]
    namespace: String,

    /// Plan file shared by compute and apply
    #[arg(long, env = env::PLAN_FILE, default_value = DEFAULT_PLAN_FILE)]
    plan_file: PathBuf,

    /// kubeconfig context to use
    #[arg(long)]
    context: Option<String>,
}

#[derive(Args)]
struct KeyArgs {
    /// Annotation key that may be propagated, repeatable or comma-separated
    #[arg(long = "key", env = env::KEYS, value_delimiter = ',')]
    keys: Vec<String>,

    /// YAML file with a `keys` list
    #[arg(long, env = env::KEYS_FILE)]
    keys_file: Option<PathBuf>,
}

#[derive(Args)]
struct ApplyArgs {
    /// Apply without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Only print the preview
    #[arg(long)]
    dry_run: bool,

    /// Number of workloads patched at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Retries for transient patch failures
    #[arg(long, default_value_t = retry::DEFAULT_MUTATION_RETRIES)]
    retries: u32,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Snapshot JSON, e.g. from `kubectl get deploy,sts -A -o json`
    #[arg(short, long)]
    input: PathBuf,

    /// Script to write
    #[arg(short, long, default_value = DEFAULT_SCRIPT_FILE)]
    output: PathBuf,

    #[command(flatten)]
    keys: KeyArgs,

    /// Warn when fewer Deployments are found
    #[arg(long)]
    expect_deployments: Option<usize>,

    /// Warn when fewer StatefulSets are found
    #[arg(long)]
    expect_statefulsets: Option<usize>,
}

impl TargetArgs {
    fn into_config(self, keys: AnnotationKeySet) -> Config {
        Config::new(self.namespace, keys)
            .with_plan_file(self.plan_file)
            .with_kube_context(self.context)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("annosync=debug")
        } else {
            EnvFilter::new("annosync=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Compute { target, keys } => run_compute(target, keys).await,
        Commands::Apply { target, options } => run_apply(target, options).await,
        Commands::Snapshot(args) => run_snapshot(args, cli.verbose),
    };

    if let Err(e) = result {
        ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run_compute(target: TargetArgs, keys: KeyArgs) -> Result<()> {
    let keys = load_annotation_keys(&keys.keys, keys.keys_file.as_deref())?;
    let config = target.into_config(keys);
    info!(
        "Computing missing annotations in namespace {} for {} keys",
        config.namespace,
        config.annotation_keys.len()
    );

    let client = create_client(&config).await?;
    let adapter = ClusterAdapter::new(client, config.namespace.clone());
    let plan = reconcile::compute(&adapter, &config).await?;

    if plan.is_empty() {
        ui::print_success("No missing annotations detected. Nothing to apply.");
    } else {
        println!("{}", preview(&plan, &config.namespace));
        ui::print_success(&format!(
            "Plan saved to {}, run `annosync apply` to apply it",
            config.plan_file.display()
        ));
    }
    Ok(())
}

async fn run_apply(target: TargetArgs, options: ApplyArgs) -> Result<()> {
    let config = target
        .into_config(AnnotationKeySet::default())
        .with_concurrency(options.concurrency)
        .with_retries(
            options.retries,
            Duration::from_millis(retry::DEFAULT_BACKOFF_MS),
        );

    // Report a missing plan before touching the cluster.
    if !config.plan_file.exists() {
        return Err(AnnosyncError::PlanFileMissing {
            path: config.plan_file.clone(),
        }
        .into());
    }

    let client = create_client(&config).await?;
    let adapter = ClusterAdapter::new(client, config.namespace.clone());
    let confirmation: Box<dyn Confirmation> = if options.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirmation)
    };

    match reconcile::apply(&adapter, &config, confirmation.as_ref(), options.dry_run).await? {
        ApplyStatus::NoChanges => ui::print_success("Plan is empty, nothing to apply"),
        ApplyStatus::DryRun(summary) => {
            println!("{}", summary);
            ui::print_warning("Dry run, no changes made");
        }
        ApplyStatus::Declined => ui::print_warning(&format!(
            "Cancelled, plan kept in {}",
            config.plan_file.display()
        )),
        ApplyStatus::Applied(report) => ui::print_apply_report(&report),
    }
    Ok(())
}

fn run_snapshot(args: SnapshotArgs, verbose: bool) -> Result<()> {
    let keys = load_annotation_keys(&args.keys.keys, args.keys.keys_file.as_deref())?;
    let document = load_snapshot(&args.input)?;
    let scan = snapshot::scan(&document, &keys);

    ui::print_snapshot_report(&scan, verbose);
    for warning in scan.shortfalls(args.expect_deployments, args.expect_statefulsets) {
        ui::print_warning(&warning);
    }
    if scan.captured.is_empty() {
        ui::print_warning("No matching annotations found");
    }

    fs::write(&args.output, render_script(&scan))
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    ui::print_success(&format!(
        "Generated kubectl annotation script: {}",
        args.output.display()
    ));
    Ok(())
}
