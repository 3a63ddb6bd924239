// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::env;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

use hetero_orchestrator::config::{load_and_validate_config, Config, RuntimeBuilder};
use hetero_orchestrator::engine::Orchestrator;
use hetero_orchestrator::traits::WaitStatus;

/// Outcome of one run of the request
#[derive(Debug, Serialize)]
struct IterationReport {
    iteration: u32,
    ok: bool,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    outputs: BTreeMap<String, Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct PartitionSummary {
    id: String,
    device: String,
}

/// Everything `--json` prints
#[derive(Debug, Serialize)]
struct RunReport {
    config: String,
    input: Vec<f32>,
    partitions: Vec<PartitionSummary>,
    iterations: Vec<IterationReport>,
}

fn parse_input(text: &str) -> Result<Vec<f32>> {
    text.split(',')
        .map(|value| {
            value
                .trim()
                .parse::<f32>()
                .with_context(|| format!("'{}' is not a number", value.trim()))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Default log level: INFO. Override with RUST_LOG=hetero_orchestrator=debug etc.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let json = args.iter().any(|arg| arg == "--json");
    let positional: Vec<&String> = args.iter().skip(1).filter(|arg| *arg != "--json").collect();

    if positional.len() != 2 {
        eprintln!("Usage: {} <config.yaml|config.toml> <comma separated input> [--json]", args[0]);
        eprintln!("Example: {} configs/three-device-chain.yaml \"0.0, 1.0, 2.0\"", args[0]);
        eprintln!("Example: {} configs/faulty-accelerator.yaml 1.5 --json", args[0]);
        std::process::exit(1);
    }

    let config_file = positional[0].as_str();
    let input = parse_input(positional[1])?;

    let config = load_and_validate_config(config_file)
        .with_context(|| format!("loading {}", config_file))?;
    let orchestrator = RuntimeBuilder::from_config(&config, Handle::current())
        .context("building the partitioned request")?;

    let report = run_iterations(config_file, &config, &orchestrator, input).await?;
    let failures = report.iterations.iter().filter(|it| !it.ok).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if failures > 0 {
        bail!("{} of {} runs failed", failures, report.iterations.len());
    }
    Ok(())
}

async fn run_iterations(
    config_file: &str,
    config: &Config,
    orchestrator: &Orchestrator,
    input: Vec<f32>,
) -> Result<RunReport> {
    for name in &config.inputs {
        orchestrator.get_blob(name)?.write(input.clone());
    }

    let mut iterations = Vec::new();
    for iteration in 1..=config.iterations() {
        let started = Instant::now();
        orchestrator.start()?;

        let wait_mode = config.wait_mode();
        let outcome = match orchestrator.wait_async(wait_mode.timeout()).await {
            Ok(WaitStatus::Ready) => Ok(()),
            Ok(status) => bail!(
                "run {} did not finish under {:?} ({:?})",
                iteration,
                wait_mode,
                status
            ),
            Err(error) => Err(error),
        };

        let mut outputs = BTreeMap::new();
        if outcome.is_ok() {
            for name in &config.outputs {
                outputs.insert(name.clone(), orchestrator.get_blob(name)?.read());
            }
        }

        iterations.push(IterationReport {
            iteration,
            ok: outcome.is_ok(),
            duration_ms: started.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
            outputs,
        });
    }

    Ok(RunReport {
        config: config_file.to_string(),
        input,
        partitions: orchestrator
            .partitions()
            .subnetworks()
            .iter()
            .map(|sub| PartitionSummary {
                id: sub.id.clone(),
                device: sub.device().to_string(),
            })
            .collect(),
        iterations,
    })
}

fn print_report(report: &RunReport) {
    println!("🚀 Partitioned Request");
    println!("═══════════════════════════════════");
    println!("📋 Configuration: {}", report.config);
    println!("🔢 Input: {:?}", report.input);
    println!("\n🔄 Partition Chain:");
    for (i, partition) in report.partitions.iter().enumerate() {
        println!("  {}. {} → {}", i + 1, partition.id, partition.device);
    }

    println!("\n📊 Runs:");
    for run in &report.iterations {
        match &run.error {
            None => {
                println!("  ✅ Run {} ({} ms)", run.iteration, run.duration_ms);
                for (name, values) in &run.outputs {
                    println!("     {} = {:?}", name, values);
                }
            }
            Some(error) => println!("  ❌ Run {} ({} ms): {}", run.iteration, run.duration_ms, error),
        }
    }
}
