// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `arena-rt size` command: run only the runtime buffer sizing search.

use anyhow::Context;
use interpreter::{InterpreterOptions, OpResolver};
use model_format::{FlatModel, MappedModel};
use runtime::{format_units, BufferSizer, ProbeOutcome, RuntimeConfig};
use std::path::PathBuf;
use std::sync::Arc;

pub fn execute(model: PathBuf, config: RuntimeConfig, json: bool) -> anyhow::Result<()> {
    let platform = config.resolve()?;
    let heap = platform.create_heap();

    let mapped = MappedModel::open(&model)
        .with_context(|| format!("failed to open model '{}'", model.display()))?;
    let flat = Arc::new(FlatModel::parse(&mapped).context("failed to parse model")?);
    let resolver = OpResolver::with_builtins();
    let options = InterpreterOptions {
        pointer_width: platform.host_width,
        ..Default::default()
    };

    let result = BufferSizer::new(&heap, platform.heap_safety_margin, options)
        .search(&flat, &resolver)
        .context("sizing search failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    super::banner("Buffer Sizing");
    println!("  Model:   {}", model.display());
    println!("  Heap:    {}", platform.heap_budget);
    super::print_host_memory(&config);
    println!("  Ceiling: {} bytes", result.ceiling);
    println!();

    println!("  {:<4} {:>12} {:<16}", "#", "Probe", "Outcome");
    println!("  {}", "-".repeat(34));
    for (i, probe) in result.probes.iter().enumerate() {
        let outcome = match probe.outcome {
            ProbeOutcome::Fits => "fits",
            ProbeOutcome::TooSmall => "too small",
            ProbeOutcome::AllocationFailed => "heap refused",
        };
        println!("  {:<4} {:>12} {:<16}", i + 1, probe.size, outcome);
    }
    println!();

    println!("  {}", result.summary());
    let pad = platform.search_pad();
    if pad > 0 {
        println!(
            "  Host pointers are wider than the target's: load pads to {} ({} bytes)",
            format_units(result.size + pad),
            result.size + pad,
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("m.amdl");
        std::fs::write(&path, super::super::demo::build(16, None).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_size_reports() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            heap_size: Some("64K".into()),
            ..Default::default()
        };
        execute(demo_file(&dir), config.clone(), false).unwrap();
        execute(demo_file(&dir), config, true).unwrap();
    }

    #[test]
    fn test_size_fails_on_tiny_heap() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            heap_size: Some("9K".into()),
            ..Default::default()
        };
        assert!(execute(demo_file(&dir), config, false).is_err());
    }
}
