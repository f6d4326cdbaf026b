// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `arena-rt run` command: load a model and invoke it.
//!
//! ```text
//! Model::new → load(blob, resolver, request) → invoke() × N → unload()
//! ```
//!
//! Inputs are zero-filled. After the last invocation the command prints the
//! model summary, the buffer strategy that was used, the top outputs and the
//! operator profile.

use anyhow::Context;
use interpreter::OpResolver;
use memory_manager::MemoryBudget;
use model_format::MappedModel;
use runtime::{format_units, BufferRequest, Collaborators, Model, RuntimeConfig, RuntimeError};
use std::path::PathBuf;
use tensor_core::DType;

/// How many of the largest output values to print.
const TOP_OUTPUTS: usize = 3;

pub fn execute(
    model: PathBuf,
    config: RuntimeConfig,
    search: bool,
    buffer: Option<String>,
    iterations: usize,
) -> anyhow::Result<()> {
    super::banner("Model Runner");

    let platform = config.resolve()?;
    let heap = platform.create_heap();
    println!("  Config:");
    println!("   Model:   {}", model.display());
    println!("   Heap:    {}", platform.heap_budget);
    super::print_host_memory(&config);
    println!(
        "   Pointer: host {}-bit, target {}-bit",
        platform.host_width.bits(),
        platform.target_width.bits(),
    );
    println!();

    let mapped = MappedModel::open(&model)
        .with_context(|| format!("failed to open model '{}'", model.display()))?;
    let resolver = OpResolver::with_builtins();
    let mut caller_buffer = match &buffer {
        Some(size) => {
            let bytes = MemoryBudget::parse(size)
                .with_context(|| format!("invalid --buffer '{size}'"))?
                .as_bytes();
            vec![0u8; bytes]
        }
        None => Vec::new(),
    };
    let request = if buffer.is_some() {
        BufferRequest::Caller(&mut caller_buffer)
    } else if search {
        BufferRequest::Search
    } else {
        BufferRequest::Auto
    };

    let mut m = Model::new(platform, heap, Collaborators::default());
    enable_diagnostics(&mut m)?;

    println!("  [1/3] Loading model...");
    m.load(&mapped, &resolver, request).context("load failed")?;
    if let Some(source) = m.buffer_source() {
        println!(
            "        Runtime buffer: {} from {source}",
            format_units(m.runtime_buffer_len().unwrap_or_default()),
        );
    }
    if let Some(sizing) = m.sizing() {
        println!("        {}", sizing.summary());
    }
    println!();

    println!("  [2/3] Invoking {iterations} time(s) on zeroed inputs...");
    for i in 0..m.input_size()? {
        m.input_mut(i)?.fill_zero();
    }
    for _ in 0..iterations {
        m.invoke().context("invoke failed")?;
    }
    println!();

    println!("  [3/3] Results:");
    for line in m.summary()?.lines() {
        println!("   {line}");
    }
    println!();
    print_top_outputs(&m)?;
    if m.profiler_is_enabled() {
        println!("  {}", m.profiler().summary());
        println!();
    }

    m.unload();
    let stats = m.heap().stats();
    println!("  Heap: {}", stats.summary());
    println!();
    Ok(())
}

/// Turns on the profiler where the platform allows it.
fn enable_diagnostics(m: &mut Model<'_>) -> Result<(), RuntimeError> {
    match m.enable_profiler() {
        Ok(()) | Err(RuntimeError::FeatureUnavailable(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

fn print_top_outputs(m: &Model<'_>) -> anyhow::Result<()> {
    let classes = &m.details().classes;
    for index in 0..m.output_size()? {
        let output = m.output(index)?;
        println!("  Output {index}: {output}");
        if output.dtype() != DType::F32 {
            continue;
        }
        let mut ranked: Vec<(usize, f32)> = output.to_f32_vec()?.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (position, value) in ranked.into_iter().take(TOP_OUTPUTS) {
            let label = classes
                .get(position)
                .map_or_else(|| format!("#{position}"), Clone::clone);
            println!("   {label:<16} {value:.4}");
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_file(dir: &tempfile::TempDir, hint: Option<u32>) -> PathBuf {
        let path = dir.path().join("m.amdl");
        std::fs::write(&path, super::super::demo::build(16, hint).unwrap()).unwrap();
        path
    }

    fn config(heap: &str) -> RuntimeConfig {
        RuntimeConfig {
            heap_size: Some(heap.into()),
            host_pointer_width: Some(32),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_each_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let path = demo_file(&dir, Some(8 * 1024));
        execute(path.clone(), config("64K"), false, None, 2).unwrap();
        execute(path.clone(), config("64K"), true, None, 1).unwrap();
        execute(path, config("64K"), false, Some("16K".into()), 1).unwrap();
    }

    #[test]
    fn test_run_caller_buffer_too_small() {
        let dir = tempfile::tempdir().unwrap();
        let path = demo_file(&dir, None);
        assert!(execute(path, config("64K"), false, Some("128".into()), 1).is_err());
    }

    #[test]
    fn test_run_bad_buffer_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = demo_file(&dir, None);
        assert!(execute(path, config("64K"), false, Some("lots".into()), 1).is_err());
    }
}
