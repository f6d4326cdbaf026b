// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `arena-rt inspect` command: display model structure and metadata.
//!
//! Maps the model file and prints the tensor table, the operator list, the
//! parameter block and every metadata tag. Nothing is allocated from a
//! platform heap.

use anyhow::Context;
use model_format::{FlatModel, MappedModel, ModelParameters};
use runtime::{format_units, overhead, HINT_FLOOR, RUNTIME_MEMORY_SIZE_KEY};
use std::path::PathBuf;

pub fn execute(model: PathBuf) -> anyhow::Result<()> {
    super::banner("Model Inspector");

    let mapped = MappedModel::open(&model)
        .with_context(|| format!("failed to open model '{}'", model.display()))?;
    let flat = FlatModel::parse(&mapped).context("failed to parse model")?;
    let graph = flat.subgraph();

    // ── Summary ────────────────────────────────────────────────
    println!("  File:        {}", mapped.path().display());
    println!("  Size:        {}", format_units(mapped.len()));
    if !flat.description().is_empty() {
        println!("  Description: {}", flat.description());
    }
    println!("  Tensors:     {}", graph.tensors.len());
    println!("  Operators:   {}", graph.operators.len());
    println!();

    // ── Tensors ────────────────────────────────────────────────
    println!(
        "  {:<4} {:<24} {:<12} {:<10} {:>10} {:<6}",
        "Idx", "Name", "Shape", "DType", "Bytes", "Kind",
    );
    println!("  {}", "-".repeat(72));
    for (index, tensor) in graph.tensors.iter().enumerate() {
        let kind = if graph.inputs.contains(&index) {
            "input"
        } else if graph.outputs.contains(&index) {
            "output"
        } else if tensor.is_constant() {
            "const"
        } else {
            ""
        };
        println!(
            "  {:<4} {:<24} {:<12} {:<10} {:>10} {:<6}",
            index,
            truncate(&tensor.name, 24),
            tensor.shape.to_string(),
            tensor.dtype.to_string(),
            tensor.size_bytes(),
            kind,
        );
    }
    println!();

    // ── Operators ──────────────────────────────────────────────
    println!("  {:<4} {:<20} {:<16} {:<16}", "Idx", "Op", "Inputs", "Outputs");
    println!("  {}", "-".repeat(58));
    for (index, op) in graph.operators.iter().enumerate() {
        let name = flat
            .header()
            .op_of(op)
            .map_or_else(|| "?".to_string(), |o| o.to_string());
        println!(
            "  {:<4} {:<20} {:<16} {:<16}",
            index,
            name,
            format!("{:?}", op.inputs),
            format!("{:?}", op.outputs),
        );
    }
    println!();

    // ── Parameters ─────────────────────────────────────────────
    match ModelParameters::from_model(&flat) {
        Ok(params) => print_parameters(&params),
        Err(e) => println!("  Parameters: {e}"),
    }
    println!();

    // ── Metadata ───────────────────────────────────────────────
    println!("  Metadata tags:");
    for tag in flat.metadata_tags() {
        let len = flat.find_metadata(tag).map_or(0, <[u8]>::len);
        println!("   {tag:<24} {len:>8} bytes");
    }
    println!(
        "  Extra accelerator pointers (MVP): {}",
        overhead::extra_pointers(&flat, Some(runtime::accelerator::MVP_ACCELERATOR)),
    );
    println!();
    Ok(())
}

fn print_parameters(params: &ModelParameters) {
    println!("  Parameters ({}):", params.len());
    for (key, value) in params.iter() {
        println!("   {key:<24} {}", truncate(&value.to_string(), 48));
    }
    match params.get_u32(RUNTIME_MEMORY_SIZE_KEY) {
        Some(hint) if hint > HINT_FLOOR => {
            println!("  Size hint:   {} (load uses it first)", format_units(hint as usize));
        }
        Some(hint) => println!("  Size hint:   {hint} bytes (at or below floor, ignored)"),
        None => println!("  Size hint:   none (load will search)"),
    }
}

/// Truncates a string to `max_len` characters with an ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
