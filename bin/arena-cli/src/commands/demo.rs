// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `arena-rt demo` command: write a small fully-connected model.
//!
//! The model is `x -> fully_connected -> relu -> softmax -> y`. Unless
//! disabled, its parameter block carries a `runtime_memory_size` hint
//! measured by running the sizing search for a 32-bit target.

use anyhow::Context;
use interpreter::{InterpreterOptions, OpResolver, PointerWidth};
use memory_manager::{MemoryBudget, MemoryPool};
use model_format::{BuiltinOp, FlatModel, ModelBuilder, ModelParameters};
use runtime::{format_units, BufferSizer, RUNTIME_MEMORY_SIZE_KEY};
use std::path::PathBuf;
use std::sync::Arc;
use tensor_core::{DType, Shape};

/// Heap the hint is measured against. Large enough for any demo size.
const MEASURE_HEAP_MB: usize = 4;

pub fn execute(output: PathBuf, features: usize, embed_hint: bool) -> anyhow::Result<()> {
    super::banner("Demo Model Writer");
    anyhow::ensure!(features > 0, "--features must be at least 1");

    let hint = if embed_hint {
        let size = measure(features)?;
        println!("  Measured runtime memory: {} ({size} bytes)", format_units(size));
        Some(u32::try_from(size).context("measured size does not fit a u32 hint")?)
    } else {
        None
    };

    let bytes = build(features, hint)?;
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    println!("  Wrote:    {}", output.display());
    println!("  Size:     {}", format_units(bytes.len()));
    println!("  Features: {features}");
    match hint {
        Some(hint) => println!("  Hint:     {RUNTIME_MEMORY_SIZE_KEY} = {hint}"),
        None => println!("  Hint:     none (load will search)"),
    }
    println!();
    Ok(())
}

/// Runs the sizing search on the hint-less model for a 32-bit target.
fn measure(features: usize) -> anyhow::Result<usize> {
    let blob = build(features, None)?;
    let model = Arc::new(FlatModel::parse(&blob)?);
    let resolver = OpResolver::with_builtins();
    let heap = MemoryPool::new(MemoryBudget::from_mb(MEASURE_HEAP_MB));
    let options = InterpreterOptions {
        pointer_width: PointerWidth::W32,
        ..Default::default()
    };
    let result = BufferSizer::new(&heap, 0, options).search(&model, &resolver)?;
    tracing::info!("{}", result.summary());
    Ok(result.size)
}

/// Builds the demo blob, optionally carrying a size hint.
pub(crate) fn build(features: usize, hint: Option<u32>) -> anyhow::Result<Vec<u8>> {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor("input", Shape::matrix(1, features), DType::F32);
    let weights: Vec<f32> = (0..features * features)
        .map(|i| if i % (features + 1) == 0 { 1.0 } else { 0.0 })
        .collect();
    let w = b.add_constant_f32("dense/weights", Shape::matrix(features, features), &weights);
    let bias = b.add_constant_f32("dense/bias", Shape::vector(features), &vec![0.0; features]);
    let h1 = b.add_tensor("dense", Shape::matrix(1, features), DType::F32);
    let h2 = b.add_tensor("relu", Shape::matrix(1, features), DType::F32);
    let y = b.add_tensor("probabilities", Shape::matrix(1, features), DType::F32);
    b.add_operator(BuiltinOp::FullyConnected, &[x, w, bias], &[h1]);
    b.add_operator(BuiltinOp::Relu, &[h1], &[h2]);
    b.add_operator(BuiltinOp::Softmax, &[h2], &[y]);
    b.set_io(&[x], &[y]);
    b.set_description("identity dense layer followed by relu and softmax");

    let mut params = ModelParameters::new();
    params.insert("name", "arena-demo");
    params.insert("version", 1i64);
    params.insert("description", "demo model written by arena-rt");
    let classes: Vec<String> = (0..features).map(|i| format!("class_{i}")).collect();
    params.insert("classes", classes);
    if let Some(hint) = hint {
        params.insert(RUNTIME_MEMORY_SIZE_KEY, hint);
    }
    b.set_parameters(&params)?;
    Ok(b.to_bytes()?)
}
