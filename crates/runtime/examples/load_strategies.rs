// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: load the same model through each runtime buffer strategy.
//!
//! Shows how the buffer is chosen (caller buffer, embedded hint, sizing
//! search), how large it ends up, and that the heap is balanced after
//! every unload.
//!
//! ```bash
//! cargo run -p runtime --example load_strategies
//! ```

use interpreter::OpResolver;
use memory_manager::MemoryBudget;
use model_format::{BuiltinOp, ModelBuilder, ModelParameters};
use runtime::{format_units, BufferRequest, Collaborators, Model, Platform};
use tensor_core::{DType, Shape};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let plain = build_blob(96, None)?;
    let hinted = build_blob(96, Some(16 * 1024))?;
    let resolver = OpResolver::with_builtins();
    let mut caller_buffer = vec![0u8; 32 * 1024];

    println!(
        "{:<10} {:>20} {:>10} {:>8} {:>12}",
        "Request", "Source", "Buffer", "Probes", "Heap after"
    );
    println!("{}", "-".repeat(64));

    let runs: [(&str, &[u8], BufferRequest<'_>); 4] = [
        ("auto", plain.as_slice(), BufferRequest::Auto),
        ("auto+hint", hinted.as_slice(), BufferRequest::Auto),
        ("search", hinted.as_slice(), BufferRequest::Search),
        ("caller", plain.as_slice(), BufferRequest::Caller(&mut caller_buffer)),
    ];

    for (label, blob, request) in runs {
        let platform = Platform::with_heap(MemoryBudget::from_kb(128));
        let heap = platform.create_heap();
        let mut model = Model::new(platform, heap, Collaborators::default());
        model.load(blob, &resolver, request)?;
        model.input_mut(0)?.copy_from_f32(&[1.0; 96])?;
        model.invoke()?;

        let source = model
            .buffer_source()
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        let buffer = model.runtime_buffer_len().unwrap_or_default();
        let probes = model.sizing().map_or(0, |s| s.probes.len());
        model.unload();

        println!(
            "{:<10} {:>20} {:>10} {:>8} {:>12}",
            label,
            source,
            format_units(buffer),
            probes,
            model.heap().allocated_bytes(),
        );
    }

    Ok(())
}

fn build_blob(features: usize, hint: Option<u32>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor("x", Shape::matrix(1, features), DType::F32);
    let w = b.add_constant_f32(
        "w",
        Shape::matrix(features, features),
        &vec![0.1; features * features],
    );
    let h = b.add_tensor("h", Shape::matrix(1, features), DType::F32);
    let y = b.add_tensor("y", Shape::matrix(1, features), DType::F32);
    b.add_operator(BuiltinOp::FullyConnected, &[x, w], &[h]);
    b.add_operator(BuiltinOp::Softmax, &[h], &[y]);
    b.set_io(&[x], &[y]);

    let mut params = ModelParameters::new();
    params.insert("name", "load-strategies");
    if let Some(hint) = hint {
        params.insert("runtime_memory_size", hint);
    }
    b.set_parameters(&params)?;
    Ok(b.to_bytes()?)
}
