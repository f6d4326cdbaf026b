// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: the model lifecycle end to end.
//!
//! These tests build real model blobs, load them through every buffer
//! strategy against a bounded heap, run inference and check that the heap
//! is balanced after every unload.

use interpreter::{
    Interpreter, InterpreterError, InterpreterOptions, OpResolver, OverheadCounts, PointerWidth,
};
use memory_manager::MemoryBudget;
use model_format::{BuiltinOp, FlatModel, ModelBuilder, ModelParameters, PARAMETERS_TAG};
use runtime::{
    overhead, sizing, Accelerator, BufferRequest, BufferSource, Collaborators, Model, Platform,
    RuntimeError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tensor_core::{DType, Shape};

// ── Helpers ────────────────────────────────────────────────────

const FEATURES: usize = 64;

/// x[1,64] -> fully_connected(w, b) -> relu -> softmax -> y[1,64]
fn demo_blob(hint: Option<u32>) -> Vec<u8> {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor("x", Shape::matrix(1, FEATURES), DType::F32);
    let weights: Vec<f32> = (0..FEATURES * FEATURES)
        .map(|i| if i % (FEATURES + 1) == 0 { 1.0 } else { 0.0 })
        .collect();
    let w = b.add_constant_f32("w", Shape::matrix(FEATURES, FEATURES), &weights);
    let bias = b.add_constant_f32("b", Shape::vector(FEATURES), &[0.5; FEATURES]);
    let h1 = b.add_tensor("h1", Shape::matrix(1, FEATURES), DType::F32);
    let h2 = b.add_tensor("h2", Shape::matrix(1, FEATURES), DType::F32);
    let y = b.add_tensor("y", Shape::matrix(1, FEATURES), DType::F32);
    b.add_operator(BuiltinOp::FullyConnected, &[x, w, bias], &[h1]);
    b.add_operator(BuiltinOp::Relu, &[h1], &[h2]);
    b.add_operator(BuiltinOp::Softmax, &[h2], &[y]);
    b.set_io(&[x], &[y]);
    b.set_description("identity projection followed by softmax");

    let mut params = ModelParameters::new();
    params.insert("name", "demo");
    params.insert("version", 2i64);
    params.insert("date", "2025-06-01");
    params.insert("hash", "cafef00d");
    params.insert("classes", &["left", "right"][..]);
    if let Some(hint) = hint {
        params.insert("runtime_memory_size", hint);
    }
    b.set_parameters(&params).unwrap();
    b.to_bytes().unwrap()
}

/// A model whose arena requirement is large relative to its blob.
fn wide_relu_blob(len: usize) -> Vec<u8> {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor("x", Shape::vector(len), DType::F32);
    let y = b.add_tensor("y", Shape::vector(len), DType::F32);
    b.add_operator(BuiltinOp::Relu, &[x], &[y]);
    b.set_io(&[x], &[y]);
    b.to_bytes().unwrap()
}

/// Arena bytes and bookkeeping counts the executor needs for `blob`.
fn measure(blob: &[u8], width: PointerWidth) -> (usize, OverheadCounts) {
    let model = Arc::new(FlatModel::parse(blob).unwrap());
    let resolver = OpResolver::with_builtins();
    let mut interp = Interpreter::new(
        model,
        &resolver,
        vec![0u8; 1 << 20],
        InterpreterOptions {
            pointer_width: width,
            ..Default::default()
        },
    );
    interp.allocate_tensors().unwrap();
    (interp.arena_used_bytes(), interp.overhead_counts().unwrap())
}

fn requirement(blob: &[u8]) -> usize {
    measure(blob, PointerWidth::W32).0
}

fn narrow(heap_kb: usize) -> Platform {
    Platform::with_heap(MemoryBudget::from_kb(heap_kb))
}

fn wide(heap_kb: usize) -> Platform {
    Platform {
        host_width: PointerWidth::W64,
        ..narrow(heap_kb)
    }
}

fn model<'a>(platform: Platform) -> Model<'a> {
    let heap = platform.create_heap();
    Model::new(platform, heap, Collaborators::default())
}

struct MockAccelerator {
    name: &'static str,
    events: Mutex<Vec<String>>,
}

impl MockAccelerator {
    fn named(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            events: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Accelerator for MockAccelerator {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&self) {
        self.push("init".into());
    }

    fn deinit(&self) {
        self.push("deinit".into());
    }

    fn set_simulator_memory(&self, region: &str, _base: *const u8, len: usize) {
        self.push(format!("memory {region} {len}"));
    }

    fn invoke_simulator(
        &self,
        invoke: &mut dyn FnMut() -> Result<(), InterpreterError>,
    ) -> Result<(), InterpreterError> {
        self.push("simulate".into());
        invoke()
    }
}

// ── Scenarios ──────────────────────────────────────────────────

#[test]
fn scenario_a_hint_is_used_without_searching() {
    let probe = demo_blob(None);
    let hint = (requirement(&probe) + 1024) as u32;
    let blob = demo_blob(Some(hint));
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(256));

    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();

    assert!(m.is_loaded());
    assert_eq!(m.buffer_source(), Some(BufferSource::Hint));
    assert_eq!(m.runtime_buffer_len(), Some(hint as usize));
    assert_eq!(m.details().runtime_memory_size, hint as usize);
    assert!(m.sizing().is_none());
    assert_eq!(m.heap().stats().total_allocations, 1);
    assert_eq!(m.heap().allocated_bytes(), hint as usize);
}

#[test]
fn scenario_b_stale_hint_falls_back_to_search() {
    let blob = demo_blob(Some(512));
    let required = requirement(&blob);
    assert!(required > 512);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(256));

    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();

    assert_eq!(m.buffer_source(), Some(BufferSource::Search));
    let len = m.runtime_buffer_len().unwrap();
    assert!(len >= required);
    assert!(len <= required + sizing::SEARCH_GRANULARITY + sizing::SIZE_PADDING);
    assert_eq!(m.heap().allocated_bytes(), len);
    m.invoke().unwrap();
}

#[test]
fn scenario_c_requirement_above_heap_ceiling() {
    let blob = wide_relu_blob(8192);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(32));

    let err = m.load(&blob, &resolver, BufferRequest::Auto).unwrap_err();

    assert!(matches!(err, RuntimeError::AllocationSizingFailed { .. }));
    assert!(!m.is_loaded());
    assert_eq!(m.heap().allocated_bytes(), 0);
    assert_eq!(m.heap().stats().outstanding(), 0);
    assert!(m.details().name.is_empty());
}

#[test]
fn scenario_d_invoke_before_load() {
    let mut m = model(narrow(64));
    assert!(matches!(m.invoke(), Err(RuntimeError::NotLoaded)));
    assert!(matches!(m.input_size(), Err(RuntimeError::NotLoaded)));
    assert!(matches!(m.output(0), Err(RuntimeError::NotLoaded)));
    assert!(matches!(m.summary(), Err(RuntimeError::NotLoaded)));
    m.log_summary();
}

// ── Strategy selection ─────────────────────────────────────────

#[test]
fn test_hint_at_floor_is_ignored() {
    let blob = demo_blob(Some(256));
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(256));
    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();

    assert_eq!(m.buffer_source(), Some(BufferSource::Search));
    let probes = m.sizing().unwrap().probes.len() as u64;
    // Every probe plus the final buffer, and nothing for the hint.
    assert_eq!(m.heap().stats().total_allocations, probes + 1);
}

#[test]
fn test_explicit_search_skips_hint() {
    let probe = demo_blob(None);
    let hint = (requirement(&probe) + 1024) as u32;
    let blob = demo_blob(Some(hint));
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(256));

    m.load(&blob, &resolver, BufferRequest::Search).unwrap();
    assert_eq!(m.buffer_source(), Some(BufferSource::Search));
    assert!(m.runtime_buffer_len().unwrap() < hint as usize);
}

#[test]
fn test_hint_larger_than_heap_falls_back() {
    let blob = demo_blob(Some(1 << 20));
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(64));

    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();
    assert_eq!(m.buffer_source(), Some(BufferSource::Search));
    assert!(m.heap().stats().failed_allocations >= 1);
    assert_eq!(m.heap().allocated_bytes(), m.runtime_buffer_len().unwrap());
}

#[test]
fn test_caller_buffer() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut arena = vec![0u8; 16 * 1024];
    let mut m = model(narrow(64));

    m.load(&blob, &resolver, BufferRequest::Caller(&mut arena)).unwrap();
    assert_eq!(m.buffer_source(), Some(BufferSource::Caller));
    assert_eq!(m.details().runtime_memory_size, 16 * 1024);
    assert_eq!(m.heap().allocated_bytes(), 0);
    m.invoke().unwrap();
}

#[test]
fn test_caller_buffer_too_small_is_fatal() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut arena = vec![0u8; 256];
    let mut m = model(narrow(64));

    let err = m
        .load(&blob, &resolver, BufferRequest::Caller(&mut arena))
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::ExecutorConstructionFailed(InterpreterError::ArenaTooSmall { .. })
    ));
    assert!(!m.is_loaded());
    assert_eq!(m.heap().stats().total_allocations, 0);
}

#[test]
fn test_load_twice_is_rejected() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(128));
    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();
    let len = m.runtime_buffer_len();

    assert!(matches!(
        m.load(&blob, &resolver, BufferRequest::Auto),
        Err(RuntimeError::AlreadyLoaded)
    ));
    assert!(m.is_loaded());
    assert_eq!(m.runtime_buffer_len(), len);
}

#[test]
fn test_malformed_blob_is_fatal() {
    let blob = b"AMDL but not really a model".to_vec();
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(64));
    assert!(matches!(
        m.load(&blob, &resolver, BufferRequest::Auto),
        Err(RuntimeError::Format(_))
    ));
    assert!(!m.is_loaded());
}

#[test]
fn test_unsupported_operator_fails_search() {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor("x", Shape::new(vec![1, 4, 4, 1]), DType::F32);
    let w = b.add_constant_f32("w", Shape::new(vec![1, 1, 1, 1]), &[1.0]);
    let y = b.add_tensor("y", Shape::new(vec![1, 4, 4, 1]), DType::F32);
    b.add_operator(BuiltinOp::Conv2d, &[x, w], &[y]);
    b.set_io(&[x], &[y]);
    let blob = b.to_bytes().unwrap();
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(64));

    assert!(matches!(
        m.load(&blob, &resolver, BufferRequest::Auto),
        Err(RuntimeError::AllocationSizingFailed { .. })
    ));
    assert_eq!(m.heap().allocated_bytes(), 0);
}

// ── Properties ─────────────────────────────────────────────────

#[test]
fn test_fit_is_monotone_in_buffer_size() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let required = requirement(&blob);

    let mut fitted = Vec::new();
    for size in (required - 256..required + 256).step_by(16) {
        let mut arena = vec![0u8; size];
        let mut m = model(narrow(64));
        let ok = m
            .load(&blob, &resolver, BufferRequest::Caller(&mut arena))
            .is_ok();
        fitted.push((size, ok));
    }

    let first_fit = fitted.iter().position(|&(_, ok)| ok).unwrap();
    assert!(fitted[first_fit..].iter().all(|&(_, ok)| ok));
    assert!(fitted[..first_fit].iter().all(|&(size, _)| size < required));
}

#[test]
fn test_searched_size_above_every_failed_probe() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(256));
    m.load(&blob, &resolver, BufferRequest::Search).unwrap();

    let result = m.sizing().unwrap();
    for probe in &result.probes {
        if probe.outcome == runtime::ProbeOutcome::TooSmall {
            assert!(result.last_working >= probe.size + 1);
        }
    }
}

#[test]
fn test_unload_is_idempotent() {
    let blob = demo_blob(Some(400));
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(128));
    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();
    assert!(!m.parameters().is_empty());

    m.unload();
    m.unload();

    assert!(!m.is_loaded());
    assert!(m.parameters().is_empty());
    assert_eq!(m.details().runtime_memory_size, 0);
    assert_eq!(m.buffer_source(), None);
    assert!(m.find_metadata(PARAMETERS_TAG).is_none());
    assert_eq!(m.heap().allocated_bytes(), 0);
    assert_eq!(m.heap().stats().outstanding(), 0);
}

type Snapshot = (runtime::ModelDetails, Option<usize>, Option<BufferSource>, Vec<f32>);

fn load_invoke_unload<'a>(
    m: &mut Model<'a>,
    blob: &'a [u8],
    resolver: &'a OpResolver,
) -> Snapshot {
    m.load(blob, resolver, BufferRequest::Auto).unwrap();
    m.input_mut(0).unwrap().copy_from_f32(&[1.0; FEATURES]).unwrap();
    m.invoke().unwrap();
    let out = m.output(0).unwrap().to_f32_vec().unwrap();
    let snapshot = (m.details().clone(), m.runtime_buffer_len(), m.buffer_source(), out);
    m.unload();
    snapshot
}

#[test]
fn test_load_unload_load_round_trip() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(256));

    let first = load_invoke_unload(&mut m, &blob, &resolver);
    let second = load_invoke_unload(&mut m, &blob, &resolver);
    assert_eq!(first, second);
    assert_eq!(m.heap().allocated_bytes(), 0);
}

// ── Pointer-width adjustment ───────────────────────────────────

#[test]
fn test_wide_host_pads_hint_and_reports_target_size() {
    let unhinted = demo_blob(None);
    let (required, counts) = measure(&unhinted, PointerWidth::W64);
    let hint = (required + 512) as u32;
    let blob = demo_blob(Some(hint));
    let resolver = OpResolver::with_builtins();
    let mut m = model(wide(4 * 1024));

    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();

    assert_eq!(m.buffer_source(), Some(BufferSource::Hint));
    assert_eq!(m.runtime_buffer_len(), Some(hint as usize + 1024 * 1024));

    // The pad only widens the allocation; the reported size is the hint
    // converted to the target's pointer width.
    let reported = m.details().runtime_memory_size;
    assert_eq!(
        reported,
        overhead::adjust_runtime_size(hint as usize, &counts, PointerWidth::W64, PointerWidth::W32)
    );
    assert!(reported < hint as usize);
    assert!(reported >= requirement(&unhinted));
}

#[test]
fn test_wide_host_pads_searched_size() {
    let blob = demo_blob(None);
    let (_, counts) = measure(&blob, PointerWidth::W64);
    let resolver = OpResolver::with_builtins();
    let mut m = model(wide(256));
    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();

    let searched = m.sizing().unwrap().size;
    assert_eq!(m.buffer_source(), Some(BufferSource::Search));
    assert_eq!(m.runtime_buffer_len(), Some(searched + 1024));
    assert_eq!(
        m.details().runtime_memory_size,
        overhead::adjust_runtime_size(searched, &counts, PointerWidth::W64, PointerWidth::W32)
    );
    assert!(m.details().runtime_memory_size < searched);
}

#[test]
fn test_details_and_sizing_serialize_to_json() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(128));
    m.load(&blob, &resolver, BufferRequest::Search).unwrap();

    let details = serde_json::to_value(m.details()).unwrap();
    assert_eq!(details["name"], "demo");
    assert_eq!(details["version"], 2);
    assert_eq!(details["classes"], serde_json::json!(["left", "right"]));
    assert_eq!(
        details["runtime_memory_size"].as_u64(),
        Some(m.details().runtime_memory_size as u64)
    );

    let sizing = serde_json::to_value(m.sizing().unwrap()).unwrap();
    let probes = sizing["probes"].as_array().unwrap();
    assert_eq!(probes.len(), m.sizing().unwrap().probes.len());
    assert!(probes
        .iter()
        .all(|p| ["fits", "too_small", "allocation_failed"].contains(&p["outcome"].as_str().unwrap())));

    let source = serde_json::to_string(&m.buffer_source()).unwrap();
    assert_eq!(source, "\"search\"");
}

#[test]
fn test_mvp_accelerator_adds_pointer_overhead() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();

    let mut reported = Vec::new();
    for name in ["MVP", "other"] {
        let accelerator: Arc<dyn Accelerator> = MockAccelerator::named(name);
        let platform = wide(256);
        let heap = platform.create_heap();
        let collaborators = Collaborators {
            accelerator: Some(accelerator),
            ..Default::default()
        };
        let mut m = Model::new(platform, heap, collaborators);
        m.load(&blob, &resolver, BufferRequest::Search).unwrap();
        assert_eq!(m.details().accelerator, name);
        reported.push(m.details().runtime_memory_size);
    }
    // Fully-connected keeps 5 extra pointers, each 4 bytes narrower on target.
    assert_eq!(reported[1] - reported[0], 5 * 4);
}

// ── Collaborators ──────────────────────────────────────────────

#[test]
fn test_accelerator_lifecycle_and_simulator() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let accelerator = MockAccelerator::named("MVP");
    let shared: Arc<dyn Accelerator> = accelerator.clone();
    let platform = Platform {
        simulator_enabled: true,
        ..narrow(128)
    };
    let heap = platform.create_heap();
    let mut m = Model::new(
        platform,
        heap,
        Collaborators {
            accelerator: Some(shared),
            ..Default::default()
        },
    );

    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();
    m.invoke().unwrap();
    m.unload();

    let events = accelerator.events();
    assert_eq!(events.len(), 5);
    assert_eq!(events[0], "init");
    assert!(events[1].starts_with("memory sram "));
    assert_eq!(events[2], format!("memory flash {}", 2 * 1024 * 1024));
    assert_eq!(events[3], "simulate");
    assert_eq!(events[4], "deinit");
}

#[test]
fn test_failed_load_deinits_accelerator() {
    let blob = wide_relu_blob(8192);
    let resolver = OpResolver::with_builtins();
    let accelerator = MockAccelerator::named("npu");
    let shared: Arc<dyn Accelerator> = accelerator.clone();
    let platform = narrow(16);
    let heap = platform.create_heap();
    let mut m = Model::new(
        platform,
        heap,
        Collaborators {
            accelerator: Some(shared),
            ..Default::default()
        },
    );

    assert!(m.load(&blob, &resolver, BufferRequest::Auto).is_err());
    assert_eq!(accelerator.events(), vec!["init".to_string(), "deinit".to_string()]);
}

#[test]
fn test_profiler_and_recorder() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(128));

    m.enable_profiler().unwrap();
    m.enable_recorder().unwrap();
    assert!(m.profiler_is_enabled());
    assert!(m.recording_is_enabled());

    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();
    assert!(matches!(m.enable_profiler(), Err(RuntimeError::AlreadyLoaded)));

    m.invoke().unwrap();
    m.invoke().unwrap();
    assert_eq!(m.profiler().results().len(), 3);
    let recorded = m.recorded_data();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[2].op, "softmax");

    m.unload();
    assert!(m.recorded_data().is_empty());
}

#[test]
fn test_diagnostics_unavailable_on_platform() {
    let platform = Platform {
        profiler_enabled: false,
        recorder_enabled: false,
        ..narrow(64)
    };
    let mut m = model(platform);
    assert!(matches!(
        m.enable_profiler(),
        Err(RuntimeError::FeatureUnavailable("profiler"))
    ));
    assert!(matches!(
        m.enable_recorder(),
        Err(RuntimeError::FeatureUnavailable("recorder"))
    ));
}

#[test]
fn test_processing_callback_runs_per_operator() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let counter = Arc::new(AtomicUsize::new(0));
    let mut m = model(narrow(128));
    let seen = Arc::clone(&counter);
    m.set_processing_callback(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();
    m.invoke().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);

    m.clear_processing_callback();
    m.invoke().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

// ── Model information ──────────────────────────────────────────

#[test]
fn test_details_summary_and_metadata() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(128));
    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();

    let d = m.details();
    assert_eq!(d.name, "demo");
    assert_eq!(d.version, 2);
    assert_eq!(d.classes, vec!["left".to_string(), "right".to_string()]);
    assert_eq!(d.description, "identity projection followed by softmax");

    let summary = m.summary().unwrap();
    assert!(summary.starts_with("Model details:\n"));
    assert!(summary.contains("Name: demo"));
    assert!(summary.contains("Input: 1x64 (float32)"));
    assert!(summary.contains("Classes: left, right"));
    assert!(summary.contains("Description: identity projection"));

    let block = m.find_metadata(PARAMETERS_TAG).unwrap();
    assert_eq!(ModelParameters::from_bytes(block).unwrap(), *m.parameters());
    assert!(m.find_metadata("no_such_tag").is_none());
}

#[test]
fn test_malformed_parameters_are_not_fatal() {
    let mut b = ModelBuilder::new();
    let x = b.add_tensor("x", Shape::vector(8), DType::F32);
    let y = b.add_tensor("y", Shape::vector(8), DType::F32);
    b.add_operator(BuiltinOp::Relu, &[x], &[y]);
    b.set_io(&[x], &[y]);
    b.add_metadata(PARAMETERS_TAG, b"{not json".to_vec());
    let blob = b.to_bytes().unwrap();
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(64));

    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();
    assert!(m.parameters().is_empty());
    assert_eq!(m.buffer_source(), Some(BufferSource::Search));
}

#[test]
fn test_inference_output() {
    let blob = demo_blob(None);
    let resolver = OpResolver::with_builtins();
    let mut m = model(narrow(128));
    m.load(&blob, &resolver, BufferRequest::Auto).unwrap();
    assert_eq!(m.input_size().unwrap(), 1);
    assert_eq!(m.output_size().unwrap(), 1);

    // Identity weights, +0.5 bias, relu: only x[0] survives as the maximum.
    let mut x = [-1.0f32; FEATURES];
    x[0] = 3.0;
    m.input_mut(0).unwrap().copy_from_f32(&x).unwrap();
    m.invoke().unwrap();

    let y = m.output(0).unwrap().to_f32_vec().unwrap();
    let argmax = y
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();
    assert_eq!(argmax, 0);
    assert!((y.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    assert!(matches!(
        m.input(1),
        Err(RuntimeError::TensorIndex { kind: "input", index: 1, len: 1 })
    ));
}
