// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The model lifecycle: load, invoke, unload.
//!
//! ```text
//!             load(blob, resolver, request)
//!  Unloaded ────────────────────────────────▶ Loaded ──┐
//!     ▲                                        │      │ invoke()
//!     └──────────────── unload() ──────────────┘ ◀────┘
//! ```
//!
//! `load()` chooses the runtime buffer in order:
//!
//! 1. a caller buffer, if one was given (failure is fatal);
//! 2. the model's `runtime_memory_size` hint, if present and above 256
//!    bytes (failure falls through);
//! 3. the sizing search (failure is fatal).
//!
//! Every fatal path runs the same teardown as `unload()`.

use crate::accelerator::{Accelerator, SIMULATOR_FLASH_BYTES};
use crate::details::format_units;
use crate::overhead;
use crate::sizing::{BufferSizer, SizingResult};
use crate::slot::{Executor, ExecutorSlot};
use crate::{BufferSource, ModelDetails, Platform, RuntimeBuffer, RuntimeError};
use interpreter::{
    ErrorReporter, InterpreterOptions, InvokeHooks, OpResolver, Profiler, RecordedOp, Recorder,
};
use memory_manager::MemoryPool;
use model_format::{FlatModel, FormatError, ModelParameters};
use std::sync::Arc;
use tensor_core::{TensorView, TensorViewMut};

/// Hints at or below this many bytes are ignored.
pub const HINT_FLOOR: u32 = 256;

/// Parameter key of the embedded runtime memory size hint.
pub const RUNTIME_MEMORY_SIZE_KEY: &str = "runtime_memory_size";

/// How `load()` should obtain its runtime buffer.
#[derive(Debug, Default)]
pub enum BufferRequest<'a> {
    /// Try the embedded size hint, then fall back to the search.
    #[default]
    Auto,
    /// Skip the hint and search for the optimal size directly.
    Search,
    /// Use this buffer as-is.
    Caller(&'a mut [u8]),
}

/// Services shared with the model rather than owned by it.
#[derive(Debug, Clone, Default)]
pub struct Collaborators {
    pub accelerator: Option<Arc<dyn Accelerator>>,
    pub profiler: Arc<Profiler>,
    pub recorder: Arc<Recorder>,
    pub reporter: ErrorReporter,
}

type ProcessingCallback = Box<dyn FnMut(usize) + Send>;

/// An inference model bound to a platform heap.
///
/// The model blob and operator resolver are borrowed for `'a`; they cannot
/// be freed or modified while the model can still be loaded from them.
///
/// # Example
/// ```
/// use memory_manager::MemoryBudget;
/// use model_format::{BuiltinOp, ModelBuilder};
/// use runtime::{BufferRequest, BufferSource, Collaborators, Model, Platform};
/// use interpreter::OpResolver;
/// use tensor_core::{DType, Shape};
///
/// let mut b = ModelBuilder::new();
/// let x = b.add_tensor("x", Shape::vector(8), DType::F32);
/// let y = b.add_tensor("y", Shape::vector(8), DType::F32);
/// b.add_operator(BuiltinOp::Relu, &[x], &[y]);
/// b.set_io(&[x], &[y]);
/// let blob = b.to_bytes().unwrap();
///
/// let resolver = OpResolver::with_builtins();
/// let platform = Platform::with_heap(MemoryBudget::from_kb(64));
/// let heap = platform.create_heap();
/// let mut model = Model::new(platform, heap, Collaborators::default());
/// model.load(&blob, &resolver, BufferRequest::Auto).unwrap();
/// assert_eq!(model.buffer_source(), Some(BufferSource::Search));
/// model.invoke().unwrap();
/// model.unload();
/// ```
pub struct Model<'a> {
    platform: Platform,
    heap: MemoryPool,
    collaborators: Collaborators,
    slot: ExecutorSlot<'a>,
    flat: Option<Arc<FlatModel<'a>>>,
    parameters: ModelParameters,
    details: ModelDetails,
    source: Option<BufferSource>,
    sizing: Option<SizingResult>,
    profiler_enabled: bool,
    recorder_enabled: bool,
    callback: Option<ProcessingCallback>,
}

impl<'a> Model<'a> {
    /// Creates an unloaded model.
    pub fn new(platform: Platform, heap: MemoryPool, collaborators: Collaborators) -> Self {
        Self {
            platform,
            heap,
            collaborators,
            slot: ExecutorSlot::new(),
            flat: None,
            parameters: ModelParameters::new(),
            details: ModelDetails::default(),
            source: None,
            sizing: None,
            profiler_enabled: false,
            recorder_enabled: false,
            callback: None,
        }
    }

    /// Loads `blob` and binds it to a runtime buffer.
    ///
    /// On error the model is left unloaded and every buffer it allocated has
    /// been returned to the heap. Loading an already-loaded model fails with
    /// [`RuntimeError::AlreadyLoaded`] and leaves the current model intact.
    pub fn load(
        &mut self,
        blob: &'a [u8],
        resolver: &'a OpResolver,
        request: BufferRequest<'a>,
    ) -> Result<(), RuntimeError> {
        if self.is_loaded() {
            tracing::error!("model already loaded");
            return Err(RuntimeError::AlreadyLoaded);
        }

        match self.try_load(blob, resolver, request) {
            Ok(()) => {
                tracing::info!(
                    source = ?self.source,
                    runtime_memory = self.details.runtime_memory_size,
                    "model loaded"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to load model: {e}");
                self.unload();
                Err(e)
            }
        }
    }

    fn try_load(
        &mut self,
        blob: &'a [u8],
        resolver: &'a OpResolver,
        request: BufferRequest<'a>,
    ) -> Result<(), RuntimeError> {
        if let Some(accelerator) = &self.collaborators.accelerator {
            accelerator.init();
        }

        let flat = Arc::new(FlatModel::parse(blob)?);
        self.flat = Some(Arc::clone(&flat));
        self.load_parameters(&flat);

        let (source, size) = match request {
            BufferRequest::Caller(buffer) => {
                let size = buffer.len();
                self.construct_executor(&flat, resolver, RuntimeBuffer::Caller(buffer))?;
                (BufferSource::Caller, size)
            }
            BufferRequest::Auto => match self.load_from_hint(&flat, resolver) {
                Some(size) => (BufferSource::Hint, size),
                None => (BufferSource::Search, self.load_from_search(&flat, resolver)?),
            },
            BufferRequest::Search => {
                (BufferSource::Search, self.load_from_search(&flat, resolver)?)
            }
        };
        self.source = Some(source);
        self.finalize_details(&flat, size);
        Ok(())
    }

    /// Parameter problems never fail the load.
    fn load_parameters(&mut self, flat: &FlatModel<'a>) {
        self.details.description = flat.description().to_string();
        match ModelParameters::from_model(flat) {
            Ok(params) => {
                self.details.load_parameters(&params);
                self.parameters = params;
            }
            Err(FormatError::MetadataNotFound(tag)) => {
                tracing::debug!(tag = %tag, "model has no parameter block");
            }
            Err(e) => tracing::warn!("{}", RuntimeError::MetadataParseFailed(e)),
        }
    }

    /// Tries the embedded size hint. On success returns the hint itself; the
    /// bound buffer may be larger by the host pointer pad.
    fn load_from_hint(
        &mut self,
        flat: &Arc<FlatModel<'a>>,
        resolver: &'a OpResolver,
    ) -> Option<usize> {
        let hint = self
            .parameters
            .get_u32(RUNTIME_MEMORY_SIZE_KEY)
            .filter(|&hint| hint > HINT_FLOOR)?;
        let size = hint as usize + self.platform.hint_pad();
        tracing::info!(hint, size, "runtime memory size from model");

        let buffer = match self.heap.allocate(size) {
            Ok(buffer) => buffer,
            Err(e) => {
                tracing::warn!(size, "failed to allocate buffer of hinted size: {e}");
                return None;
            }
        };
        match self.construct_executor(flat, resolver, RuntimeBuffer::Owned(buffer)) {
            Ok(()) => Some(hint as usize),
            Err(e) => {
                tracing::warn!(hint, "hinted runtime memory size does not fit the model: {e}");
                None
            }
        }
    }

    /// Searches for the optimal size and binds a buffer of that size plus
    /// the host pointer pad. Returns the unpadded size.
    fn load_from_search(
        &mut self,
        flat: &Arc<FlatModel<'a>>,
        resolver: &'a OpResolver,
    ) -> Result<usize, RuntimeError> {
        let sizer = BufferSizer::new(
            &self.heap,
            self.platform.heap_safety_margin,
            self.executor_options(),
        );
        let sizing = sizer.search(flat, resolver)?;
        let required = sizing.size;
        let size = required + self.platform.search_pad();
        self.sizing = Some(sizing);

        let buffer = self
            .heap
            .allocate(size)
            .map_err(|source| RuntimeError::AllocationFailed { size, source })?;
        self.construct_executor(flat, resolver, RuntimeBuffer::Owned(buffer))?;
        Ok(required)
    }

    /// Constructs the executor in the slot. A rejected buffer is dropped
    /// here, which returns an owned buffer to the heap.
    fn construct_executor(
        &mut self,
        flat: &Arc<FlatModel<'a>>,
        resolver: &'a OpResolver,
        buffer: RuntimeBuffer<'a>,
    ) -> Result<(), RuntimeError> {
        let options = self.executor_options();
        self.slot
            .construct(Arc::clone(flat), resolver, buffer, options)
            .map(|_| ())
            .map_err(|rejected| RuntimeError::ExecutorConstructionFailed(rejected.source))
    }

    fn executor_options(&self) -> InterpreterOptions {
        InterpreterOptions {
            pointer_width: self.platform.host_width,
            reporter: self.collaborators.reporter.clone(),
        }
    }

    /// `size` is the runtime memory the model needs on this host, without
    /// any pointer pad. On a wide host it is converted to the target's size.
    fn finalize_details(&mut self, flat: &FlatModel<'a>, size: usize) {
        let accelerator = self.collaborators.accelerator.clone();
        let accelerator_name = accelerator.as_ref().map(|a| a.name().to_string());

        let counts = self.slot.get().and_then(|e| e.overhead_counts());
        self.details.runtime_memory_size = match counts {
            Some(mut counts) if self.platform.is_wide_host() => {
                counts.extra_pointers = overhead::extra_pointers(flat, accelerator_name.as_deref());
                overhead::adjust_runtime_size(
                    size,
                    &counts,
                    self.platform.host_width,
                    self.platform.target_width,
                )
            }
            _ => size,
        };

        if let (Some(accelerator), Some(name)) = (accelerator, accelerator_name) {
            self.details.accelerator = name;
            if self.platform.simulator_enabled {
                if let Some(executor) = self.slot.get() {
                    accelerator.set_simulator_memory(
                        "sram",
                        executor.arena_ptr(),
                        self.details.runtime_memory_size,
                    );
                }
                accelerator.set_simulator_memory(
                    "flash",
                    flat.blob().as_ptr(),
                    SIMULATOR_FLASH_BYTES,
                );
            }
        }
    }

    /// Releases the executor, the runtime buffer and everything read from
    /// the model. Safe to call at any time, any number of times.
    pub fn unload(&mut self) {
        if let Some(accelerator) = &self.collaborators.accelerator {
            accelerator.deinit();
        }
        self.flat = None;
        self.parameters.clear();
        self.details.clear();
        self.collaborators.recorder.clear();
        self.sizing = None;
        self.source = None;
        if let Some(buffer) = self.slot.destroy() {
            tracing::debug!(
                bytes = buffer.len(),
                owned = buffer.is_owned(),
                "runtime buffer released"
            );
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.is_occupied()
    }

    /// Runs one inference.
    pub fn invoke(&mut self) -> Result<(), RuntimeError> {
        let Some(executor) = self.slot.get_mut() else {
            tracing::error!("model not loaded");
            return Err(RuntimeError::NotLoaded);
        };

        if self.recorder_enabled {
            self.collaborators.recorder.clear();
        }
        if self.profiler_enabled {
            self.collaborators.profiler.reset();
        }

        let callback: Option<&mut (dyn FnMut(usize) + Send)> = match self.callback.as_mut() {
            Some(callback) => Some(&mut **callback),
            None => None,
        };
        let mut hooks = InvokeHooks {
            profiler: if self.profiler_enabled {
                Some(self.collaborators.profiler.as_ref())
            } else {
                None
            },
            recorder: if self.recorder_enabled {
                Some(self.collaborators.recorder.as_ref())
            } else {
                None
            },
            callback,
        };

        let result = match &self.collaborators.accelerator {
            Some(accelerator) if self.platform.simulator_enabled => {
                accelerator.invoke_simulator(&mut || executor.invoke(&mut hooks))
            }
            _ => executor.invoke(&mut hooks),
        };
        result.map_err(RuntimeError::InvokeFailed)
    }

    /// Number of model inputs.
    pub fn input_size(&self) -> Result<usize, RuntimeError> {
        Ok(self.executor()?.inputs_len())
    }

    pub fn input(&self, index: usize) -> Result<TensorView<'_>, RuntimeError> {
        self.executor()?.input(index).map_err(RuntimeError::from_accessor)
    }

    /// Writable view of an input, for filling it before `invoke()`.
    pub fn input_mut(&mut self, index: usize) -> Result<TensorViewMut<'_>, RuntimeError> {
        let executor = self.slot.get_mut().ok_or(RuntimeError::NotLoaded)?;
        executor.input_mut(index).map_err(RuntimeError::from_accessor)
    }

    /// Number of model outputs.
    pub fn output_size(&self) -> Result<usize, RuntimeError> {
        Ok(self.executor()?.outputs_len())
    }

    pub fn output(&self, index: usize) -> Result<TensorView<'_>, RuntimeError> {
        self.executor()?.output(index).map_err(RuntimeError::from_accessor)
    }

    fn executor(&self) -> Result<&Executor<'a>, RuntimeError> {
        self.slot.get().ok_or(RuntimeError::NotLoaded)
    }

    /// Enables the per-operator profiler for subsequent loads.
    pub fn enable_profiler(&mut self) -> Result<(), RuntimeError> {
        if !self.platform.profiler_enabled {
            return Err(RuntimeError::FeatureUnavailable("profiler"));
        }
        if self.is_loaded() {
            return Err(RuntimeError::AlreadyLoaded);
        }
        self.profiler_enabled = true;
        Ok(())
    }

    pub fn profiler_is_enabled(&self) -> bool {
        self.profiler_enabled
    }

    pub fn profiler(&self) -> &Profiler {
        &self.collaborators.profiler
    }

    /// Enables per-operator output recording for subsequent loads.
    pub fn enable_recorder(&mut self) -> Result<(), RuntimeError> {
        if !self.platform.recorder_enabled {
            return Err(RuntimeError::FeatureUnavailable("recorder"));
        }
        if self.is_loaded() {
            return Err(RuntimeError::AlreadyLoaded);
        }
        self.recorder_enabled = true;
        Ok(())
    }

    pub fn recording_is_enabled(&self) -> bool {
        self.recorder_enabled
    }

    /// Outputs captured during the last `invoke()`.
    pub fn recorded_data(&self) -> Vec<RecordedOp> {
        self.collaborators.recorder.data()
    }

    /// Sets a callback run after each operator with the operator index.
    pub fn set_processing_callback(&mut self, callback: impl FnMut(usize) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_processing_callback(&mut self) {
        self.callback = None;
    }

    /// Looks up a named metadata block in the loaded model.
    pub fn find_metadata(&self, tag: &str) -> Option<&'a [u8]> {
        self.flat.as_ref()?.find_metadata(tag)
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    pub fn details(&self) -> &ModelDetails {
        &self.details
    }

    /// Strategy that produced the runtime buffer, while loaded.
    pub fn buffer_source(&self) -> Option<BufferSource> {
        self.source
    }

    /// The search that sized the runtime buffer, if one ran during the
    /// current load.
    pub fn sizing(&self) -> Option<&SizingResult> {
        self.sizing.as_ref()
    }

    /// Length of the bound runtime buffer, while loaded.
    pub fn runtime_buffer_len(&self) -> Option<usize> {
        self.slot.get().map(|e| e.arena_len())
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn heap(&self) -> &MemoryPool {
        &self.heap
    }

    /// Multi-line human-readable description of the loaded model.
    pub fn summary(&self) -> Result<String, RuntimeError> {
        let executor = self.executor()?;
        let d = &self.details;
        let mut lines = vec![
            "Model details:".to_string(),
            format!("Name: {}", d.name),
            format!("Version: {}", d.version),
            format!("Date: {}", d.date),
            format!("Hash: {}", d.hash),
            format!("Accelerator: {}", d.accelerator),
            format!("Tensor runtime memory: {}", format_units(d.runtime_memory_size)),
        ];
        if let Ok(input) = executor.input(0) {
            lines.push(format!("Input: {input}"));
        }
        if let Ok(output) = executor.output(0) {
            lines.push(format!("Output: {output}"));
        }
        if !d.classes.is_empty() {
            lines.push(format!("Classes: {}", d.classes.join(", ")));
        }
        if !d.description.is_empty() {
            lines.push(format!("Description: {}", d.description));
        }
        Ok(lines.join("\n"))
    }

    /// Emits [`summary`](Self::summary) through `tracing`, one event per line.
    pub fn log_summary(&self) {
        match self.summary() {
            Ok(summary) => {
                for line in summary.lines() {
                    tracing::info!("{line}");
                }
            }
            Err(e) => tracing::error!("{e}"),
        }
    }
}

impl Drop for Model<'_> {
    fn drop(&mut self) {
        if self.is_loaded() {
            self.unload();
        }
    }
}

impl std::fmt::Debug for Model<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("loaded", &self.is_loaded())
            .field("source", &self.source)
            .field("runtime_memory_size", &self.details.runtime_memory_size)
            .field("heap", &self.heap)
            .finish()
    }
}
