// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-format
//!
//! The serialized model container consumed by the runtime.
//!
//! A model is a single immutable byte blob: a small fixed prefix, a JSON
//! header describing the graph, and a data section holding constant tensors
//! and named metadata blocks. The blob is parsed in place, so a model can be
//! served straight from flash or from a memory-mapped file.
//!
//! - [`FlatModel`]: a zero-copy view over a blob (graph, constants, metadata).
//! - [`ModelBuilder`]: serializes a graph into a blob.
//! - [`ModelParameters`]: the typed key/value store kept in the
//!   `model_parameters` metadata block.
//! - [`MappedModel`]: a model file mapped into memory with `memmap2`.
//!
//! # Layout
//! ```text
//! ┌──────────────────────────────────┐
//! │ Magic: "AMDL" (4 bytes)          │
//! │ Version: u32 LE                  │
//! │ Header length: u32 LE            │
//! ├──────────────────────────────────┤
//! │ Header JSON (graph, metadata idx)│
//! ├──────────────────────────────────┤
//! │ Zero padding to 16 bytes         │
//! ├──────────────────────────────────┤
//! │ Data section                     │
//! └──────────────────────────────────┘
//! ```
//!
//! # Example
//! ```
//! use model_format::{BuiltinOp, FlatModel, ModelBuilder, ModelParameters};
//! use tensor_core::{DType, Shape};
//!
//! let mut params = ModelParameters::new();
//! params.insert("name", "tiny");
//!
//! let mut b = ModelBuilder::new();
//! let x = b.add_tensor("x", Shape::matrix(1, 4), DType::F32);
//! let y = b.add_tensor("y", Shape::matrix(1, 4), DType::F32);
//! b.add_operator(BuiltinOp::Relu, &[x], &[y]);
//! b.set_io(&[x], &[y]);
//! b.set_parameters(&params).unwrap();
//! let blob = b.to_bytes().unwrap();
//!
//! let model = FlatModel::parse(&blob).unwrap();
//! assert_eq!(model.subgraph().operators.len(), 1);
//! assert!(model.find_metadata("model_parameters").is_some());
//! ```

mod builder;
mod container;
mod error;
pub mod graph;
mod mapped;
pub mod parameters;

pub use builder::ModelBuilder;
pub use container::{is_model_blob, FlatModel, DATA_ALIGNMENT, MAGIC, VERSION};
pub use error::FormatError;
pub use graph::{
    BufferRef, BuiltinOp, MetadataEntry, ModelHeader, OpOptions, Operator, OperatorCode,
    Quantization, Subgraph, TensorDef,
};
pub use mapped::MappedModel;
pub use parameters::{ModelParameters, ParamValue, PARAMETERS_TAG};
