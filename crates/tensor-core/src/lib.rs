// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Tensor descriptors shared by the model container, the executor and the
//! runtime.
//!
//! This crate provides:
//! - [`Shape`]: runtime shape descriptors.
//! - [`DType`]: supported element data types (float32, int8, uint8, int16, int32).
//! - [`TensorView`] / [`TensorViewMut`]: zero-copy views over tensor bytes
//!   that live inside a runtime arena or a model blob.
//!
//! # Design Goals
//! - Views never own memory: the arena belongs to the loaded model.
//! - Element access goes through little-endian byte conversion, so views are
//!   valid at any alignment.
//! - Clean error types via `thiserror`.

mod dtype;
mod error;
mod shape;
mod view;

pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
pub use view::{TensorView, TensorViewMut};
