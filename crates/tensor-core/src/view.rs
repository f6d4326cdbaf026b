// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Borrowed tensor views over arena or blob bytes.
//!
//! The bytes behind a view belong to someone else: activations live in the
//! runtime arena owned by a loaded model, constants live in the model blob.
//! Views are tied to those lifetimes by the borrow checker.

use crate::{DType, Shape, TensorError};
use std::fmt;

/// A read-only view over one tensor.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    shape: &'a Shape,
    dtype: DType,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Creates a view, checking that `data` matches `shape` and `dtype`.
    pub fn new(shape: &'a Shape, dtype: DType, data: &'a [u8]) -> Result<Self, TensorError> {
        check_len(shape, dtype, data.len())?;
        Ok(Self { shape, dtype, data })
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &'a Shape {
        self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the raw byte slice.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the memory footprint in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Decodes the elements as little-endian `f32`.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{DType, Shape, TensorView};
    /// let shape = Shape::vector(2);
    /// let bytes = [0u8, 0, 128, 63, 0, 0, 0, 64];
    /// let view = TensorView::new(&shape, DType::F32, &bytes).unwrap();
    /// assert_eq!(view.to_f32_vec().unwrap(), vec![1.0, 2.0]);
    /// ```
    pub fn to_f32_vec(&self) -> Result<Vec<f32>, TensorError> {
        if self.dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op: "to_f32_vec",
                dtype: self.dtype,
            });
        }
        Ok(self
            .data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

impl fmt::Display for TensorView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.shape, self.dtype)
    }
}

/// A writable view over one tensor, used to fill model inputs.
#[derive(Debug)]
pub struct TensorViewMut<'a> {
    shape: &'a Shape,
    dtype: DType,
    data: &'a mut [u8],
}

impl<'a> TensorViewMut<'a> {
    /// Creates a mutable view, checking that `data` matches `shape` and `dtype`.
    pub fn new(shape: &'a Shape, dtype: DType, data: &'a mut [u8]) -> Result<Self, TensorError> {
        check_len(shape, dtype, data.len())?;
        Ok(Self { shape, dtype, data })
    }

    pub fn shape(&self) -> &Shape {
        self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.data
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape,
            dtype: self.dtype,
            data: self.data,
        }
    }

    /// Overwrites the tensor with raw bytes of exactly the tensor's size.
    pub fn copy_from_bytes(&mut self, bytes: &[u8]) -> Result<(), TensorError> {
        if bytes.len() != self.data.len() {
            return Err(TensorError::BufferSizeMismatch {
                expected: self.data.len(),
                actual: bytes.len(),
            });
        }
        self.data.copy_from_slice(bytes);
        Ok(())
    }

    /// Encodes `values` as little-endian `f32` into the tensor.
    pub fn copy_from_f32(&mut self, values: &[f32]) -> Result<(), TensorError> {
        if self.dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op: "copy_from_f32",
                dtype: self.dtype,
            });
        }
        if values.len() * 4 != self.data.len() {
            return Err(TensorError::BufferSizeMismatch {
                expected: self.data.len(),
                actual: values.len() * 4,
            });
        }
        for (dst, v) in self.data.chunks_exact_mut(4).zip(values) {
            dst.copy_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    /// Zeroes the tensor.
    pub fn fill_zero(&mut self) {
        self.data.fill(0);
    }
}

fn check_len(shape: &Shape, dtype: DType, actual: usize) -> Result<(), TensorError> {
    let expected = shape.size_bytes(dtype);
    if actual != expected {
        return Err(TensorError::BufferSizeMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_size_mismatch() {
        let shape = Shape::matrix(2, 3);
        let bytes = [0u8; 10];
        assert!(matches!(
            TensorView::new(&shape, DType::F32, &bytes),
            Err(TensorError::BufferSizeMismatch { expected: 24, actual: 10 })
        ));
    }

    #[test]
    fn test_write_then_read_f32() {
        let shape = Shape::vector(3);
        let mut bytes = [0u8; 12];
        let mut view = TensorViewMut::new(&shape, DType::F32, &mut bytes).unwrap();
        view.copy_from_f32(&[1.5, -2.0, 3.25]).unwrap();
        assert_eq!(view.as_view().to_f32_vec().unwrap(), vec![1.5, -2.0, 3.25]);
    }

    #[test]
    fn test_f32_on_int_tensor_rejected() {
        let shape = Shape::vector(4);
        let bytes = [0u8; 4];
        let view = TensorView::new(&shape, DType::I8, &bytes).unwrap();
        assert!(matches!(
            view.to_f32_vec(),
            Err(TensorError::UnsupportedDType { dtype: DType::I8, .. })
        ));
    }

    #[test]
    fn test_copy_from_bytes_length_checked() {
        let shape = Shape::vector(4);
        let mut bytes = [0u8; 4];
        let mut view = TensorViewMut::new(&shape, DType::U8, &mut bytes).unwrap();
        assert!(view.copy_from_bytes(&[1, 2, 3]).is_err());
        view.copy_from_bytes(&[1, 2, 3, 4]).unwrap();
        assert_eq!(view.as_bytes(), &[1, 2, 3, 4]);
        view.fill_zero();
        assert_eq!(view.as_bytes(), &[0; 4]);
        view.as_bytes_mut()[2] = 7;
        assert_eq!(view.as_view().as_bytes(), &[0, 0, 7, 0]);
    }

    #[test]
    fn test_display() {
        let shape = Shape::new(vec![1, 28, 28, 1]);
        let bytes = vec![0u8; 784];
        let view = TensorView::new(&shape, DType::I8, &bytes).unwrap();
        assert_eq!(view.to_string(), "1x28x28x1 (int8)");
    }
}
