// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Programmatic construction of model blobs.

use crate::container::{align_up, DATA_ALIGNMENT, MAGIC, VERSION};
use crate::graph::{
    BufferRef, BuiltinOp, MetadataEntry, ModelHeader, OpOptions, Operator, OperatorCode,
    Quantization, TensorDef,
};
use crate::parameters::{ModelParameters, PARAMETERS_TAG};
use crate::FormatError;
use tensor_core::{DType, Shape};

/// Builds a model blob tensor by tensor and operator by operator.
///
/// Constant data and metadata blocks are appended to the data section at
/// 16-byte aligned offsets.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    header: ModelHeader,
    data: Vec<u8>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an activation tensor and returns its index.
    pub fn add_tensor(&mut self, name: &str, shape: Shape, dtype: DType) -> usize {
        self.push_tensor(name, shape, dtype, None)
    }

    /// Adds a constant tensor backed by `bytes` and returns its index.
    pub fn add_constant(&mut self, name: &str, shape: Shape, dtype: DType, bytes: &[u8]) -> usize {
        let buffer = self.append_data(bytes);
        self.push_tensor(name, shape, dtype, Some(buffer))
    }

    /// Adds a float32 constant tensor and returns its index.
    pub fn add_constant_f32(&mut self, name: &str, shape: Shape, values: &[f32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.add_constant(name, shape, DType::F32, &bytes)
    }

    /// Attaches quantization parameters to an existing tensor.
    pub fn set_quantization(&mut self, tensor: usize, quantization: Quantization) {
        if let Some(t) = self.header.subgraph.tensors.get_mut(tensor) {
            t.quantization = Some(quantization);
        }
    }

    /// Appends an operator with default options.
    pub fn add_operator(&mut self, op: BuiltinOp, inputs: &[usize], outputs: &[usize]) -> usize {
        self.add_operator_with(op, inputs, outputs, OpOptions::default())
    }

    /// Appends an operator with explicit options.
    pub fn add_operator_with(
        &mut self,
        op: BuiltinOp,
        inputs: &[usize],
        outputs: &[usize],
        options: OpOptions,
    ) -> usize {
        let opcode_index = match self.header.operator_codes.iter().position(|c| c.op == op) {
            Some(i) => i,
            None => {
                self.header.operator_codes.push(OperatorCode { op, version: 1 });
                self.header.operator_codes.len() - 1
            }
        };
        self.header.subgraph.operators.push(Operator {
            opcode_index,
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            options,
        });
        self.header.subgraph.operators.len() - 1
    }

    /// Declares the subgraph's input and output tensors.
    pub fn set_io(&mut self, inputs: &[usize], outputs: &[usize]) {
        self.header.subgraph.inputs = inputs.to_vec();
        self.header.subgraph.outputs = outputs.to_vec();
    }

    pub fn set_description(&mut self, description: &str) {
        self.header.description = description.to_string();
    }

    /// Adds (or replaces) a named metadata block.
    pub fn add_metadata(&mut self, name: &str, bytes: Vec<u8>) {
        let buf = self.append_data(&bytes);
        self.header.metadata.retain(|m| m.name != name);
        self.header.metadata.push(MetadataEntry {
            name: name.to_string(),
            offset: buf.offset,
            len: buf.len,
        });
    }

    /// Stores `params` as the model's parameter block.
    pub fn set_parameters(&mut self, params: &ModelParameters) -> Result<(), FormatError> {
        let bytes = params.to_bytes()?;
        self.add_metadata(PARAMETERS_TAG, bytes);
        Ok(())
    }

    /// Serializes the model into a blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        self.header.validate(self.data.len())?;
        let header_json = serde_json::to_vec(&self.header)
            .map_err(|e| FormatError::InvalidHeader(e.to_string()))?;
        let header_len = u32::try_from(header_json.len())
            .map_err(|_| FormatError::InvalidHeader("header exceeds 4 GiB".into()))?;

        let header_end = 12 + header_json.len();
        let data_start = align_up(header_end, DATA_ALIGNMENT);

        let mut blob = Vec::with_capacity(data_start + self.data.len());
        blob.extend_from_slice(MAGIC);
        blob.extend_from_slice(&VERSION.to_le_bytes());
        blob.extend_from_slice(&header_len.to_le_bytes());
        blob.extend_from_slice(&header_json);
        blob.resize(data_start, 0);
        blob.extend_from_slice(&self.data);
        Ok(blob)
    }

    fn push_tensor(&mut self, name: &str, shape: Shape, dtype: DType, buffer: Option<BufferRef>) -> usize {
        self.header.subgraph.tensors.push(TensorDef {
            name: name.to_string(),
            shape,
            dtype,
            buffer,
            quantization: None,
        });
        self.header.subgraph.tensors.len() - 1
    }

    fn append_data(&mut self, bytes: &[u8]) -> BufferRef {
        let offset = align_up(self.data.len(), DATA_ALIGNMENT);
        self.data.resize(offset, 0);
        self.data.extend_from_slice(bytes);
        BufferRef {
            offset,
            len: bytes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlatModel;

    #[test]
    fn test_opcodes_deduplicated() {
        let mut b = ModelBuilder::new();
        let x = b.add_tensor("x", Shape::vector(4), DType::F32);
        let y = b.add_tensor("y", Shape::vector(4), DType::F32);
        let z = b.add_tensor("z", Shape::vector(4), DType::F32);
        b.add_operator(BuiltinOp::Relu, &[x], &[y]);
        b.add_operator(BuiltinOp::Relu, &[y], &[z]);
        b.set_io(&[x], &[z]);
        let blob = b.to_bytes().unwrap();
        let model = FlatModel::parse(&blob).unwrap();
        assert_eq!(model.header().operator_codes.len(), 1);
        assert_eq!(model.subgraph().operators.len(), 2);
    }

    #[test]
    fn test_constants_are_aligned() {
        let mut b = ModelBuilder::new();
        b.add_constant("a", Shape::vector(3), DType::I8, &[1, 2, 3]);
        let t = b.add_constant("b", Shape::vector(2), DType::I8, &[4, 5]);
        let blob = b.to_bytes().unwrap();
        let model = FlatModel::parse(&blob).unwrap();
        let buf = model.subgraph().tensors[t].buffer.unwrap();
        assert_eq!(buf.offset % DATA_ALIGNMENT, 0);
        assert_eq!(model.constant_data(t), Some(&[4u8, 5][..]));
    }

    #[test]
    fn test_constant_size_checked() {
        let mut b = ModelBuilder::new();
        b.add_constant("w", Shape::vector(4), DType::F32, &[0u8; 3]);
        assert!(matches!(b.to_bytes(), Err(FormatError::InvalidGraph(_))));
    }

    #[test]
    fn test_metadata_replaced() {
        let mut b = ModelBuilder::new();
        b.add_metadata("tag", b"old".to_vec());
        b.add_metadata("tag", b"new".to_vec());
        let blob = b.to_bytes().unwrap();
        let model = FlatModel::parse(&blob).unwrap();
        assert_eq!(model.find_metadata("tag"), Some(&b"new"[..]));
        assert_eq!(model.metadata_tags().count(), 1);
    }

    #[test]
    fn test_quantization_attached() {
        let mut b = ModelBuilder::new();
        let t = b.add_tensor("q", Shape::vector(8), DType::I8);
        b.set_quantization(
            t,
            Quantization {
                scale: vec![0.5],
                zero_point: vec![-3],
            },
        );
        let blob = b.to_bytes().unwrap();
        let model = FlatModel::parse(&blob).unwrap();
        assert_eq!(model.subgraph().tensors[t].quantization.as_ref().unwrap().zero_point, vec![-3]);
    }
}
