// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph description stored in the model header.
//!
//! A model holds one subgraph: a flat tensor table and an ordered operator
//! list. Operators reference tensors by index and reference their kind
//! through the operator-code table, the same indirection the executor's
//! op resolver works against.

use tensor_core::{DType, Shape};

/// Built-in operator kinds understood by the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinOp {
    Add,
    Conv2d,
    DepthwiseConv2d,
    FullyConnected,
    AveragePool2d,
    MaxPool2d,
    TransposeConv,
    Relu,
    Softmax,
    Reshape,
}

impl BuiltinOp {
    /// Every operator kind, in declaration order.
    pub const ALL: [BuiltinOp; 10] = [
        BuiltinOp::Add,
        BuiltinOp::Conv2d,
        BuiltinOp::DepthwiseConv2d,
        BuiltinOp::FullyConnected,
        BuiltinOp::AveragePool2d,
        BuiltinOp::MaxPool2d,
        BuiltinOp::TransposeConv,
        BuiltinOp::Relu,
        BuiltinOp::Softmax,
        BuiltinOp::Reshape,
    ];

    /// Parses an operator name.
    ///
    /// Accepts the snake_case name (`"fully_connected"`) and common aliases
    /// (`"fc"`, `"dense"`, `"conv"`, `"avgpool"`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "add" => Some(Self::Add),
            "conv2d" | "conv_2d" | "conv" => Some(Self::Conv2d),
            "depthwise_conv2d" | "depthwise_conv_2d" | "dwconv" => Some(Self::DepthwiseConv2d),
            "fully_connected" | "fc" | "dense" | "linear" => Some(Self::FullyConnected),
            "average_pool2d" | "average_pool_2d" | "avgpool" => Some(Self::AveragePool2d),
            "max_pool2d" | "max_pool_2d" | "maxpool" => Some(Self::MaxPool2d),
            "transpose_conv" | "conv2d_transpose" | "deconv" => Some(Self::TransposeConv),
            "relu" => Some(Self::Relu),
            "softmax" => Some(Self::Softmax),
            "reshape" => Some(Self::Reshape),
            _ => None,
        }
    }

    /// Returns the canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Conv2d => "conv2d",
            Self::DepthwiseConv2d => "depthwise_conv2d",
            Self::FullyConnected => "fully_connected",
            Self::AveragePool2d => "average_pool2d",
            Self::MaxPool2d => "max_pool2d",
            Self::TransposeConv => "transpose_conv",
            Self::Relu => "relu",
            Self::Softmax => "softmax",
            Self::Reshape => "reshape",
        }
    }
}

impl std::fmt::Display for BuiltinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the operator-code table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OperatorCode {
    pub op: BuiltinOp,
    #[serde(default = "default_op_version")]
    pub version: u32,
}

fn default_op_version() -> u32 {
    1
}

/// Location of a constant tensor's bytes in the data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BufferRef {
    pub offset: usize,
    pub len: usize,
}

/// Affine quantization parameters (per-tensor or per-channel).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quantization {
    pub scale: Vec<f32>,
    pub zero_point: Vec<i64>,
}

/// A tensor in the subgraph's tensor table.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TensorDef {
    pub name: String,
    pub shape: Shape,
    pub dtype: DType,
    /// Present for constants; activations have no backing data in the blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer: Option<BufferRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<Quantization>,
}

impl TensorDef {
    /// Returns `true` if the tensor's data lives in the model blob.
    pub fn is_constant(&self) -> bool {
        self.buffer.is_some()
    }

    /// Returns the tensor's size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }
}

/// Operator-specific options. Unused fields are omitted from the header.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpOptions {
    /// Pooling window `[height, width]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<[usize; 2]>,
    /// Stride `[height, width]`; defaults to the filter size for pooling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stride: Option<[usize; 2]>,
    /// Target shape for `reshape`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_shape: Option<Vec<usize>>,
    /// Temperature for `softmax`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f32>,
}

/// One node of the execution graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Operator {
    /// Index into [`ModelHeader::operator_codes`].
    pub opcode_index: usize,
    pub inputs: Vec<usize>,
    pub outputs: Vec<usize>,
    #[serde(default)]
    pub options: OpOptions,
}

/// The model's single subgraph.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Subgraph {
    pub tensors: Vec<TensorDef>,
    pub operators: Vec<Operator>,
    pub inputs: Vec<usize>,
    pub outputs: Vec<usize>,
}

/// A named block of opaque bytes in the data section.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MetadataEntry {
    pub name: String,
    pub offset: usize,
    pub len: usize,
}

/// The JSON header of a model blob.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelHeader {
    #[serde(default)]
    pub description: String,
    pub operator_codes: Vec<OperatorCode>,
    pub subgraph: Subgraph,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl ModelHeader {
    /// Returns the operator kind for an operator, if its code index is valid.
    pub fn op_of(&self, operator: &Operator) -> Option<BuiltinOp> {
        self.operator_codes.get(operator.opcode_index).map(|c| c.op)
    }

    /// Checks that every index in the graph and every data reference is in
    /// range for a data section of `data_len` bytes.
    pub(crate) fn validate(&self, data_len: usize) -> Result<(), crate::FormatError> {
        let graph = &self.subgraph;
        let tensor_count = graph.tensors.len();
        let bad = |msg: String| Err(crate::FormatError::InvalidGraph(msg));

        for (i, t) in graph.tensors.iter().enumerate() {
            if let Some(buf) = t.buffer {
                if buf.offset.checked_add(buf.len).map_or(true, |end| end > data_len) {
                    return bad(format!("tensor {i} ('{}') data out of range", t.name));
                }
                if buf.len != t.size_bytes() {
                    return bad(format!(
                        "tensor {i} ('{}') holds {} bytes but its shape needs {}",
                        t.name,
                        buf.len,
                        t.size_bytes()
                    ));
                }
            }
        }

        for (i, op) in graph.operators.iter().enumerate() {
            if op.opcode_index >= self.operator_codes.len() {
                return bad(format!("operator {i} uses unknown opcode {}", op.opcode_index));
            }
            if let Some(&t) = op.inputs.iter().chain(&op.outputs).find(|&&t| t >= tensor_count) {
                return bad(format!("operator {i} references missing tensor {t}"));
            }
        }

        if let Some(&t) = graph.inputs.iter().chain(&graph.outputs).find(|&&t| t >= tensor_count) {
            return bad(format!("subgraph io references missing tensor {t}"));
        }

        for m in &self.metadata {
            if m.offset.checked_add(m.len).map_or(true, |end| end > data_len) {
                return bad(format!("metadata '{}' out of range", m.name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_op_parsing() {
        assert_eq!(BuiltinOp::from_str_loose("fc"), Some(BuiltinOp::FullyConnected));
        assert_eq!(BuiltinOp::from_str_loose("MaxPool"), Some(BuiltinOp::MaxPool2d));
        assert_eq!(BuiltinOp::from_str_loose("gelu"), None);
        for op in BuiltinOp::ALL {
            assert_eq!(BuiltinOp::from_str_loose(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_operator_code_default_version() {
        let code: OperatorCode = serde_json::from_str(r#"{"op":"depthwise_conv2d"}"#).unwrap();
        assert_eq!(code.op, BuiltinOp::DepthwiseConv2d);
        assert_eq!(code.version, 1);
    }

    #[test]
    fn test_tensor_def_optional_fields_omitted() {
        let t = TensorDef {
            name: "act".into(),
            shape: Shape::matrix(1, 8),
            dtype: DType::F32,
            buffer: None,
            quantization: None,
        };
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("buffer"));
        assert!(!t.is_constant());
        assert_eq!(t.size_bytes(), 32);
    }

    #[test]
    fn test_validate_rejects_dangling_tensor() {
        let header = ModelHeader {
            operator_codes: vec![OperatorCode { op: BuiltinOp::Relu, version: 1 }],
            subgraph: Subgraph {
                operators: vec![Operator {
                    opcode_index: 0,
                    inputs: vec![0],
                    outputs: vec![1],
                    options: OpOptions::default(),
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(header.validate(0).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_constant() {
        let header = ModelHeader {
            subgraph: Subgraph {
                tensors: vec![TensorDef {
                    name: "w".into(),
                    shape: Shape::vector(4),
                    dtype: DType::F32,
                    buffer: Some(BufferRef { offset: 8, len: 16 }),
                    quantization: None,
                }],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(header.validate(16).is_err());
        assert!(header.validate(24).is_ok());
    }
}
