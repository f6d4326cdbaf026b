// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference float32 kernels.
//!
//! These are straightforward loops meant to make models executable in tests
//! and on the host, not to be fast. Convolution variants have op codes but
//! no reference kernel; register one through [`OpResolver::register`].

mod activation;
mod add;
mod fully_connected;
mod pool;
mod reshape;

use crate::{KernelError, NodeInfo, OpResolver};
use model_format::{BuiltinOp, TensorDef};
use std::sync::Arc;
use tensor_core::DType;

pub use activation::{Relu, Softmax};
pub use add::Add;
pub use fully_connected::FullyConnected;
pub use pool::{Pool2d, PoolKind};
pub use reshape::Reshape;

pub(crate) fn register_builtins(resolver: &mut OpResolver) {
    resolver
        .register(BuiltinOp::Add, Arc::new(Add))
        .register(BuiltinOp::FullyConnected, Arc::new(FullyConnected))
        .register(BuiltinOp::Relu, Arc::new(Relu))
        .register(BuiltinOp::Softmax, Arc::new(Softmax))
        .register(BuiltinOp::Reshape, Arc::new(Reshape))
        .register(BuiltinOp::MaxPool2d, Arc::new(Pool2d::new(PoolKind::Max)))
        .register(BuiltinOp::AveragePool2d, Arc::new(Pool2d::new(PoolKind::Average)));
}

/// Fails unless every tensor of the node is float32.
fn require_f32(node: &NodeInfo<'_>) -> Result<(), KernelError> {
    match node
        .inputs
        .iter()
        .chain(&node.outputs)
        .find(|t| t.dtype != DType::F32)
    {
        Some(t) => Err(KernelError::Invalid(format!(
            "tensor '{}' is {}, only float32 is supported",
            t.name, t.dtype
        ))),
        None => Ok(()),
    }
}

fn require_elements(t: &TensorDef, expected: usize) -> Result<(), KernelError> {
    let actual = t.shape.num_elements();
    if actual != expected {
        return Err(KernelError::Invalid(format!(
            "tensor '{}' has {actual} elements, expected {expected}",
            t.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, InterpreterOptions, InvokeHooks, OpResolver};
    use model_format::{BuiltinOp, FlatModel, ModelBuilder, OpOptions};
    use std::sync::Arc;
    use tensor_core::{DType, Shape};

    fn run(blob: &[u8], inputs: &[&[f32]]) -> Vec<f32> {
        let model = Arc::new(FlatModel::parse(blob).unwrap());
        let resolver = OpResolver::with_builtins();
        let mut interp = Interpreter::new(model, &resolver, vec![0u8; 16 * 1024], InterpreterOptions::default());
        interp.allocate_tensors().unwrap();
        for (i, values) in inputs.iter().enumerate() {
            interp.input_mut(i).unwrap().copy_from_f32(values).unwrap();
        }
        interp.invoke(&mut InvokeHooks::default()).unwrap();
        interp.output(0).unwrap().to_f32_vec().unwrap()
    }

    #[test]
    fn test_add_broadcasts_last_dim() {
        let mut b = ModelBuilder::new();
        let x = b.add_tensor("x", Shape::matrix(2, 3), DType::F32);
        let bias = b.add_constant_f32("bias", Shape::vector(3), &[10.0, 20.0, 30.0]);
        let y = b.add_tensor("y", Shape::matrix(2, 3), DType::F32);
        b.add_operator(BuiltinOp::Add, &[x, bias], &[y]);
        b.set_io(&[x], &[y]);
        let out = run(&b.to_bytes().unwrap(), &[&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]]);
        assert_eq!(out, vec![11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    }

    #[test]
    fn test_fully_connected_with_bias() {
        let mut b = ModelBuilder::new();
        let x = b.add_tensor("x", Shape::matrix(1, 3), DType::F32);
        let w = b.add_constant_f32("w", Shape::matrix(2, 3), &[1.0, 0.0, -1.0, 0.5, 0.5, 0.5]);
        let bias = b.add_constant_f32("b", Shape::vector(2), &[1.0, -1.0]);
        let y = b.add_tensor("y", Shape::matrix(1, 2), DType::F32);
        b.add_operator(BuiltinOp::FullyConnected, &[x, w, bias], &[y]);
        b.set_io(&[x], &[y]);
        let out = run(&b.to_bytes().unwrap(), &[&[2.0, 4.0, 6.0]]);
        assert_eq!(out, vec![2.0 - 6.0 + 1.0, 6.0 - 1.0]);
    }

    #[test]
    fn test_relu_then_softmax() {
        let mut b = ModelBuilder::new();
        let x = b.add_tensor("x", Shape::matrix(1, 3), DType::F32);
        let h = b.add_tensor("h", Shape::matrix(1, 3), DType::F32);
        let y = b.add_tensor("y", Shape::matrix(1, 3), DType::F32);
        b.add_operator(BuiltinOp::Relu, &[x], &[h]);
        b.add_operator(BuiltinOp::Softmax, &[h], &[y]);
        b.set_io(&[x], &[y]);
        let out = run(&b.to_bytes().unwrap(), &[&[-5.0, 0.0, 0.0]]);
        for v in &out {
            assert!((v - 1.0 / 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reshape_copies_bytes() {
        let mut b = ModelBuilder::new();
        let x = b.add_tensor("x", Shape::matrix(2, 2), DType::F32);
        let y = b.add_tensor("y", Shape::vector(4), DType::F32);
        b.add_operator_with(
            BuiltinOp::Reshape,
            &[x],
            &[y],
            OpOptions {
                new_shape: Some(vec![4]),
                ..Default::default()
            },
        );
        b.set_io(&[x], &[y]);
        let out = run(&b.to_bytes().unwrap(), &[&[1.0, 2.0, 3.0, 4.0]]);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_max_and_average_pool() {
        let input: Vec<f32> = (1..=16).map(|v| v as f32).collect();
        for (op, expected) in [
            (BuiltinOp::MaxPool2d, vec![6.0, 8.0, 14.0, 16.0]),
            (BuiltinOp::AveragePool2d, vec![3.5, 5.5, 11.5, 13.5]),
        ] {
            let mut b = ModelBuilder::new();
            let x = b.add_tensor("x", Shape::new(vec![1, 4, 4, 1]), DType::F32);
            let y = b.add_tensor("y", Shape::new(vec![1, 2, 2, 1]), DType::F32);
            b.add_operator_with(
                op,
                &[x],
                &[y],
                OpOptions {
                    filter: Some([2, 2]),
                    ..Default::default()
                },
            );
            b.set_io(&[x], &[y]);
            assert_eq!(run(&b.to_bytes().unwrap(), &[&input]), expected, "{op}");
        }
    }
}
