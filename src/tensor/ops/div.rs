/*
 * @Author       : 老董
 * @Date         : 2026-02-10
 * @Description  : 张量的除法，实现了两个张量“逐元素”（或张量与纯数）相除的运算，并返回一个新的张量。
 *                 广播规则同加法；除数中不得含零元素。
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use std::ops::Div;

impl Div<f32> for Tensor {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        assert!(scalar != 0.0, "{}", TensorError::DivByZeroElement);
        Self {
            data: &self.data / scalar,
        }
    }
}
impl Div<f32> for &Tensor {
    type Output = Tensor;

    fn div(self, scalar: f32) -> Tensor {
        assert!(scalar != 0.0, "{}", TensorError::DivByZeroElement);
        Tensor {
            data: &self.data / scalar,
        }
    }
}

impl Div for Tensor {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        div_within_tensors(&self, &other)
    }
}

impl<'a> Div<&'a Self> for Tensor {
    type Output = Self;

    fn div(self, other: &'a Self) -> Self {
        div_within_tensors(&self, other)
    }
}

impl Div<Tensor> for &Tensor {
    type Output = Tensor;

    fn div(self, other: Tensor) -> Tensor {
        div_within_tensors(self, &other)
    }
}

impl<'b> Div<&'b Tensor> for &Tensor {
    type Output = Tensor;

    fn div(self, other: &'b Tensor) -> Tensor {
        div_within_tensors(self, other)
    }
}

/// 两个张量逐元素相除，支持 NumPy 风格广播（broadcasting）
///
/// # Panics
/// 如果形状不兼容（无法广播），或除数张量中存在零元素
fn div_within_tensors(tensor_1: &Tensor, tensor_2: &Tensor) -> Tensor {
    assert!(
        tensor_1.can_broadcast_with(tensor_2),
        "{}",
        TensorError::OperatorError {
            operator: Operator::Div,
            tensor1_shape: tensor_1.shape().to_vec(),
            tensor2_shape: tensor_2.shape().to_vec(),
        }
    );
    assert!(
        !tensor_2.data.iter().any(|&x| x == 0.0),
        "{}",
        TensorError::DivByZeroElement
    );
    Tensor {
        data: &tensor_1.data / &tensor_2.data,
    }
}
