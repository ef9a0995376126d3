/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : Var 激活函数扩展 trait
 *
 * 提供激活函数的链式调用支持，用户需 import 此 trait 后才能使用。
 */

use crate::nn::Var;
use std::rc::Rc;

/// 激活函数扩展 trait
///
/// 提供常用激活函数的链式调用：
/// - `relu()`: `ReLU` 激活
/// - `leaky_relu(alpha)`: `LeakyReLU` 激活
///
/// # 使用示例
/// ```ignore
/// use only_conv::nn::{Var, VarActivationOps};
///
/// let h = x.leaky_relu(0.2);
/// let out = y.relu();
/// ```
pub trait VarActivationOps {
    /// `ReLU` 激活：max(0, x)
    fn relu(&self) -> Var;

    /// `LeakyReLU` 激活：x if x > 0 else alpha * x
    fn leaky_relu(&self, alpha: f32) -> Var;
}

impl VarActivationOps for Var {
    fn relu(&self) -> Var {
        let id = self
            .graph()
            .borrow_mut()
            .new_relu_node(self.node_id(), None)
            .expect("创建 ReLU 节点失败");
        Self::new(id, Rc::clone(self.graph()))
    }

    fn leaky_relu(&self, alpha: f32) -> Var {
        let id = self
            .graph()
            .borrow_mut()
            .new_leaky_relu_node(self.node_id(), alpha, None)
            .expect("创建 LeakyReLU 节点失败");
        Self::new(id, Rc::clone(self.graph()))
    }
}
