/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : Var 无参归一化扩展 trait
 *
 * 带可学习参数的归一化（instance/batch norm）走 layer 模块的构建函数，
 * 这里只放无参数的局部响应归一化。
 */

use crate::nn::Var;
use std::rc::Rc;

/// 无参归一化扩展 trait
pub trait VarNormOps {
    /// 局部响应归一化：input / (bias + alpha * 窗口平方和) ^ beta
    ///
    /// 跨通道窗口为 [c - `depth_radius`, c + `depth_radius`]（边界截断）。
    fn local_response_norm(&self, depth_radius: usize, bias: f32, alpha: f32, beta: f32) -> Var;
}

impl VarNormOps for Var {
    fn local_response_norm(&self, depth_radius: usize, bias: f32, alpha: f32, beta: f32) -> Var {
        let id = self
            .graph()
            .borrow_mut()
            .new_local_response_norm_node(self.node_id(), depth_radius, bias, alpha, beta, None)
            .expect("创建 LocalResponseNorm 节点失败");
        Self::new(id, Rc::clone(self.graph()))
    }
}
