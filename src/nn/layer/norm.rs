/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 归一化构建函数（instance_norm / batch_norm）
 *
 * 两个函数共享同一仿射参数契约：在自己的子作用域下声明
 * gamma（全一默认）与 beta（全零默认），形状均为 [chs]，可被外部初始值覆盖。
 */

use crate::nn::graph::GraphError;
use crate::nn::scope::Scope;
use crate::nn::var::{Init, Var};
use crate::tensor::Tensor;

/// 实例归一化
///
/// 统计量按每个样本、每个通道在空间轴上独立计算，无任何跨调用状态。
///
/// # 参数
/// - `x`: 输入 Var，形状 [batch, H, W, `chs`]
/// - `chs`: 通道数；`scope`/`idx`: 命名作用域与序号（子作用域`in_<idx>`）
/// - `eps`: 数值稳定项（加在方差上）
/// - `init_g`/`init_b`: gamma/beta 的可选外部初始值
pub fn instance_norm(
    x: &Var,
    chs: usize,
    scope: &Scope,
    idx: usize,
    eps: f32,
    init_g: Option<&Tensor>,
    init_b: Option<&Tensor>,
) -> Result<Var, GraphError> {
    let op_scope = scope.child(format!("in_{idx}"));
    norm_impl(x, chs, &op_scope, eps, init_g, init_b, false)
}

/// 批归一化
///
/// 统计量在 batch + 空间轴上联合计算，且每次求值都按当前批次现算——
/// 刻意不维护推理态的滑动统计量（GAN里batchnorm须始终处于训练行为）。
///
/// # 参数
/// 同 `instance_norm`，子作用域为`bn_<idx:02>`。
pub fn batch_norm(
    x: &Var,
    chs: usize,
    scope: &Scope,
    idx: usize,
    eps: f32,
    init_g: Option<&Tensor>,
    init_b: Option<&Tensor>,
) -> Result<Var, GraphError> {
    let op_scope = scope.child(format!("bn_{idx:02}"));
    norm_impl(x, chs, &op_scope, eps, init_g, init_b, true)
}

fn norm_impl(
    x: &Var,
    chs: usize,
    op_scope: &Scope,
    eps: f32,
    init_g: Option<&Tensor>,
    init_b: Option<&Tensor>,
    over_batch: bool,
) -> Result<Var, GraphError> {
    let graph = x.get_graph();

    let x_shape = x.value_expected_shape();
    if x_shape.len() != 4 || x_shape[3] != chs {
        return Err(GraphError::ShapeMismatch {
            expected: vec![chs],
            got: x_shape,
            message: format!("{}：输入须为 4D NHWC 且通道数等于 chs", op_scope.path()),
        });
    }

    let gamma = graph.declare_parameter(&[chs], Init::Ones, init_g, &op_scope.qualify("gamma"))?;
    let beta = graph.declare_parameter(&[chs], Init::Zeros, init_b, &op_scope.qualify("beta"))?;

    let mut g = graph.inner_mut();
    let node_id = if over_batch {
        g.new_batch_norm_node(x.node_id(), gamma.node_id(), beta.node_id(), eps, None)?
    } else {
        g.new_instance_norm_node(x.node_id(), gamma.node_id(), beta.node_id(), eps, None)?
    };
    drop(g);

    Ok(graph.wrap_node_id(node_id))
}
