/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 卷积构建函数（conv / dconv）
 *
 * 两个函数都遵循同一填充约定：`pad > 0`时先对空间维对称补零，再做
 * 无隐式填充的valid卷积。输出空间尺寸恒为
 * floor((H + 2*pad - dilate*(k-1) - 1)/stride) + 1，
 * 与执行后端无关。
 *
 * 参数在`conv_<idx:02>`/`dwise_conv_<idx:02>`子作用域下声明：
 * 卷积核名"kernel"（Glorot正态默认初始化），偏置名"bias"（全零默认）。
 * 外部初始值（init_w/init_b）存在时按原样注入，形状不符即报错。
 */

use crate::nn::graph::GraphError;
use crate::nn::scope::Scope;
use crate::nn::var::{Init, Var};
use crate::tensor::Tensor;

/// 普通 2D 卷积
///
/// # 参数
/// - `x`: 输入 Var，形状 [batch, H, W, `in_chs`]
/// - `in_chs`/`out_chs`: 输入/输出通道数
/// - `k_size`: 方形卷积核边长
/// - `stride`: 步长
/// - `pad`: 每侧补零的像素数（不是"same"开关）
/// - `dilate`: 空洞率
/// - `scope`: 父作用域；`idx`: 本算子在块内的序号（决定子作用域名）
/// - `bias`: 是否加逐通道偏置
/// - `init_w`/`init_b`: 可选的外部初始值（移植自其它框架的权重）
///
/// # 返回
/// 输出 Var，形状 [batch, H', W', `out_chs`]
#[allow(clippy::too_many_arguments)]
pub fn conv(
    x: &Var,
    in_chs: usize,
    out_chs: usize,
    k_size: usize,
    stride: usize,
    pad: usize,
    dilate: usize,
    scope: &Scope,
    idx: usize,
    bias: bool,
    init_w: Option<&Tensor>,
    init_b: Option<&Tensor>,
) -> Result<Var, GraphError> {
    let op_scope = scope.child(format!("conv_{idx:02}"));
    let graph = x.get_graph();

    // 提前校验输入形状（诊断信息带作用域路径）
    let x_shape = x.value_expected_shape();
    if x_shape.len() != 4 || x_shape[3] != in_chs {
        return Err(GraphError::ShapeMismatch {
            expected: vec![in_chs],
            got: x_shape,
            message: format!("{}：输入须为 4D NHWC 且通道数等于 in_chs", op_scope.path()),
        });
    }

    // 卷积核 [k, k, C_in, C_out]
    let kernel = graph.declare_parameter(
        &[k_size, k_size, in_chs, out_chs],
        Init::GlorotNormal,
        init_w,
        &op_scope.qualify("kernel"),
    )?;

    let conv_id = graph.inner_mut().new_conv2d_node(
        x.node_id(),
        kernel.node_id(),
        stride,
        pad,
        dilate,
        None,
    )?;
    let conv_out = graph.wrap_node_id(conv_id);

    if bias {
        let b = graph.declare_parameter(
            &[out_chs],
            Init::Zeros,
            init_b,
            &op_scope.qualify("bias"),
        )?;
        let out_id = graph
            .inner_mut()
            .new_channel_bias_add_node(conv_out.node_id(), b.node_id(), None)?;
        Ok(graph.wrap_node_id(out_id))
    } else {
        Ok(conv_out)
    }
}

/// 深度（depthwise）2D 卷积
///
/// 每个输入通道各自用`chs_mult`个滤波器独立卷积，输出通道数恒为
/// `in_chs * chs_mult`，无跨通道混合。
///
/// # 参数
/// - `x`: 输入 Var，形状 [batch, H, W, `in_chs`]
/// - 其余同 `conv`；`chs_mult` 为每通道的滤波器个数
///
/// # 返回
/// 输出 Var，形状 [batch, H', W', `in_chs * chs_mult`]
#[allow(clippy::too_many_arguments)]
pub fn dconv(
    x: &Var,
    in_chs: usize,
    k_size: usize,
    stride: usize,
    pad: usize,
    dilate: usize,
    scope: &Scope,
    idx: usize,
    bias: bool,
    chs_mult: usize,
    init_w: Option<&Tensor>,
    init_b: Option<&Tensor>,
) -> Result<Var, GraphError> {
    let op_scope = scope.child(format!("dwise_conv_{idx:02}"));
    let graph = x.get_graph();

    let x_shape = x.value_expected_shape();
    if x_shape.len() != 4 || x_shape[3] != in_chs {
        return Err(GraphError::ShapeMismatch {
            expected: vec![in_chs],
            got: x_shape,
            message: format!("{}：输入须为 4D NHWC 且通道数等于 in_chs", op_scope.path()),
        });
    }

    // 深度卷积核 [k, k, C_in, chs_mult]
    let kernel = graph.declare_parameter(
        &[k_size, k_size, in_chs, chs_mult],
        Init::GlorotNormal,
        init_w,
        &op_scope.qualify("kernel"),
    )?;

    let conv_id = graph.inner_mut().new_depthwise_conv2d_node(
        x.node_id(),
        kernel.node_id(),
        stride,
        pad,
        dilate,
        None,
    )?;
    let conv_out = graph.wrap_node_id(conv_id);

    if bias {
        // 偏置是否采用外部初始值只看 Option 是否存在：
        // 全零的外部数组同样是有效的注入值
        let b = graph.declare_parameter(
            &[in_chs * chs_mult],
            Init::Zeros,
            init_b,
            &op_scope.qualify("bias"),
        )?;
        let out_id = graph
            .inner_mut()
            .new_channel_bias_add_node(conv_out.node_id(), b.node_id(), None)?;
        Ok(graph.wrap_node_id(out_id))
    } else {
        Ok(conv_out)
    }
}
