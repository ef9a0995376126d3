/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 复合块（triplet_conv / coupled_conv / conv_with_in）
 *
 * 每个复合块打开一层新的命名作用域`<name>_<idx>`，按固定顺序串联基础算子，
 * 并把调用者给的初始化参数列表按固定窗口切给各算子。窗口边界是块契约的
 * 一部分，与块内代码顺序无关：
 * - triplet_conv（6槽）: [0..2) 1x1卷积核/偏置 → [2..4) 深度卷积核/偏置
 *   → [4..6) 1x1卷积核/偏置
 * - coupled_conv（6槽）: [0] 深度卷积核 → [1..3) 第一组IN的gamma/beta
 *   → [3] 1x1卷积核 → [4..6) 第二组IN的gamma/beta
 * - conv_with_in（3槽）: [0] 卷积核 → [1..3) IN的gamma/beta
 * 列表长度不符在触碰图之前即报`ConfigurationError`。
 *
 * 同一序号重复构图会得到完全相同的参数限定名，从而幂等复用同一批参数，
 * 这是检查点恢复正确性的前提。
 */

use crate::nn::graph::GraphError;
use crate::nn::scope::Scope;
use crate::nn::var::Var;
use crate::nn::var_ops::{VarActivationOps, VarNormOps};
use crate::tensor::Tensor;

use super::conv::{conv, dconv};
use super::norm::instance_norm;

// ==================== InitParams ====================

/// 复合块的初始化参数列表：有序、定长的可选外部初始值序列
///
/// 槽位到算子的映射见各块的文档；`None`槽位表示该参数用默认初始化器。
#[derive(Default)]
pub struct InitParams(Vec<Option<Tensor>>);

impl InitParams {
    /// 全部槽位取默认初始化（长度须与块要求一致）
    pub fn none(len: usize) -> Self {
        Self((0..len).map(|_| None).collect())
    }

    pub fn new(slots: Vec<Option<Tensor>>) -> Self {
        Self(slots)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn slot(&self, index: usize) -> Option<&Tensor> {
        self.0[index].as_ref()
    }

    /// 块契约：长度必须精确匹配，否则在任何图改动之前就失败
    fn expect_len(
        &self,
        expected: usize,
        block_name: &str,
        scope_path: &str,
    ) -> Result<(), GraphError> {
        if self.0.len() != expected {
            return Err(GraphError::ConfigurationError(format!(
                "{block_name}（{scope_path}）需要恰好{expected}个初始化参数槽位，实际得到{}",
                self.0.len()
            )));
        }
        Ok(())
    }
}

impl From<Vec<Option<Tensor>>> for InitParams {
    fn from(slots: Vec<Option<Tensor>>) -> Self {
        Self(slots)
    }
}

// ==================== 每块的命名槽位 ====================
// 列表在进块时一次性解构成命名字段，之后块内只用名字取值，
// 杜绝在算子调用点写裸下标带来的错位风险。

struct TripletConvSlots<'a> {
    pointwise_in_kernel: Option<&'a Tensor>,
    pointwise_in_bias: Option<&'a Tensor>,
    depthwise_kernel: Option<&'a Tensor>,
    depthwise_bias: Option<&'a Tensor>,
    pointwise_out_kernel: Option<&'a Tensor>,
    pointwise_out_bias: Option<&'a Tensor>,
}

impl<'a> TripletConvSlots<'a> {
    fn from_list(params: &'a InitParams, block_scope: &Scope) -> Result<Self, GraphError> {
        params.expect_len(6, "triplet_conv", &block_scope.path())?;
        Ok(Self {
            pointwise_in_kernel: params.slot(0),
            pointwise_in_bias: params.slot(1),
            depthwise_kernel: params.slot(2),
            depthwise_bias: params.slot(3),
            pointwise_out_kernel: params.slot(4),
            pointwise_out_bias: params.slot(5),
        })
    }
}

struct CoupledConvSlots<'a> {
    depthwise_kernel: Option<&'a Tensor>,
    norm1_gamma: Option<&'a Tensor>,
    norm1_beta: Option<&'a Tensor>,
    pointwise_kernel: Option<&'a Tensor>,
    norm2_gamma: Option<&'a Tensor>,
    norm2_beta: Option<&'a Tensor>,
}

impl<'a> CoupledConvSlots<'a> {
    fn from_list(params: &'a InitParams, block_scope: &Scope) -> Result<Self, GraphError> {
        params.expect_len(6, "coupled_conv", &block_scope.path())?;
        Ok(Self {
            depthwise_kernel: params.slot(0),
            norm1_gamma: params.slot(1),
            norm1_beta: params.slot(2),
            pointwise_kernel: params.slot(3),
            norm2_gamma: params.slot(4),
            norm2_beta: params.slot(5),
        })
    }
}

struct ConvWithInSlots<'a> {
    kernel: Option<&'a Tensor>,
    gamma: Option<&'a Tensor>,
    beta: Option<&'a Tensor>,
}

impl<'a> ConvWithInSlots<'a> {
    fn from_list(params: &'a InitParams, block_scope: &Scope) -> Result<Self, GraphError> {
        params.expect_len(3, "conv_with_in", &block_scope.path())?;
        Ok(Self {
            kernel: params.slot(0),
            gamma: params.slot(1),
            beta: params.slot(2),
        })
    }
}

// ==================== 复合块 ====================

/// triplet_conv 块：1x1卷积升维前置 + 深度卷积 + 1x1卷积收尾
///
/// 拓扑固定为 [1x1卷积(in→in, 带偏置) → LeakyReLU → 深度卷积(k×k,
/// stride/dilate, 带偏置) → 1x1卷积(in→out, 带偏置) → 局部响应归一化
/// → LeakyReLU]，消耗6个初始化参数槽位。
///
/// # 参数
/// - `x`: 输入 Var [batch, H, W, `in_chs`]
/// - `k_size`/`stride`/`dilate`: 深度卷积的核长/步长/空洞率
///   （深度卷积的 pad 固定为 (k-1)/2）
/// - `scope`/`idx`: 命名作用域与块序号
/// - `init_params`: 6个槽位的初始化参数列表
#[allow(clippy::too_many_arguments)]
pub fn triplet_conv(
    x: &Var,
    in_chs: usize,
    out_chs: usize,
    k_size: usize,
    stride: usize,
    dilate: usize,
    scope: &Scope,
    idx: usize,
    init_params: &InitParams,
) -> Result<Var, GraphError> {
    let block_scope = scope.child(format!("triplet_conv_{idx}"));
    let slots = TripletConvSlots::from_list(init_params, &block_scope)?;
    let pad = (k_size - 1) / 2;

    let x = conv(
        x,
        in_chs,
        in_chs,
        1,
        1,
        0,
        1,
        &block_scope,
        0,
        true,
        slots.pointwise_in_kernel,
        slots.pointwise_in_bias,
    )?;
    let x = x.leaky_relu(0.2);
    let x = dconv(
        &x,
        in_chs,
        k_size,
        stride,
        pad,
        dilate,
        &block_scope,
        1,
        true,
        1,
        slots.depthwise_kernel,
        slots.depthwise_bias,
    )?;
    let x = conv(
        &x,
        in_chs,
        out_chs,
        1,
        1,
        0,
        1,
        &block_scope,
        2,
        true,
        slots.pointwise_out_kernel,
        slots.pointwise_out_bias,
    )?;
    let x = x.local_response_norm(5, 5e-5, 1.0, 0.5);
    Ok(x.leaky_relu(0.2))
}

/// coupled_conv 块：深度卷积 + 逐点卷积的可分离组合，归一化提供偏移
///
/// 拓扑固定为 [深度卷积(k×k, stride, 无偏置) → instance_norm →
/// 1x1卷积(in→out, 无偏置) → instance_norm → 可选ReLU]，消耗6个槽位。
/// 块内所有卷积不带偏置：仿射偏移由归一化的beta承担。
///
/// # 参数
/// - `act`: 是否在块尾加ReLU
/// - 其余同 `triplet_conv`
#[allow(clippy::too_many_arguments)]
pub fn coupled_conv(
    x: &Var,
    in_chs: usize,
    out_chs: usize,
    k_size: usize,
    stride: usize,
    act: bool,
    scope: &Scope,
    idx: usize,
    init_params: &InitParams,
) -> Result<Var, GraphError> {
    let block_scope = scope.child(format!("coupled_conv_{idx}"));
    let slots = CoupledConvSlots::from_list(init_params, &block_scope)?;
    let pad = (k_size - 1) / 2;

    let x = dconv(
        x,
        in_chs,
        k_size,
        stride,
        pad,
        1,
        &block_scope,
        0,
        false,
        1,
        slots.depthwise_kernel,
        None,
    )?;
    let x = instance_norm(
        &x,
        in_chs,
        &block_scope,
        1,
        1e-6,
        slots.norm1_gamma,
        slots.norm1_beta,
    )?;
    let x = conv(
        &x,
        in_chs,
        out_chs,
        1,
        1,
        0,
        1,
        &block_scope,
        2,
        false,
        slots.pointwise_kernel,
        None,
    )?;
    let x = instance_norm(
        &x,
        out_chs,
        &block_scope,
        3,
        1e-6,
        slots.norm2_gamma,
        slots.norm2_beta,
    )?;
    Ok(if act { x.relu() } else { x })
}

/// conv_with_in 块：普通卷积 + 实例归一化
///
/// 拓扑固定为 [卷积(k×k, stride 1, pad (k-1)/2, 无偏置) → instance_norm
/// → 可选ReLU]，消耗3个槽位。本块恒为等尺寸输出（stride固定为1）。
#[allow(clippy::too_many_arguments)]
pub fn conv_with_in(
    x: &Var,
    in_chs: usize,
    out_chs: usize,
    k_size: usize,
    act: bool,
    scope: &Scope,
    idx: usize,
    init_params: &InitParams,
) -> Result<Var, GraphError> {
    let block_scope = scope.child(format!("conv_with_in_{idx}"));
    let slots = ConvWithInSlots::from_list(init_params, &block_scope)?;
    let pad = (k_size - 1) / 2;

    let x = conv(
        x,
        in_chs,
        out_chs,
        k_size,
        1,
        pad,
        1,
        &block_scope,
        0,
        false,
        slots.kernel,
        None,
    )?;
    let x = instance_norm(&x, out_chs, &block_scope, 1, 1e-6, slots.gamma, slots.beta)?;
    Ok(if act { x.relu() } else { x })
}
