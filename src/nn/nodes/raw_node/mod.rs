/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 原始节点（raw node）的共同特性与类型枚举
 *
 * 本库的节点只做前向构图与求值：梯度/雅可比等训练语义不在职责范围内，
 * 由外部执行引擎（或后续crate）承担。
 */

mod input;
mod parameter;

pub(in crate::nn) mod ops;

pub(in crate::nn) use input::Input;
pub(in crate::nn) use parameter::Parameter;

use super::{NodeHandle, NodeId};
use crate::nn::GraphError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;
use ops::{
    BatchNorm, ChannelBiasAdd, Conv2d, DepthwiseConv2d, InstanceNorm, LeakyReLU, LocalResponseNorm,
};

#[enum_dispatch]
#[derive(Clone)]
pub(in crate::nn) enum NodeType {
    Input(Input),
    Parameter(Parameter),
    Conv2d(Conv2d),
    DepthwiseConv2d(DepthwiseConv2d),
    ChannelBiasAdd(ChannelBiasAdd),
    InstanceNorm(InstanceNorm),
    BatchNorm(BatchNorm),
    LocalResponseNorm(LocalResponseNorm),
    LeakyReLU(LeakyReLU),
}

#[enum_dispatch(NodeType)]
pub(in crate::nn) trait TraitNode {
    fn id(&self) -> NodeId;

    fn set_id(&mut self, id: NodeId);

    fn name(&self) -> &str;

    fn set_name(&mut self, name: &str);

    /// 节点值的预期形状（在节点创建时即确定）
    fn value_expected_shape(&self) -> &[usize];

    /// 根据父节点的值计算本节点的值
    /// （该接口只在Graph的前向传播中使用，调用时所有父节点的值均已被预先计算）
    fn calc_value_by_parents(&mut self, parents: &[NodeHandle]) -> Result<(), GraphError>;

    fn value(&self) -> Option<&Tensor>;

    fn set_value(&mut self, _value: Option<&Tensor>) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(
            "该类型节点的值由前向传播计算，不应该被手动设置".to_string(),
        ))
    }

    /// 用于错误消息的节点描述
    fn display_node(&self) -> String {
        format!("节点[{}]", self.name())
    }
}
