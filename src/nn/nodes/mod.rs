/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 节点句柄与节点ID
 *
 * `NodeHandle`包装具体的原始节点（`NodeType`），并持有图级的前向传播标记。
 * 节点的id与名称在注册进图时由`bind_id_and_name`一次性绑定。
 */

pub(in crate::nn) mod raw_node;

pub(in crate::nn) use raw_node::{NodeType, TraitNode};

use crate::nn::GraphError;
use crate::tensor::Tensor;
use raw_node::ops::{
    BatchNorm, ChannelBiasAdd, Conv2d, DepthwiseConv2d, InstanceNorm, LeakyReLU, LocalResponseNorm,
};
use raw_node::{Input, Parameter};

/// 节点ID（图内唯一，从1开始递增）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

#[derive(Clone)]
pub(in crate::nn) struct NodeHandle {
    raw_node: NodeType,
    last_forward_pass_id: u64,
}

impl NodeHandle {
    fn new<T: Into<NodeType>>(raw_node: T) -> Self {
        Self {
            raw_node: raw_node.into(),
            last_forward_pass_id: 0,
        }
    }

    // ==================== 原始节点构造 ====================

    pub fn new_input(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::new(Input::new(shape)?))
    }

    pub fn new_parameter(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::new(Parameter::new(shape)?))
    }

    pub fn new_conv2d(
        parents: &[&NodeHandle],
        stride: usize,
        padding: usize,
        dilation: usize,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(Conv2d::new(parents, stride, padding, dilation)?))
    }

    pub fn new_depthwise_conv2d(
        parents: &[&NodeHandle],
        stride: usize,
        padding: usize,
        dilation: usize,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(DepthwiseConv2d::new(
            parents, stride, padding, dilation,
        )?))
    }

    pub fn new_channel_bias_add(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        Ok(Self::new(ChannelBiasAdd::new(parents)?))
    }

    pub fn new_instance_norm(parents: &[&NodeHandle], eps: f32) -> Result<Self, GraphError> {
        Ok(Self::new(InstanceNorm::new(parents, eps)?))
    }

    pub fn new_batch_norm(parents: &[&NodeHandle], eps: f32) -> Result<Self, GraphError> {
        Ok(Self::new(BatchNorm::new(parents, eps)?))
    }

    pub fn new_local_response_norm(
        parents: &[&NodeHandle],
        depth_radius: usize,
        bias: f32,
        alpha: f32,
        beta: f32,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(LocalResponseNorm::new(
            parents,
            depth_radius,
            bias,
            alpha,
            beta,
        )?))
    }

    pub fn new_leaky_relu(parents: &[&NodeHandle], negative_slope: f32) -> Result<Self, GraphError> {
        Ok(Self::new(LeakyReLU::new(parents, negative_slope)?))
    }

    // ==================== 访问器 ====================

    pub fn bind_id_and_name(&mut self, id: NodeId, name: &str) {
        self.raw_node.set_id(id);
        self.raw_node.set_name(name);
    }

    pub fn id(&self) -> NodeId {
        self.raw_node.id()
    }

    pub fn name(&self) -> &str {
        self.raw_node.name()
    }

    pub fn value(&self) -> Option<&Tensor> {
        self.raw_node.value()
    }

    pub fn has_value(&self) -> bool {
        self.raw_node.value().is_some()
    }

    pub fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.raw_node.set_value(value)
    }

    pub fn value_expected_shape(&self) -> &[usize] {
        self.raw_node.value_expected_shape()
    }

    pub fn node_type(&self) -> &NodeType {
        &self.raw_node
    }

    pub fn calc_value_by_parents(&mut self, parents: &[NodeHandle]) -> Result<(), GraphError> {
        self.raw_node.calc_value_by_parents(parents)
    }

    pub fn last_forward_pass_id(&self) -> u64 {
        self.last_forward_pass_id
    }

    pub fn set_last_forward_pass_id(&mut self, pass_id: u64) {
        self.last_forward_pass_id = pass_id;
    }
}

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "节点[{}({})]", self.name(), self.id().0)
    }
}
