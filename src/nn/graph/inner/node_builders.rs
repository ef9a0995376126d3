/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : GraphInner 节点构建方法（new_*_node）
 *
 * 算子节点默认自动生成唯一名（如"conv2d_3"）：同一拓扑重复构图时算子节点
 * 会重新创建，只有参数节点按限定名幂等复用，算子名因此不参与检查点寻址。
 */

use super::GraphInner;
use super::super::error::GraphError;
use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;

impl GraphInner {
    /// 添加节点到列表
    pub(in crate::nn::graph) fn add_node_to_list(
        &mut self,
        mut node_handle: NodeHandle,
        name: Option<&str>,
        node_type: &str,
        parents: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        let node_id = self.generate_valid_node_id();
        let node_name = self.generate_valid_new_node_name(name.unwrap_or(""), node_type)?;

        for &parent_id in parents {
            self.forward_edges
                .entry(parent_id)
                .or_default()
                .push(node_id);
        }
        self.backward_edges
            .entry(node_id)
            .or_default()
            .extend(parents);

        node_handle.bind_id_and_name(node_id, &node_name);
        self.nodes.insert(node_id, node_handle);
        Ok(node_id)
    }

    /// 创建输入节点
    pub fn new_input_node(
        &mut self,
        shape: &[usize],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = NodeHandle::new_input(shape)?;
        self.add_node_to_list(node, name, "input", &[])
    }

    /// 创建 Conv2d 节点（显式补零 + valid卷积）
    pub fn new_conv2d_node(
        &mut self,
        input_id: NodeId,
        kernel_id: NodeId,
        stride: usize,
        padding: usize,
        dilation: usize,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_conv2d(
            &self.get_nodes(&[input_id, kernel_id])?,
            stride,
            padding,
            dilation,
        )?;
        self.add_node_to_list(handle, name, "conv2d", &[input_id, kernel_id])
    }

    /// 创建 DepthwiseConv2d 节点
    pub fn new_depthwise_conv2d_node(
        &mut self,
        input_id: NodeId,
        kernel_id: NodeId,
        stride: usize,
        padding: usize,
        dilation: usize,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_depthwise_conv2d(
            &self.get_nodes(&[input_id, kernel_id])?,
            stride,
            padding,
            dilation,
        )?;
        self.add_node_to_list(handle, name, "dwise_conv2d", &[input_id, kernel_id])
    }

    /// 创建逐通道偏置相加节点
    pub fn new_channel_bias_add_node(
        &mut self,
        input_id: NodeId,
        bias_id: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_channel_bias_add(&self.get_nodes(&[input_id, bias_id])?)?;
        self.add_node_to_list(handle, name, "bias_add", &[input_id, bias_id])
    }

    /// 创建实例归一化节点
    pub fn new_instance_norm_node(
        &mut self,
        input_id: NodeId,
        gamma_id: NodeId,
        beta_id: NodeId,
        eps: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle =
            NodeHandle::new_instance_norm(&self.get_nodes(&[input_id, gamma_id, beta_id])?, eps)?;
        self.add_node_to_list(handle, name, "instance_norm", &[input_id, gamma_id, beta_id])
    }

    /// 创建批归一化节点（统计量始终按当前批次现算）
    pub fn new_batch_norm_node(
        &mut self,
        input_id: NodeId,
        gamma_id: NodeId,
        beta_id: NodeId,
        eps: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle =
            NodeHandle::new_batch_norm(&self.get_nodes(&[input_id, gamma_id, beta_id])?, eps)?;
        self.add_node_to_list(handle, name, "batch_norm", &[input_id, gamma_id, beta_id])
    }

    /// 创建局部响应归一化节点
    pub fn new_local_response_norm_node(
        &mut self,
        input_id: NodeId,
        depth_radius: usize,
        bias: f32,
        alpha: f32,
        beta: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_local_response_norm(
            &self.get_nodes(&[input_id])?,
            depth_radius,
            bias,
            alpha,
            beta,
        )?;
        self.add_node_to_list(handle, name, "lrn", &[input_id])
    }

    /// 创建 ReLU 节点（即 negative_slope 为 0 的 LeakyReLU）
    pub fn new_relu_node(
        &mut self,
        input_id: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_leaky_relu(&self.get_nodes(&[input_id])?, 0.0)?;
        self.add_node_to_list(handle, name, "relu", &[input_id])
    }

    /// 创建 LeakyReLU 节点
    pub fn new_leaky_relu_node(
        &mut self,
        input_id: NodeId,
        negative_slope: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_leaky_relu(&self.get_nodes(&[input_id])?, negative_slope)?;
        self.add_node_to_list(handle, name, "leaky_relu", &[input_id])
    }
}
