/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : GraphInner 核心操作：参数注册表 + 前向传播
 */

use super::GraphInner;
use super::super::error::GraphError;
use crate::nn::NodeId;
use crate::nn::nodes::{NodeHandle, NodeType};
use crate::nn::var::Init;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;

impl GraphInner {
    // ========== 创建 ==========

    pub fn new() -> Self {
        Self::with_name("default_graph")
    }

    /// 创建一个带固定种子的计算图（确保参数初始化可重复）
    pub fn new_with_seed(seed: u64) -> Self {
        let mut graph = Self::with_name("default_graph");
        graph.rng = Some(StdRng::seed_from_u64(seed));
        graph
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: HashMap::new(),
            forward_edges: HashMap::new(),
            backward_edges: HashMap::new(),
            param_names: HashMap::new(),
            last_forward_pass_id: 0,
            next_id: 0,
            rng: None,
        }
    }

    // ========== 基础访问器 ==========

    /// 设置/重置图的随机种子
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = Some(StdRng::seed_from_u64(seed));
    }

    /// 检查图是否有固定种子
    pub const fn has_seed(&self) -> bool {
        self.rng.is_some()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub(in crate::nn) fn get_node(&self, id: NodeId) -> Result<&NodeHandle, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn get_node_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut NodeHandle, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(in crate::nn) fn get_nodes(&self, ids: &[NodeId]) -> Result<Vec<&NodeHandle>, GraphError> {
        ids.iter().map(|&id| self.get_node(id)).collect()
    }

    pub fn get_node_parents(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        // 先检查节点是否存在
        let _ = self.get_node(id)?;
        Ok(self.backward_edges.get(&id).cloned().unwrap_or_default())
    }

    pub fn get_node_children(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        // 先检查节点是否存在
        let _ = self.get_node(id)?;
        Ok(self.forward_edges.get(&id).cloned().unwrap_or_default())
    }

    pub fn get_node_name(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(self.get_node(id)?.name())
    }

    pub fn has_node_value(&self, node_id: NodeId) -> Result<bool, GraphError> {
        self.nodes
            .get(&node_id)
            .map(NodeHandle::has_value)
            .ok_or(GraphError::NodeNotFound(node_id))
    }

    pub fn get_node_value(&self, id: NodeId) -> Result<Option<&Tensor>, GraphError> {
        Ok(self.get_node(id)?.value())
    }

    pub fn set_node_value(&mut self, id: NodeId, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.get_node_mut(id)?.set_value(value)
    }

    pub fn get_node_value_expected_shape(&self, id: NodeId) -> Result<&[usize], GraphError> {
        Ok(self.get_node(id)?.value_expected_shape())
    }

    // ========== 参数注册表 ==========

    /// 声明一个参数（参数存储的唯一入口）
    ///
    /// # 语义
    /// - `override_value`存在时：参数的初始值就是该数组（形状必须与`shape`一致，
    ///   否则返回`ShapeMismatch`）——用于移植外部框架训练好的权重；
    /// - 否则：初始值由`init`按`shape`生成（图带种子时用图的RNG）；
    /// - 限定名已存在且形状一致：返回已有节点（幂等复用，检查点的正确恢复
    ///   依赖这一点），此时忽略`override_value`与`init`；
    /// - 限定名已存在但形状不一致：返回`NameCollision`。
    pub fn declare_parameter(
        &mut self,
        name: &str,
        shape: &[usize],
        init: &Init,
        override_value: Option<&Tensor>,
    ) -> Result<NodeId, GraphError> {
        // 1. 同名参数：复用或冲突
        if let Some(&existing_id) = self.param_names.get(name) {
            let existing_shape = self.get_node(existing_id)?.value_expected_shape();
            if existing_shape != shape {
                return Err(GraphError::NameCollision(format!(
                    "参数{name}已以形状{existing_shape:?}注册，无法以形状{shape:?}再次声明"
                )));
            }
            return Ok(existing_id);
        }

        // 2. 确定初始值
        let initial_value = match override_value {
            Some(tensor) => {
                if tensor.shape() != shape {
                    return Err(GraphError::ShapeMismatch {
                        expected: shape.to_vec(),
                        got: tensor.shape().to_vec(),
                        message: format!("参数{name}的外部初始值形状与声明不符"),
                    });
                }
                tensor.clone()
            }
            None => match self.rng {
                Some(ref mut rng) => init.generate_with_rng(shape, rng),
                None => init.generate(shape),
            },
        };

        // 3. 注册新参数节点
        let node = NodeHandle::new_parameter(shape)?;
        let node_id = self.add_node_to_list(node, Some(name), "parameter", &[])?;
        self.set_node_value(node_id, Some(&initial_value))?;
        self.param_names.insert(name.to_string(), node_id);
        Ok(node_id)
    }

    /// 按限定名查找参数节点
    pub fn get_parameter_by_name(&self, name: &str) -> Option<NodeId> {
        self.param_names.get(name).copied()
    }

    /// 所有参数的限定名（按字典序，便于确定性遍历）
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.param_names.keys().cloned().collect();
        names.sort();
        names
    }

    /// 已注册的参数数量
    pub fn parameters_count(&self) -> usize {
        self.param_names.len()
    }

    /// 获取所有可训练的参数节点
    pub fn get_trainable_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter_map(|(&id, node)| {
                if let NodeType::Parameter(_) = node.node_type() {
                    Some(id)
                } else {
                    None
                }
            })
            .collect()
    }

    // ========== ID/名称生成 ==========

    pub(in crate::nn::graph) fn generate_valid_node_id(&mut self) -> NodeId {
        // 生成唯一的节点ID（先递增再返回，所以第一个节点 ID 是 1）
        self.next_id += 1;
        NodeId(self.next_id)
    }

    pub(in crate::nn::graph) fn check_duplicate_node_name(&self, name: &str) -> Result<(), GraphError> {
        if self.nodes.values().any(|node| node.name() == name) {
            return Err(GraphError::DuplicateNodeName(format!(
                "{}（图：{}）",
                name,
                self.name()
            )));
        }
        Ok(())
    }

    pub(in crate::nn::graph) fn generate_valid_new_node_name(
        &self,
        base_name: &str,
        node_type: &str,
    ) -> Result<String, GraphError> {
        if !base_name.is_empty() {
            self.check_duplicate_node_name(base_name)?;
            return Ok(base_name.to_string());
        }

        let mut counter = 1;
        loop {
            let name = format!("{node_type}_{counter}");
            if self.check_duplicate_node_name(&name).is_ok() {
                return Ok(name);
            }
            counter += 1;
        }
    }

    // ========== 前向传播 ==========

    pub fn forward(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let node = self.get_node(node_id)?;
        match node.node_type() {
            NodeType::Input(_) | NodeType::Parameter(_) => {
                if node.has_value() {
                    return Ok(());
                }
                return Err(GraphError::InvalidOperation(format!(
                    "{node}是输入/参数类型，其值应通过 set_value 设置，而非通过父节点前向传播计算"
                )));
            }
            _ => {}
        }

        let new_graph_forward_pass_id = self.last_forward_pass_id + 1;
        self.forward_node_internal(node_id, new_graph_forward_pass_id)?;
        self.last_forward_pass_id = new_graph_forward_pass_id;
        Ok(())
    }

    fn forward_node_internal(
        &mut self,
        node_id: NodeId,
        new_graph_forward_pass_id: u64,
    ) -> Result<(), GraphError> {
        let node = self.get_node_mut(node_id)?;

        match node.node_type() {
            NodeType::Input(_) | NodeType::Parameter(_) => {
                if node.has_value() {
                    node.set_last_forward_pass_id(new_graph_forward_pass_id);
                    return Ok(());
                }
                return Err(GraphError::InvalidOperation(format!(
                    "{node}不能直接前向传播"
                )));
            }
            _ => {
                if node.last_forward_pass_id() == new_graph_forward_pass_id {
                    return Ok(());
                }
            }
        }

        let parents_ids = self.get_node_parents(node_id)?;
        for parent_id in &parents_ids {
            self.forward_node_internal(*parent_id, new_graph_forward_pass_id)?;
        }

        let parent_nodes = parents_ids
            .iter()
            .map(|id| self.get_node(*id).unwrap().clone())
            .collect::<Vec<NodeHandle>>();

        let node = self.get_node_mut(node_id)?;
        node.calc_value_by_parents(&parent_nodes)?;
        node.set_last_forward_pass_id(new_graph_forward_pass_id);

        Ok(())
    }
}
