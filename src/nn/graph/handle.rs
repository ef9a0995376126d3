/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : Graph 句柄（用户级 API）
 */

use super::error::GraphError;
use super::inner::GraphInner;
use crate::nn::NodeId;
use crate::nn::var::{Init, Var};
use crate::tensor::Tensor;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Graph - 计算图句柄
///
/// # 设计原则
/// - 是 `Rc<RefCell<GraphInner>>` 的薄封装
/// - Clone 语义：多个 Graph 引用同一个 GraphInner
/// - 创建的 Var 自动持有图引用
/// - 参数注册表随图存亡：想要多个模型共存，各建各的图即可
#[derive(Clone)]
pub struct Graph {
    inner: Rc<RefCell<GraphInner>>,
}

impl Graph {
    // ==================== 创建 ====================

    /// 创建新图
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(GraphInner::new())),
        }
    }

    /// 创建带种子的图（参数初始化可重复）
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GraphInner::new_with_seed(seed))),
        }
    }

    /// 从现有 GraphInner 创建句柄
    pub fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// 从现有 Rc 创建句柄
    pub(crate) const fn from_rc(inner: Rc<RefCell<GraphInner>>) -> Self {
        Self { inner }
    }

    /// 获取内部 GraphInner 的不可变引用
    pub fn inner(&self) -> std::cell::Ref<'_, GraphInner> {
        self.inner.borrow()
    }

    /// 获取内部 GraphInner 的可变引用
    pub fn inner_mut(&self) -> std::cell::RefMut<'_, GraphInner> {
        self.inner.borrow_mut()
    }

    /// 将 NodeId 包装成 Var
    pub fn wrap_node_id(&self, node_id: NodeId) -> Var {
        Var::new(node_id, Rc::clone(&self.inner))
    }

    // ==================== 创建变量 ====================

    /// 创建输入节点并设置数据
    pub fn input(&self, data: &Tensor) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let node_id = g.new_input_node(data.shape(), None)?;
        g.set_node_value(node_id, Some(data))?;
        Ok(Var::new(node_id, Rc::clone(&self.inner)))
    }

    /// 创建命名输入节点
    pub fn input_named(&self, data: &Tensor, name: &str) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let node_id = g.new_input_node(data.shape(), Some(name))?;
        g.set_node_value(node_id, Some(data))?;
        Ok(Var::new(node_id, Rc::clone(&self.inner)))
    }

    /// 创建带形状的输入节点（值随后用 `Var::set_value` 喂入）
    pub fn input_shape(&self, shape: &[usize], name: Option<&str>) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let node_id = g.new_input_node(shape, name)?;
        Ok(Var::new(node_id, Rc::clone(&self.inner)))
    }

    /// 声明参数（参数存储的完整契约，见 `GraphInner::declare_parameter`）
    ///
    /// - `override_value` 存在：初始值即该数组（形状须与 `shape` 一致），
    ///   用于移植外部框架训练好的权重；
    /// - 同限定名、同形状的再次声明返回同一个参数（幂等复用）；
    /// - 同限定名、不同形状返回 `NameCollision`。
    pub fn declare_parameter(
        &self,
        shape: &[usize],
        init: Init,
        override_value: Option<&Tensor>,
        name: &str,
    ) -> Result<Var, GraphError> {
        let mut g = self.inner.borrow_mut();
        let node_id = g.declare_parameter(name, shape, &init, override_value)?;
        Ok(Var::new(node_id, Rc::clone(&self.inner)))
    }

    /// 创建参数节点（无外部初始值的便捷形式）
    pub fn parameter(&self, shape: &[usize], init: Init, name: &str) -> Result<Var, GraphError> {
        self.declare_parameter(shape, init, None, name)
    }

    // ==================== 执行 ====================

    /// 前向传播
    pub fn forward(&self, output: &Var) -> Result<(), GraphError> {
        self.inner.borrow_mut().forward(output.node_id())
    }

    // ==================== 参数检查点 ====================

    /// 保存所有参数（按限定名）到二进制文件
    pub fn save_params<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        self.inner.borrow().save_params(path)
    }

    /// 从二进制文件按限定名恢复参数
    pub fn load_params<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        self.inner.borrow_mut().load_params(path)
    }

    /// 所有参数的限定名（字典序）
    pub fn parameter_names(&self) -> Vec<String> {
        self.inner.borrow().parameter_names()
    }

    /// 按限定名取参数 Var
    pub fn get_parameter(&self, name: &str) -> Option<Var> {
        let node_id = self.inner.borrow().get_parameter_by_name(name)?;
        Some(Var::new(node_id, Rc::clone(&self.inner)))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
