/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : Graph 模块的错误类型
 *
 * 三类面向调用者的构图期错误：
 * - `ConfigurationError`: 复合块收到长度不符的初始化参数列表
 * - `ShapeMismatch`: 外部初始值/父节点的形状与声明不符
 * - `NameCollision`: 限定名已以不兼容的形状注册
 * 其余变体属于图内部管线（父节点缺值、文件读写等）。
 * 构图错误一律不可恢复：带着定位到作用域路径的诊断信息中止构图。
 */

use crate::nn::NodeId;
use thiserror::Error;

/// Graph 操作错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("节点{0:?}不存在")]
    NodeNotFound(NodeId),
    #[error("无效操作：{0}")]
    InvalidOperation(String),
    #[error("形状不一致：预期{expected:?}，实际{got:?}。{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    #[error("参数名冲突：{0}")]
    NameCollision(String),
    #[error("配置错误：{0}")]
    ConfigurationError(String),
    #[error("计算错误：{0}")]
    ComputationError(String),
    #[error("节点名{0}在图中重复")]
    DuplicateNodeName(String),
}
