use crate::nn::{GraphError, NodeId};
use crate::tensor::Tensor;

use super::{NodeHandle, TraitNode};

/// 参数节点 - 可训练张量
///
/// 初始值由图的`declare_parameter`统一设置（默认初始化器或外部注入的数组），
/// 节点本身不自带随机初始化。检查点恢复时同样经`set_value`按限定名写回。
#[derive(Clone)]
pub(in crate::nn) struct Parameter {
    id: Option<NodeId>,
    name: Option<String>,
    value: Option<Tensor>,
    shape: Vec<usize>,
}

impl Parameter {
    pub(in crate::nn) fn new(shape: &[usize]) -> Result<Self, GraphError> {
        // 1. 必要的验证：支持 1D-4D 张量
        // - 1D: 归一化的 gamma/beta [C]、卷积偏置 [C_out]
        // - 4D: 卷积核 [kH, kW, C_in, C_out]（NHWC约定）
        if shape.is_empty() || shape.len() > 4 {
            return Err(GraphError::InvalidOperation(format!(
                "参数张量必须是 1-4 维（支持偏置/归一化参数和卷积核），但收到的维度是 {} 维",
                shape.len(),
            )));
        }

        // 2. 返回
        Ok(Self {
            id: None,
            name: None,
            value: None,
            shape: shape.to_vec(),
        })
    }
}

impl TraitNode for Parameter {
    fn id(&self) -> NodeId {
        self.id.unwrap()
    }

    fn set_id(&mut self, id: NodeId) {
        self.id = Some(id);
    }

    fn name(&self) -> &str {
        self.name.as_ref().unwrap()
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, _parents: &[NodeHandle]) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(format!(
            "{}被执行了前向传播。不该触及本错误，否则说明crate代码有问题",
            self.display_node()
        )))
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        if let Some(tensor) = value {
            if tensor.shape() != self.shape.as_slice() {
                return Err(GraphError::ShapeMismatch {
                    expected: self.shape.clone(),
                    got: tensor.shape().to_vec(),
                    message: format!("参数{}的值形状与声明不符", self.display_node()),
                });
            }
        }
        self.value = value.cloned();
        Ok(())
    }
}
