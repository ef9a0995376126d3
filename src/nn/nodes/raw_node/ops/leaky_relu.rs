use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

/// Leaky ReLU 激活函数节点
///
/// forward: f(x) = x if x > 0, else negative_slope * x
///
/// 当 negative_slope = 0 时，等价于标准 ReLU
/// （图的`new_relu_node`即以 slope 0 复用本节点）
#[derive(Clone)]
pub(in crate::nn) struct LeakyReLU {
    id: Option<NodeId>,
    name: Option<String>,
    value: Option<Tensor>,
    shape: Vec<usize>,
    /// 负半轴斜率，0.0 即标准 ReLU
    negative_slope: f32,
}

impl LeakyReLU {
    pub(in crate::nn) fn new(
        parents: &[&NodeHandle],
        negative_slope: f32,
    ) -> Result<Self, GraphError> {
        // 1. 必要的验证
        // 1.1 父节点数量验证
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "LeakyReLU节点只需要1个父节点".to_string(),
            ));
        }

        // 1.2 negative_slope 验证（通常应该是非负小数）
        if negative_slope < 0.0 {
            return Err(GraphError::InvalidOperation(format!(
                "LeakyReLU的negative_slope应为非负数，但得到: {negative_slope}"
            )));
        }

        // 2. 返回
        Ok(Self {
            id: None,
            name: None,
            value: None,
            shape: parents[0].value_expected_shape().to_vec(),
            negative_slope,
        })
    }
}

impl TraitNode for LeakyReLU {
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

    fn calc_value_by_parents(&mut self, parents: &[NodeHandle]) -> Result<(), GraphError> {
        // 1. 获取父节点的值
        let parent_value = parents[0].value().ok_or_else(|| {
            GraphError::ComputationError(format!(
                "{}的父节点{}没有值。不该触及本错误，否则说明crate代码有问题",
                self.display_node(),
                parents[0]
            ))
        })?;

        // 2. 计算 LeakyReLU: f(x) = x if x > 0, else negative_slope * x
        let slope = self.negative_slope;
        let result = parent_value.where_with_f32(
            |x| x > 0.0,
            |x| x,         // x > 0 时保持原值
            |x| slope * x, // x <= 0 时乘以 slope
        );
        self.value = Some(result);

        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }
}
