/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 逐通道偏置相加节点
 *
 * 把 1D 偏置 [C] 广播加到 NHWC 输入的通道维上。
 *
 * 父节点：
 * - parents[0]: 输入数据 [batch, H, W, C]
 * - parents[1]: 偏置参数 [C]
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct ChannelBiasAdd {
    id: Option<NodeId>,
    name: Option<String>,
    value: Option<Tensor>,
    shape: Vec<usize>,
}

impl ChannelBiasAdd {
    pub(in crate::nn) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "ChannelBiasAdd 节点需要 2 个父节点：[输入, 偏置]".to_string(),
            ));
        }

        let input_shape = parents[0].value_expected_shape();
        let bias_shape = parents[1].value_expected_shape();

        // 2. 验证形状：输入 4D NHWC，偏置 1D 且长度等于通道数
        if input_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input_shape.to_vec(),
                message: format!(
                    "ChannelBiasAdd 输入必须是 4D [batch, H, W, C]，得到 {input_shape:?}"
                ),
            });
        }
        if bias_shape.len() != 1 || bias_shape[0] != input_shape[3] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![input_shape[3]],
                got: bias_shape.to_vec(),
                message: "偏置必须是 1D [C]，且长度等于输入的通道数".to_string(),
            });
        }

        Ok(Self {
            id: None,
            name: None,
            value: None,
            shape: input_shape.to_vec(),
        })
    }
}

impl TraitNode for ChannelBiasAdd {
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
        let input = parents[0].value().ok_or_else(|| {
            GraphError::ComputationError(format!(
                "{}的输入父{}没有值",
                self.display_node(),
                parents[0]
            ))
        })?;

        let bias = parents[1].value().ok_or_else(|| {
            GraphError::ComputationError(format!(
                "{}的偏置父{}没有值",
                self.display_node(),
                parents[1]
            ))
        })?;

        // [batch, H, W, C] + [C]：NumPy风格右对齐广播
        self.value = Some(input + bias);

        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }
}
