/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 批归一化（batch normalization）节点
 *
 * 统计量在 batch 轴和两个空间轴（0、1、2）上联合计算，跨整个批次共享。
 *
 * WARNING: 对抗训练（GAN）里batchnorm的行为与普通网络不同！
 * WARNING: 本节点刻意不维护滑动均值/方差——每次求值（无论训练还是推理）
 * 都用当前批次现算统计量。这是设计决定而非遗漏：不要给本节点加回
 * 推理态的 running mean/var。
 *
 * 父节点：
 * - parents[0]: 输入数据 [batch, H, W, C]
 * - parents[1]: gamma 参数 [C]
 * - parents[2]: beta 参数 [C]
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

use super::instance_norm::check_norm_parents;

#[derive(Clone)]
pub(in crate::nn) struct BatchNorm {
    id: Option<NodeId>,
    name: Option<String>,
    value: Option<Tensor>,
    shape: Vec<usize>,
    eps: f32,
}

impl BatchNorm {
    pub(in crate::nn) fn new(parents: &[&NodeHandle], eps: f32) -> Result<Self, GraphError> {
        let shape = check_norm_parents("BatchNorm", parents)?;

        if eps <= 0.0 {
            return Err(GraphError::InvalidOperation(format!(
                "BatchNorm 的 eps 必须大于 0，得到 {eps}"
            )));
        }

        Ok(Self {
            id: None,
            name: None,
            value: None,
            shape,
            eps,
        })
    }
}

impl TraitNode for BatchNorm {
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
        let gamma = parents[1].value().ok_or_else(|| {
            GraphError::ComputationError(format!(
                "{}的gamma父{}没有值",
                self.display_node(),
                parents[1]
            ))
        })?;
        let beta = parents[2].value().ok_or_else(|| {
            GraphError::ComputationError(format!(
                "{}的beta父{}没有值",
                self.display_node(),
                parents[2]
            ))
        })?;

        // 统计量在 batch + 空间轴（0、1、2）上联合归约，每次求值现算
        let mean = input.mean_axes_keepdims(&[0, 1, 2]);
        let variance = input.var_axes_keepdims(&[0, 1, 2]);

        let normalized = (input - &mean) / &(variance + self.eps).sqrt();
        self.value = Some(normalized * gamma + beta);

        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }
}
