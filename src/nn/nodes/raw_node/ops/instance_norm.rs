/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 实例归一化（instance normalization）节点
 *
 * 统计量按"每个样本、每个通道"独立计算：只在两个空间轴（H、W）上归约，
 * batch轴互不影响。归一化后施加仿射变换 gamma * x̂ + beta。
 * 除两个可学习的仿射参数外无任何跨调用状态（没有滑动统计量）。
 *
 * 零方差的常数输入：x̂ 为 0/sqrt(eps) = 0，输出恰为 beta，不会产生 NaN/Inf。
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

#[derive(Clone)]
pub(in crate::nn) struct InstanceNorm {
    id: Option<NodeId>,
    name: Option<String>,
    value: Option<Tensor>,
    shape: Vec<usize>,
    eps: f32,
}

/// 归一化节点共用的父节点形状验证：[输入4D, gamma[C], beta[C]]
pub(super) fn check_norm_parents(
    op_name: &str,
    parents: &[&NodeHandle],
) -> Result<Vec<usize>, GraphError> {
    if parents.len() != 3 {
        return Err(GraphError::InvalidOperation(format!(
            "{op_name} 节点需要 3 个父节点：[输入, gamma, beta]"
        )));
    }

    let input_shape = parents[0].value_expected_shape();
    if input_shape.len() != 4 {
        return Err(GraphError::ShapeMismatch {
            expected: vec![0, 0, 0, 0],
            got: input_shape.to_vec(),
            message: format!("{op_name} 输入必须是 4D [batch, H, W, C]，得到 {input_shape:?}"),
        });
    }

    let channels = input_shape[3];
    for (affine_name, parent) in [("gamma", parents[1]), ("beta", parents[2])] {
        let affine_shape = parent.value_expected_shape();
        if affine_shape != [channels] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![channels],
                got: affine_shape.to_vec(),
                message: format!("{op_name} 的 {affine_name} 必须是 1D [C]，C 为输入通道数"),
            });
        }
    }

    Ok(input_shape.to_vec())
}

impl InstanceNorm {
    pub(in crate::nn) fn new(parents: &[&NodeHandle], eps: f32) -> Result<Self, GraphError> {
        let shape = check_norm_parents("InstanceNorm", parents)?;

        if eps <= 0.0 {
            return Err(GraphError::InvalidOperation(format!(
                "InstanceNorm 的 eps 必须大于 0，得到 {eps}"
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

impl TraitNode for InstanceNorm {
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

        // 统计量只在空间轴（1、2）上归约，keepdims便于广播
        let mean = input.mean_axes_keepdims(&[1, 2]);
        let variance = input.var_axes_keepdims(&[1, 2]);

        let normalized = (input - &mean) / &(variance + self.eps).sqrt();
        // gamma/beta 为 [C]，与 [batch, H, W, C] 右对齐广播
        self.value = Some(normalized * gamma + beta);

        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }
}
