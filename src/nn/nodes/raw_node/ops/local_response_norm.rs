/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 局部响应归一化（local response normalization）节点
 *
 * 跨通道模式：对每个位置，在通道维的 [c-r, c+r] 窗口内求平方和，
 * output = input / (bias + alpha * sqr_sum) ^ beta
 * 与 tf.nn.lrn 语义一致（其默认 depth_radius=5, alpha=1, beta=0.5）。
 * 无可学习参数。
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

#[derive(Clone)]
pub(in crate::nn) struct LocalResponseNorm {
    id: Option<NodeId>,
    name: Option<String>,
    value: Option<Tensor>,
    shape: Vec<usize>,
    depth_radius: usize,
    bias: f32,
    alpha: f32,
    beta: f32,
}

impl LocalResponseNorm {
    pub(in crate::nn) fn new(
        parents: &[&NodeHandle],
        depth_radius: usize,
        bias: f32,
        alpha: f32,
        beta: f32,
    ) -> Result<Self, GraphError> {
        // 1. 必要的验证
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "LocalResponseNorm节点只需要1个父节点".to_string(),
            ));
        }

        let input_shape = parents[0].value_expected_shape();
        if input_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input_shape.to_vec(),
                message: format!(
                    "LocalResponseNorm 输入必须是 4D [batch, H, W, C]，得到 {input_shape:?}"
                ),
            });
        }

        if bias <= 0.0 {
            return Err(GraphError::InvalidOperation(format!(
                "LocalResponseNorm 的 bias 必须大于 0，得到 {bias}"
            )));
        }

        // 2. 返回
        Ok(Self {
            id: None,
            name: None,
            value: None,
            shape: input_shape.to_vec(),
            depth_radius,
            bias,
            alpha,
            beta,
        })
    }
}

impl TraitNode for LocalResponseNorm {
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
                "{}的父节点{}没有值",
                self.display_node(),
                parents[0]
            ))
        })?;

        let shape = input.shape();
        let (batch_size, h, w, c) = (shape[0], shape[1], shape[2], shape[3]);
        let (radius, bias, alpha, beta) = (self.depth_radius, self.bias, self.alpha, self.beta);

        let mut output = vec![0.0f32; input.size()];
        for b in 0..batch_size {
            for hi in 0..h {
                for wi in 0..w {
                    for ci in 0..c {
                        // 通道维的 [ci-radius, ci+radius] 窗口（边界截断）
                        let lo = ci.saturating_sub(radius);
                        let hi_c = (ci + radius + 1).min(c);
                        let mut sqr_sum = 0.0f32;
                        for cj in lo..hi_c {
                            let v = input[[b, hi, wi, cj]];
                            sqr_sum += v * v;
                        }
                        let idx = ((b * h + hi) * w + wi) * c + ci;
                        output[idx] =
                            input[[b, hi, wi, ci]] / (bias + alpha * sqr_sum).powf(beta);
                    }
                }
            }
        }

        self.value = Some(Tensor::new(&output, shape));

        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }
}
