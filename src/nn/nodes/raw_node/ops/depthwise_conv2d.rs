/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 深度（depthwise）2D 卷积节点（NHWC、显式补零 + valid卷积）
 *
 * 与普通卷积的区别：每个输入通道各自用自己的`chs_mult`个滤波器独立卷积，
 * 不做跨通道求和。输出通道数恒为 C_in * chs_mult，与图中其它地方要求的
 * 输出通道数无关。输出通道排布与tensorflow一致：c_out = ic * chs_mult + m。
 *
 * 父节点：
 * - parents[0]: 输入数据
 * - parents[1]: 卷积核参数 [kH, kW, C_in, chs_mult]
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;
use rayon::prelude::*;

use super::conv2d::{conv_output_size, pad_spatial};

/// 深度2D卷积节点
#[derive(Clone)]
pub(in crate::nn) struct DepthwiseConv2d {
    id: Option<NodeId>,
    name: Option<String>,
    value: Option<Tensor>,
    /// 输出的固定形状 [batch, H', W', C_in * chs_mult]
    shape: Vec<usize>,
    kernel_size: usize,
    stride: usize,
    padding: usize,
    dilation: usize,
    channel_multiplier: usize,
}

impl DepthwiseConv2d {
    /// 创建 DepthwiseConv2d 节点
    ///
    /// # 参数
    /// - `parents`: [输入节点, 卷积核节点]
    /// - `stride`/`padding`/`dilation`: 同 Conv2d
    ///
    /// # 输入形状约定
    /// - 输入: [batch, H, W, `C_in`]
    /// - 卷积核: [kH, kW, `C_in`, `chs_mult`]，且 kH == kW
    pub(in crate::nn) fn new(
        parents: &[&NodeHandle],
        stride: usize,
        padding: usize,
        dilation: usize,
    ) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "DepthwiseConv2d 节点需要 2 个父节点：[输入, 卷积核]".to_string(),
            ));
        }
        if stride == 0 || dilation == 0 {
            return Err(GraphError::InvalidOperation(format!(
                "DepthwiseConv2d 的 stride 和 dilation 必须大于 0，得到 stride={stride}, dilation={dilation}"
            )));
        }

        let input_shape = parents[0].value_expected_shape();
        let kernel_shape = parents[1].value_expected_shape();

        // 2. 验证卷积核形状：4D [k, k, C_in, chs_mult] 且核为方形
        if kernel_shape.len() != 4 || kernel_shape[0] != kernel_shape[1] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: kernel_shape.to_vec(),
                message: format!(
                    "深度卷积核必须是方形的 4D [k, k, C_in, chs_mult]，得到 {kernel_shape:?}"
                ),
            });
        }

        let kernel_size = kernel_shape[0];
        let in_channels = kernel_shape[2];
        let channel_multiplier = kernel_shape[3];

        // 3. 验证输入形状：4D [batch, H, W, C_in]（NHWC）
        if input_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input_shape.to_vec(),
                message: format!(
                    "DepthwiseConv2d 输入必须是 4D [batch, H, W, C_in]，得到 {input_shape:?}"
                ),
            });
        }
        let (batch_size, input_h, input_w, input_c) = (
            input_shape[0],
            input_shape[1],
            input_shape[2],
            input_shape[3],
        );

        // 4. 验证通道数匹配
        if input_c != in_channels {
            return Err(GraphError::ShapeMismatch {
                expected: vec![in_channels],
                got: vec![input_c],
                message: format!(
                    "输入通道数 {input_c} 与深度卷积核输入通道数 {in_channels} 不匹配"
                ),
            });
        }

        // 5. 计算输出尺寸
        let output_h = conv_output_size(input_h, kernel_size, stride, padding, dilation);
        let output_w = conv_output_size(input_w, kernel_size, stride, padding, dilation);
        let (output_h, output_w) = match (output_h, output_w) {
            (Some(h), Some(w)) if h > 0 && w > 0 => (h, w),
            _ => {
                return Err(GraphError::InvalidOperation(format!(
                    "深度卷积输出尺寸无效：输入 {input_h}x{input_w}，核 {kernel_size}x{kernel_size}，\
                     步长 {stride}，填充 {padding}，空洞率 {dilation}"
                )));
            }
        };

        // 6. 输出形状 [batch, H', W', C_in * chs_mult]：无跨通道混合
        let shape = vec![
            batch_size,
            output_h,
            output_w,
            in_channels * channel_multiplier,
        ];

        Ok(Self {
            id: None,
            name: None,
            value: None,
            shape,
            kernel_size,
            stride,
            padding,
            dilation,
            channel_multiplier,
        })
    }

    /// 执行逐通道valid卷积（Rayon 并行版本）
    fn convolve(&self, input: &Tensor, kernel: &Tensor) -> Tensor {
        let input_shape = input.shape();
        let (batch_size, in_h, in_w, in_c) = (
            input_shape[0],
            input_shape[1],
            input_shape[2],
            input_shape[3],
        );

        let k = self.kernel_size;
        let (stride, dilation, mult) = (self.stride, self.dilation, self.channel_multiplier);
        let effective_kernel = dilation * (k - 1) + 1;
        let out_h = (in_h - effective_kernel) / stride + 1;
        let out_w = (in_w - effective_kernel) / stride + 1;
        let out_c = in_c * mult;

        let single_sample_size = out_h * out_w * out_c;

        // Rayon 并行计算每个 batch 样本
        let batch_results: Vec<Vec<f32>> = (0..batch_size)
            .into_par_iter()
            .map(|b| {
                let mut sample_data = vec![0.0f32; single_sample_size];
                for oh in 0..out_h {
                    for ow in 0..out_w {
                        let h_start = oh * stride;
                        let w_start = ow * stride;
                        for ic in 0..in_c {
                            for m in 0..mult {
                                let mut sum = 0.0f32;
                                for kh in 0..k {
                                    for kw in 0..k {
                                        sum += input
                                            [[b, h_start + kh * dilation, w_start + kw * dilation, ic]]
                                            * kernel[[kh, kw, ic, m]];
                                    }
                                }
                                // tensorflow的通道排布：c_out = ic * mult + m
                                let idx = (oh * out_w + ow) * out_c + ic * mult + m;
                                sample_data[idx] = sum;
                            }
                        }
                    }
                }
                sample_data
            })
            .collect();

        let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
        Tensor::new(&all_data, &[batch_size, out_h, out_w, out_c])
    }
}

impl TraitNode for DepthwiseConv2d {
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

        let kernel = parents[1].value().ok_or_else(|| {
            GraphError::ComputationError(format!(
                "{}的卷积核父{}没有值",
                self.display_node(),
                parents[1]
            ))
        })?;

        // 先显式补零，再逐通道valid卷积
        let padded = pad_spatial(input, self.padding);
        self.value = Some(self.convolve(&padded, kernel));

        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }
}
