/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : 2D 卷积节点（NHWC、显式补零 + valid卷积）
 *
 * 设计决策：
 * - Batch-First 的 NHWC 格式：输入必须是 4D [batch, H, W, C_in]
 * - 卷积核格式：[kH, kW, C_in, C_out]（tensorflow约定，便于权重直接移植）
 * - 填充语义：先按`padding`对两个空间维对称补零，再做无隐式填充的valid卷积。
 *   某些框架的"SAME"自动填充在 k=3、stride=2、pad=1 这类偶数缩减时与
 *   另一些框架的结果不一致，显式补零保证输出尺寸在任何后端下逐位可复现。
 * - 支持空洞（dilation）卷积：有效感受野为 dilation*(k-1)+1
 * - 使用 Rayon 在 batch 维度并行加速
 *
 * 父节点：
 * - parents[0]: 输入数据
 * - parents[1]: 卷积核参数（Parameter 节点）
 */

use crate::nn::GraphError;
use crate::nn::nodes::raw_node::TraitNode;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;
use rayon::prelude::*;

/// 2D 卷积节点
#[derive(Clone)]
pub(in crate::nn) struct Conv2d {
    id: Option<NodeId>,
    name: Option<String>,
    value: Option<Tensor>,
    /// 输出的固定形状 [batch, H', W', C_out]
    shape: Vec<usize>,
    kernel_size: usize,
    stride: usize,
    padding: usize,
    dilation: usize,
}

/// 显式补零 + valid卷积的输出尺寸公式（本库所有卷积节点共用）
pub(super) fn conv_output_size(
    input: usize,
    kernel: usize,
    stride: usize,
    padding: usize,
    dilation: usize,
) -> Option<usize> {
    let effective_kernel = dilation * (kernel - 1) + 1;
    let padded = input + 2 * padding;
    if padded < effective_kernel {
        return None;
    }
    Some((padded - effective_kernel) / stride + 1)
}

impl Conv2d {
    /// 创建 Conv2d 节点
    ///
    /// # 参数
    /// - `parents`: [输入节点, 卷积核节点]
    /// - `stride`: 步长（两个空间维相同）
    /// - `padding`: 每侧补零的像素数（不是"same"开关）
    /// - `dilation`: 空洞率
    ///
    /// # 输入形状约定
    /// - 输入: [batch, H, W, `C_in`]
    /// - 卷积核: [kH, kW, `C_in`, `C_out`]，且 kH == kW
    pub(in crate::nn) fn new(
        parents: &[&NodeHandle],
        stride: usize,
        padding: usize,
        dilation: usize,
    ) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "Conv2d 节点需要 2 个父节点：[输入, 卷积核]".to_string(),
            ));
        }
        if stride == 0 || dilation == 0 {
            return Err(GraphError::InvalidOperation(format!(
                "Conv2d 的 stride 和 dilation 必须大于 0，得到 stride={stride}, dilation={dilation}"
            )));
        }

        let input_shape = parents[0].value_expected_shape();
        let kernel_shape = parents[1].value_expected_shape();

        // 2. 验证卷积核形状：必须是 4D [kH, kW, C_in, C_out] 且核为方形
        if kernel_shape.len() != 4 || kernel_shape[0] != kernel_shape[1] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: kernel_shape.to_vec(),
                message: format!("卷积核必须是方形的 4D [k, k, C_in, C_out]，得到 {kernel_shape:?}"),
            });
        }

        let kernel_size = kernel_shape[0];
        let in_channels = kernel_shape[2];
        let out_channels = kernel_shape[3];

        // 3. 验证输入形状：必须是 4D [batch, H, W, C_in]（NHWC）
        if input_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input_shape.to_vec(),
                message: format!(
                    "Conv2d 输入必须是 4D [batch, H, W, C_in]，得到 {input_shape:?}。单样本请使用 [1, H, W, C_in]"
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
                message: format!("输入通道数 {input_c} 与卷积核输入通道数 {in_channels} 不匹配"),
            });
        }

        // 5. 计算输出尺寸（显式补零 + valid卷积公式）
        let output_h = conv_output_size(input_h, kernel_size, stride, padding, dilation);
        let output_w = conv_output_size(input_w, kernel_size, stride, padding, dilation);
        let (output_h, output_w) = match (output_h, output_w) {
            (Some(h), Some(w)) if h > 0 && w > 0 => (h, w),
            _ => {
                return Err(GraphError::InvalidOperation(format!(
                    "卷积输出尺寸无效：输入 {input_h}x{input_w}，核 {kernel_size}x{kernel_size}，\
                     步长 {stride}，填充 {padding}，空洞率 {dilation}"
                )));
            }
        };

        // 6. 确定输出形状：始终是 4D [batch, H', W', C_out]
        let shape = vec![batch_size, output_h, output_w, out_channels];

        Ok(Self {
            id: None,
            name: None,
            value: None,
            shape,
            kernel_size,
            stride,
            padding,
            dilation,
        })
    }

    /// 对输入的空间维对称补零（Rayon 并行版本）
    /// 输入必须是 4D [batch, H, W, C]
    fn pad_input(&self, input: &Tensor) -> Tensor {
        pad_spatial(input, self.padding)
    }

    /// 执行valid卷积运算（Rayon 并行版本）
    /// 输入为已补零的 4D [batch, H, W, C_in]
    fn convolve(&self, input: &Tensor, kernel: &Tensor) -> Tensor {
        let input_shape = input.shape();
        let (batch_size, in_h, in_w, in_c) = (
            input_shape[0],
            input_shape[1],
            input_shape[2],
            input_shape[3],
        );
        let out_c = kernel.shape()[3];

        let k = self.kernel_size;
        let (stride, dilation) = (self.stride, self.dilation);
        let effective_kernel = dilation * (k - 1) + 1;
        let out_h = (in_h - effective_kernel) / stride + 1;
        let out_w = (in_w - effective_kernel) / stride + 1;

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
                        for oc in 0..out_c {
                            let mut sum = 0.0f32;
                            for kh in 0..k {
                                for kw in 0..k {
                                    let in_h_idx = h_start + kh * dilation;
                                    let in_w_idx = w_start + kw * dilation;
                                    for ic in 0..in_c {
                                        sum += input[[b, in_h_idx, in_w_idx, ic]]
                                            * kernel[[kh, kw, ic, oc]];
                                    }
                                }
                            }
                            let idx = (oh * out_w + ow) * out_c + oc;
                            sample_data[idx] = sum;
                        }
                    }
                }
                sample_data
            })
            .collect();

        // 合并结果
        let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
        Tensor::new(&all_data, &[batch_size, out_h, out_w, out_c])
    }
}

/// 对 NHWC 张量的两个空间维各补`padding`圈零（Rayon 并行版本）
pub(super) fn pad_spatial(input: &Tensor, padding: usize) -> Tensor {
    if padding == 0 {
        return input.clone();
    }

    let input_shape = input.shape();
    let (batch_size, h, w, c) = (input_shape[0], input_shape[1], input_shape[2], input_shape[3]);
    let new_h = h + 2 * padding;
    let new_w = w + 2 * padding;
    let single_sample_size = new_h * new_w * c;

    // Rayon 并行处理每个 batch 样本
    let batch_results: Vec<Vec<f32>> = (0..batch_size)
        .into_par_iter()
        .map(|bi| {
            let mut sample_data = vec![0.0f32; single_sample_size];
            for hi in 0..h {
                for wi in 0..w {
                    for ci in 0..c {
                        let idx = ((hi + padding) * new_w + (wi + padding)) * c + ci;
                        sample_data[idx] = input[[bi, hi, wi, ci]];
                    }
                }
            }
            sample_data
        })
        .collect();

    // 合并结果
    let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
    Tensor::new(&all_data, &[batch_size, new_h, new_w, c])
}

impl TraitNode for Conv2d {
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
        // 获取输入和卷积核
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

        // 先显式补零，再valid卷积
        let padded = self.pad_input(input);
        self.value = Some(self.convolve(&padded, kernel));

        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }
}
