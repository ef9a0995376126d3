/*
 * @Author       : 老董
 * @Date         : 2026-02-13
 * @Description  : Conv2d 节点单元测试
 *
 * 测试策略：
 * 1. 形状推导（显式补零 + valid卷积公式）
 * 2. 前向传播数值
 * 3. 各种参数组合（stride、padding、dilation）与非法配置
 */

use crate::assert_err;
use crate::nn::{GraphError, GraphInner};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

// ==================== 形状推导 ====================

/// 奇数核 + pad=(k-1)/2 + stride 1 时输出尺寸不变（等尺寸不变量）
#[test]
fn test_conv2d_odd_kernel_same_size() -> Result<(), GraphError> {
    for k in [1usize, 3, 5, 7] {
        let mut graph = GraphInner::new();
        let input = graph.new_input_node(&[1, 9, 9, 2], Some("input"))?;
        let kernel = graph.new_input_node(&[k, k, 2, 4], Some("kernel"))?;

        let pad = (k - 1) / 2;
        let conv = graph.new_conv2d_node(input, kernel, 1, pad, 1, Some("conv"))?;

        let output_shape = graph.get_node(conv)?.value_expected_shape();
        assert_eq!(output_shape, &[1, 9, 9, 4], "k={k} 时等尺寸不变量被破坏");
    }
    Ok(())
}

/// k=3、stride=2、pad=1 的偶数缩减：输出 = ceil(H/2)，
/// 必须与“显式补零 + valid卷积”公式一致，而不是某个后端的自动填充公式
#[test]
fn test_conv2d_stride2_reduction() -> Result<(), GraphError> {
    for (h, expected) in [(7usize, 4usize), (8, 4), (9, 5), (28, 14), (35, 18)] {
        let mut graph = GraphInner::new();
        let input = graph.new_input_node(&[1, h, h, 1], Some("input"))?;
        let kernel = graph.new_input_node(&[3, 3, 1, 1], Some("kernel"))?;

        let conv = graph.new_conv2d_node(input, kernel, 2, 1, 1, Some("conv"))?;

        let output_shape = graph.get_node(conv)?.value_expected_shape();
        assert_eq!(
            output_shape,
            &[1, expected, expected, 1],
            "H={h} 时 stride-2 缩减尺寸错误"
        );
    }
    Ok(())
}

/// k=5、stride=2、pad=2：35 -> 18（(35+4-4-1)/2+1）
#[test]
fn test_conv2d_k5_stride2() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_input_node(&[2, 35, 35, 3], Some("input"))?;
    let kernel = graph.new_input_node(&[5, 5, 3, 30], Some("kernel"))?;

    let conv = graph.new_conv2d_node(input, kernel, 2, 2, 1, Some("conv"))?;

    let output_shape = graph.get_node(conv)?.value_expected_shape();
    assert_eq!(output_shape, &[2, 18, 18, 30]);
    Ok(())
}

// ==================== 前向传播 ====================

/// 最简单的valid卷积：全1输入、全1核，每个输出位置 = 窗口求和
#[test]
fn test_conv2d_forward_simple() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 3, 3, 1], Some("input"))?;
    let kernel = graph.new_input_node(&[2, 2, 1, 1], Some("kernel"))?;
    let conv = graph.new_conv2d_node(input, kernel, 1, 0, 1, Some("conv"))?;

    graph.set_node_value(input, Some(&Tensor::ones(&[1, 3, 3, 1])))?;
    graph.set_node_value(kernel, Some(&Tensor::ones(&[2, 2, 1, 1])))?;

    graph.forward(conv)?;

    let output = graph.get_node_value(conv)?.unwrap();
    assert_eq!(output.shape(), &[1, 2, 2, 1]);
    for hi in 0..2 {
        for wi in 0..2 {
            assert_abs_diff_eq!(output[[0, hi, wi, 0]], 4.0, epsilon = 1e-6);
        }
    }

    Ok(())
}

/// 带补零的卷积：中心窗口满、角落窗口只有4个非零
#[test]
fn test_conv2d_forward_with_padding() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 3, 3, 1], Some("input"))?;
    let kernel = graph.new_input_node(&[3, 3, 1, 1], Some("kernel"))?;
    let conv = graph.new_conv2d_node(input, kernel, 1, 1, 1, Some("conv"))?;

    graph.set_node_value(input, Some(&Tensor::ones(&[1, 3, 3, 1])))?;
    graph.set_node_value(kernel, Some(&Tensor::ones(&[3, 3, 1, 1])))?;

    graph.forward(conv)?;

    let output = graph.get_node_value(conv)?.unwrap();
    assert_eq!(output.shape(), &[1, 3, 3, 1]);
    // 中心位置：3x3 窗口全部有值，sum = 9
    assert_abs_diff_eq!(output[[0, 1, 1, 0]], 9.0, epsilon = 1e-6);
    // 角落位置：只有 2x2 区域有值（其余被补零填充），sum = 4
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 4.0, epsilon = 1e-6);

    Ok(())
}

/// 跨通道求和：两个输入通道的贡献叠加
#[test]
fn test_conv2d_forward_sums_over_channels() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 1, 1, 2], Some("input"))?;
    let kernel = graph.new_input_node(&[1, 1, 2, 1], Some("kernel"))?;
    let conv = graph.new_conv2d_node(input, kernel, 1, 0, 1, Some("conv"))?;

    // 输入通道 [2, 3]，核权重 [10, 100] -> 输出 2*10 + 3*100 = 320
    graph.set_node_value(input, Some(&Tensor::new(&[2.0, 3.0], &[1, 1, 1, 2])))?;
    graph.set_node_value(kernel, Some(&Tensor::new(&[10.0, 100.0], &[1, 1, 2, 1])))?;

    graph.forward(conv)?;

    let output = graph.get_node_value(conv)?.unwrap();
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 320.0, epsilon = 1e-4);

    Ok(())
}

/// 空洞卷积：k=3、dilation=2 的有效感受野为5
#[test]
fn test_conv2d_forward_with_dilation() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 5, 5, 1], Some("input"))?;
    let kernel = graph.new_input_node(&[3, 3, 1, 1], Some("kernel"))?;
    let conv = graph.new_conv2d_node(input, kernel, 1, 0, 2, Some("conv"))?;

    // (5 - (2*2+1))/1 + 1 = 1
    assert_eq!(graph.get_node(conv)?.value_expected_shape(), &[1, 1, 1, 1]);

    graph.set_node_value(input, Some(&Tensor::ones(&[1, 5, 5, 1])))?;
    graph.set_node_value(kernel, Some(&Tensor::ones(&[3, 3, 1, 1])))?;

    graph.forward(conv)?;

    // 9 个采样点（间隔2）各贡献 1
    let output = graph.get_node_value(conv)?.unwrap();
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 9.0, epsilon = 1e-6);

    Ok(())
}

// ==================== 非法配置 ====================

/// 输入通道数与卷积核不匹配是构图期错误
#[test]
fn test_conv2d_channel_mismatch() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 5, 5, 2], Some("input"))?;
    let kernel = graph.new_input_node(&[3, 3, 1, 1], Some("kernel"))?;

    let result = graph.new_conv2d_node(input, kernel, 1, 0, 1, Some("conv"));
    assert_err!(result, GraphError::ShapeMismatch { .. });

    Ok(())
}

/// 输出尺寸会缩为零的配置是构图期错误
#[test]
fn test_conv2d_invalid_output_size() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 2, 2, 1], Some("input"))?;
    let kernel = graph.new_input_node(&[3, 3, 1, 1], Some("kernel"))?;

    let result = graph.new_conv2d_node(input, kernel, 1, 0, 1, Some("conv"));
    assert_err!(result, GraphError::InvalidOperation { .. });

    Ok(())
}

/// 非4D输入直接拒绝
#[test]
fn test_conv2d_requires_4d_input() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[5, 5, 2], Some("input"))?;
    let kernel = graph.new_input_node(&[3, 3, 2, 4], Some("kernel"))?;

    let result = graph.new_conv2d_node(input, kernel, 1, 1, 1, Some("conv"));
    assert_err!(result, GraphError::ShapeMismatch { .. });

    Ok(())
}
