/*
 * @Author       : 老董
 * @Date         : 2026-02-13
 * @Description  : DepthwiseConv2d 节点单元测试
 *
 * 重点验证“无跨通道混合”：输出通道数恒为 C_in * chs_mult，
 * 且每个输出通道只看得到自己对应的输入通道。
 */

use crate::assert_err;
use crate::nn::{GraphError, GraphInner};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

/// chs_mult=1 时输出通道数恒等于输入通道数
#[test]
fn test_dwise_conv2d_channel_count_mult1() -> Result<(), GraphError> {
    for in_chs in [1usize, 3, 8] {
        let mut graph = GraphInner::new();
        let input = graph.new_input_node(&[1, 5, 5, in_chs], Some("input"))?;
        let kernel = graph.new_input_node(&[3, 3, in_chs, 1], Some("kernel"))?;

        let conv = graph.new_depthwise_conv2d_node(input, kernel, 1, 0, 1, Some("dconv"))?;

        let output_shape = graph.get_node(conv)?.value_expected_shape();
        assert_eq!(output_shape, &[1, 3, 3, in_chs]);
    }
    Ok(())
}

/// chs_mult=2 时输出通道数为 C_in * 2
#[test]
fn test_dwise_conv2d_channel_count_mult2() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_input_node(&[1, 5, 5, 2], Some("input"))?;
    let kernel = graph.new_input_node(&[3, 3, 2, 2], Some("kernel"))?;

    let conv = graph.new_depthwise_conv2d_node(input, kernel, 1, 0, 1, Some("dconv"))?;

    let output_shape = graph.get_node(conv)?.value_expected_shape();
    assert_eq!(output_shape, &[1, 3, 3, 4]);
    Ok(())
}

/// 每个输出通道只来自自己的输入通道（无跨通道求和）
#[test]
fn test_dwise_conv2d_no_channel_mixing() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 2, 2, 2], Some("input"))?;
    let kernel = graph.new_input_node(&[2, 2, 2, 1], Some("kernel"))?;
    let conv = graph.new_depthwise_conv2d_node(input, kernel, 1, 0, 1, Some("dconv"))?;

    // 通道0全1，通道1全10；全1核
    let input_val = Tensor::new(&[1.0, 10.0, 1.0, 10.0, 1.0, 10.0, 1.0, 10.0], &[1, 2, 2, 2]);
    graph.set_node_value(input, Some(&input_val))?;
    graph.set_node_value(kernel, Some(&Tensor::ones(&[2, 2, 2, 1])))?;

    graph.forward(conv)?;

    let output = graph.get_node_value(conv)?.unwrap();
    assert_eq!(output.shape(), &[1, 1, 1, 2]);
    // 若发生跨通道混合，两个值都会变成 44
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 4.0, epsilon = 1e-6);
    assert_abs_diff_eq!(output[[0, 0, 0, 1]], 40.0, epsilon = 1e-6);

    Ok(())
}

/// chs_mult>1 时的通道排布：c_out = ic * mult + m
#[test]
fn test_dwise_conv2d_multiplier_channel_order() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 1, 1, 1], Some("input"))?;
    let kernel = graph.new_input_node(&[1, 1, 1, 2], Some("kernel"))?;
    let conv = graph.new_depthwise_conv2d_node(input, kernel, 1, 0, 1, Some("dconv"))?;

    graph.set_node_value(input, Some(&Tensor::new(&[5.0], &[1, 1, 1, 1])))?;
    graph.set_node_value(kernel, Some(&Tensor::new(&[2.0, 3.0], &[1, 1, 1, 2])))?;

    graph.forward(conv)?;

    let output = graph.get_node_value(conv)?.unwrap();
    assert_eq!(output.shape(), &[1, 1, 1, 2]);
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 10.0, epsilon = 1e-6);
    assert_abs_diff_eq!(output[[0, 0, 0, 1]], 15.0, epsilon = 1e-6);

    Ok(())
}

/// 补零 + stride 的尺寸公式与普通卷积一致
#[test]
fn test_dwise_conv2d_stride2_reduction() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let input = graph.new_input_node(&[2, 35, 35, 3], Some("input"))?;
    let kernel = graph.new_input_node(&[5, 5, 3, 1], Some("kernel"))?;

    let conv = graph.new_depthwise_conv2d_node(input, kernel, 2, 2, 1, Some("dconv"))?;

    let output_shape = graph.get_node(conv)?.value_expected_shape();
    assert_eq!(output_shape, &[2, 18, 18, 3]);
    Ok(())
}

/// 通道数不匹配是构图期错误
#[test]
fn test_dwise_conv2d_channel_mismatch() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();

    let input = graph.new_input_node(&[1, 5, 5, 3], Some("input"))?;
    let kernel = graph.new_input_node(&[3, 3, 2, 1], Some("kernel"))?;

    let result = graph.new_depthwise_conv2d_node(input, kernel, 1, 1, 1, Some("dconv"));
    assert_err!(result, GraphError::ShapeMismatch { .. });

    Ok(())
}
