/*
 * @Author       : 老董
 * @Date         : 2026-02-13
 * @Description  : conv/dconv/归一化构建函数测试（作用域命名、外部初始值注入）
 */

use crate::assert_err;
use crate::nn::{GraphError, Graph, Scope, batch_norm, conv, dconv, instance_norm};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

/// conv 在 conv_<idx:02> 子作用域下声明 kernel/bias
#[test]
fn test_conv_parameter_naming() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(1);
    let x = graph.input(&Tensor::ones(&[1, 5, 5, 2]))?;

    let scope = Scope::root().child("encoder");
    conv(&x, 2, 4, 3, 1, 1, 1, &scope, 0, true, None, None)?;

    assert_eq!(
        graph.parameter_names(),
        vec![
            "encoder/conv_00/bias".to_string(),
            "encoder/conv_00/kernel".to_string(),
        ]
    );

    Ok(())
}

/// 注入的卷积核按原样生效：全1核 + 零偏置 = 窗口求和
#[test]
fn test_conv_with_kernel_override() -> Result<(), GraphError> {
    let graph = Graph::new();
    let x = graph.input(&Tensor::ones(&[1, 3, 3, 1]))?;

    let kernel = Tensor::ones(&[2, 2, 1, 1]);
    let y = conv(
        &x,
        1,
        1,
        2,
        1,
        0,
        1,
        &Scope::root(),
        0,
        true,
        Some(&kernel),
        None,
    )?;

    y.forward()?;
    let output = y.value()?.unwrap();
    assert_eq!(output.shape(), &[1, 2, 2, 1]);
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 4.0, epsilon = 1e-6);

    Ok(())
}

/// 注入的偏置逐通道相加
#[test]
fn test_conv_with_bias_override() -> Result<(), GraphError> {
    let graph = Graph::new();
    let x = graph.input(&Tensor::ones(&[1, 2, 2, 1]))?;

    let kernel = Tensor::ones(&[1, 1, 1, 2]);
    let bias = Tensor::new(&[10.0, -10.0], &[2]);
    let y = conv(
        &x,
        1,
        2,
        1,
        1,
        0,
        1,
        &Scope::root(),
        0,
        true,
        Some(&kernel),
        Some(&bias),
    )?;

    y.forward()?;
    let output = y.value()?.unwrap();
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 11.0, epsilon = 1e-6);
    assert_abs_diff_eq!(output[[0, 0, 0, 1]], -9.0, epsilon = 1e-6);

    Ok(())
}

/// 注入形状不符的卷积核是构图期 ShapeMismatch
#[test]
fn test_conv_override_shape_mismatch() -> Result<(), GraphError> {
    let graph = Graph::new();
    let x = graph.input(&Tensor::ones(&[1, 5, 5, 2]))?;

    let wrong_kernel = Tensor::ones(&[3, 3, 2, 8]);
    let result = conv(
        &x,
        2,
        4,
        3,
        1,
        1,
        1,
        &Scope::root(),
        0,
        false,
        Some(&wrong_kernel),
        None,
    );

    assert_err!(result, GraphError::ShapeMismatch { .. });

    Ok(())
}

/// 输入通道数与声明不符时，诊断信息带作用域路径
#[test]
fn test_conv_reports_scope_path_on_error() -> Result<(), GraphError> {
    let graph = Graph::new();
    let x = graph.input(&Tensor::ones(&[1, 5, 5, 3]))?;

    let scope = Scope::root().child("decoder");
    let result = conv(&x, 2, 4, 3, 1, 1, 1, &scope, 7, false, None, None);

    assert_err!(
        result,
        GraphError::ShapeMismatch { message, .. } if message.contains("decoder/conv_07")
    );

    Ok(())
}

/// dconv：全零的注入核是有效的注入值（不是“没提供”）
#[test]
fn test_dconv_zero_kernel_override_is_respected() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(3);
    let x = graph.input(&Tensor::ones(&[1, 4, 4, 2]))?;

    let zero_kernel = Tensor::zeros(&[3, 3, 2, 1]);
    let y = dconv(
        &x,
        2,
        3,
        1,
        1,
        1,
        &Scope::root(),
        0,
        false,
        1,
        Some(&zero_kernel),
        None,
    )?;

    y.forward()?;
    // 默认的 Glorot 初始化几乎不可能全零；输出全零说明注入生效
    let output = y.value()?.unwrap();
    assert!(output.data_as_slice().iter().all(|&v| v == 0.0));

    Ok(())
}

/// dconv 的参数命名与偏置长度
#[test]
fn test_dconv_parameter_naming_and_bias_len() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(4);
    let x = graph.input(&Tensor::ones(&[1, 4, 4, 3]))?;

    dconv(&x, 3, 3, 1, 1, 1, &Scope::root(), 2, true, 2, None, None)?;

    assert_eq!(
        graph.parameter_names(),
        vec![
            "dwise_conv_02/bias".to_string(),
            "dwise_conv_02/kernel".to_string(),
        ]
    );
    // 偏置长度 = in_chs * chs_mult
    let bias = graph.get_parameter("dwise_conv_02/bias").unwrap();
    assert_eq!(bias.value_expected_shape(), vec![6]);

    Ok(())
}

/// batch_norm 构建函数：bn_<idx:02> 作用域 + 按当前批次归一化
#[test]
fn test_batch_norm_layer() -> Result<(), GraphError> {
    let graph = Graph::new();
    let x = graph.input(&Tensor::new(&[1.0, 3.0], &[2, 1, 1, 1]))?;

    let y = batch_norm(&x, 1, &Scope::root(), 0, 1e-5, None, None)?;

    assert_eq!(
        graph.parameter_names(),
        vec!["bn_00/beta".to_string(), "bn_00/gamma".to_string()]
    );

    y.forward()?;
    let output = y.value()?.unwrap();
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], -1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(output[[1, 0, 0, 0]], 1.0, epsilon = 1e-4);

    Ok(())
}

/// instance_norm 构建函数：gamma/beta 的命名与默认值
#[test]
fn test_instance_norm_parameter_naming() -> Result<(), GraphError> {
    let graph = Graph::new();
    let x = graph.input(&Tensor::ones(&[1, 4, 4, 3]))?;

    instance_norm(&x, 3, &Scope::root(), 1, 1e-6, None, None)?;

    assert_eq!(
        graph.parameter_names(),
        vec!["in_1/beta".to_string(), "in_1/gamma".to_string()]
    );

    let gamma = graph.get_parameter("in_1/gamma").unwrap().value()?.unwrap();
    let beta = graph.get_parameter("in_1/beta").unwrap().value()?.unwrap();
    assert!(gamma.data_as_slice().iter().all(|&v| v == 1.0));
    assert!(beta.data_as_slice().iter().all(|&v| v == 0.0));

    Ok(())
}
