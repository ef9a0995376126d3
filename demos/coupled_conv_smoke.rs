/*
 * coupled_conv 冒烟测试
 *
 * 用默认初始化器实例化一个 coupled_conv 块，喂入固定形状的随机批次，
 * 执行前向传播并打印输出形状。只是自检入口，不属于库契约。
 *
 * 运行：cargo run --example coupled_conv_smoke
 */

use only_conv::nn::{Graph, GraphError, InitParams, Scope, coupled_conv};
use only_conv::tensor::Tensor;

fn main() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(42);

    // (2, 35, 35, 3) 的随机批次
    let batch = Tensor::new_random(0.0, 1.0, &[2, 35, 35, 3]);
    let x = graph.input(&batch)?;

    // coupled_conv: 3 -> 30 通道，k=5，stride=2，ReLU收尾
    let y = coupled_conv(&x, 3, 30, 5, 2, true, &Scope::root(), 0, &InitParams::none(6))?;
    y.forward()?;

    let output = y.value()?.unwrap();
    println!("输出形状: {:?}", output.shape());
    println!("参数: {:?}", graph.parameter_names());

    Ok(())
}
