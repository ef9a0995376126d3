//! # Only Conv
//!
//! `only_conv`项目旨在用纯rust构建卷积网络的层级构建块（面向GAN生成器这类图像翻译网络）：
//! 以确定性的分层参数命名组装计算图，支持把其它框架（如tensorflow导出的numpy数组）
//! 训练好的权重直接注入图中，并复现“先显式补零、再做valid卷积”的跨框架填充约定。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;
