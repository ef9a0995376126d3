/*
 * @Author       : 老董
 * @Date         : 2026-02-12
 * @Description  : Var 扩展 trait（链式调用支持）
 */

mod activation;
mod norm;

pub use activation::VarActivationOps;
pub use norm::VarNormOps;
