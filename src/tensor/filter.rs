use super::Tensor;

impl Tensor {
    /// 逐元素条件映射：满足`condition`的元素经`true_fn`映射，否则经`false_fn`映射。
    /// 常用于各类逐元素激活（如ReLU/LeakyReLU）的前向计算。
    pub fn where_with_f32<F, T, U>(&self, condition: F, true_fn: T, false_fn: U) -> Self
    where
        F: Fn(f32) -> bool,
        T: Fn(f32) -> f32,
        U: Fn(f32) -> f32,
    {
        Self {
            data: self
                .data
                .mapv(|x| if condition(x) { true_fn(x) } else { false_fn(x) }),
        }
    }
}
