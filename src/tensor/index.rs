use super::Tensor;
use ndarray::IxDyn;
use std::ops::{Index, IndexMut};

// 固定阶数的下标访问：`t[[b, h, w, c]]`这类写法
macro_rules! impl_fixed_rank_index {
    ($($n:literal),*) => {
        $(
            impl Index<[usize; $n]> for Tensor {
                type Output = f32;

                fn index(&self, index: [usize; $n]) -> &f32 {
                    &self.data[IxDyn(&index)]
                }
            }

            impl IndexMut<[usize; $n]> for Tensor {
                fn index_mut(&mut self, index: [usize; $n]) -> &mut f32 {
                    &mut self.data[IxDyn(&index)]
                }
            }
        )*
    };
}

impl_fixed_rank_index!(1, 2, 3, 4);
