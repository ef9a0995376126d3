/*
 * @Author       : 老董
 * @Date         : 2026-02-10
 * @Description  : 张量的其它运算：逐元素数学函数与带keepdims语义的归约。
 *                 归一化类节点（instance/batch norm、LRN）的前向计算依赖这些方法。
 */

use super::super::Tensor;
use ndarray::Axis;

impl Tensor {
    /// 逐元素开平方
    pub fn sqrt(&self) -> Tensor {
        Tensor {
            data: self.data.mapv(f32::sqrt),
        }
    }

    /// 逐元素幂运算
    pub fn powf(&self, exponent: f32) -> Tensor {
        Tensor {
            data: self.data.mapv(|x| x.powf(exponent)),
        }
    }

    /// 沿指定的多个轴求均值，且保留被归约的维度（长度变为1）。
    /// 如：形状[2,5,5,3]沿轴[1,2]归约后形状为[2,1,1,3]，可直接与原张量广播运算。
    ///
    /// # Panics
    /// 如果某个被归约轴的长度为0
    pub fn mean_axes_keepdims(&self, axes: &[usize]) -> Tensor {
        let mut sorted_axes = axes.to_vec();
        sorted_axes.sort_unstable();
        sorted_axes.dedup();

        let mut result = self.data.clone();
        // 先从高轴到低轴归约（避免轴序号随归约漂移）
        for &axis in sorted_axes.iter().rev() {
            result = result
                .mean_axis(Axis(axis))
                .expect("被归约轴的长度必须大于0");
        }
        // 再按原轴序号补回长度为1的维度，维持keepdims语义
        for &axis in &sorted_axes {
            result = result.insert_axis(Axis(axis));
        }
        Tensor { data: result }
    }

    /// 沿指定的多个轴求（有偏）方差，保留被归约的维度。
    /// 与tf.nn.moments一致：除以元素个数N而非N-1。
    pub fn var_axes_keepdims(&self, axes: &[usize]) -> Tensor {
        let mean = self.mean_axes_keepdims(axes);
        let centered = self - &mean;
        (&centered * &centered).mean_axes_keepdims(axes)
    }
}
