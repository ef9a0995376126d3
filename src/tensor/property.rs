/*
 * @Author       : 老董
 * @Date         : 2026-02-10
 * @Description  : 本类仅包含一些属性方法，不包含任何运算方法，所以不会需要用到mut
 */

use super::Tensor;

impl Tensor {
    /// 若为向量，`shape`为[n]；若为矩阵，`shape`为[n,m]；
    /// 图像域的4维张量为[batch, height, width, channels]（NHWC）。
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 张量的维（dim）数、阶（rank）数
    /// 即`shape()`的元素个数--如：形状为`[]`的标量阶数为0，向量阶数为1，矩阵阶数为2，以此类推
    pub fn dimension(&self) -> usize {
        self.data.ndim()
    }

    /// 计算张量中所有元素的数量
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 判断两个张量的形状是否严格一致。如：形状为[1, 4]，[1, 4]和[4]是不一致的，会返回false
    pub fn is_same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// 判断两个张量是否可按NumPy广播规则运算：
    /// 从右向左对齐维度，每个维度须相等、或其中一个为1；维度数不同时较短形状前面补1。
    pub fn can_broadcast_with(&self, other: &Self) -> bool {
        let shape1 = self.shape();
        let shape2 = other.shape();
        shape1
            .iter()
            .rev()
            .zip(shape2.iter().rev())
            .all(|(&d1, &d2)| d1 == d2 || d1 == 1 || d2 == 1)
    }

    /// 以连续内存切片的形式访问张量数据（行主序）
    pub fn data_as_slice(&self) -> &[f32] {
        self.data
            .as_slice()
            .expect("张量数据必须是连续的标准布局")
    }
}
