/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 张量的npy格式读写。用于移植其它框架（numpy导出）训练好的权重。
 */

use super::Tensor;
use crate::errors::TensorError;
use ndarray::{Array, IxDyn};
use ndarray_npy::{read_npy, write_npy};
use std::path::Path;

impl Tensor {
    /// 将张量保存为npy文件（f32、行主序）
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> Result<(), TensorError> {
        write_npy(path.as_ref(), &self.data)
            .map_err(|e| TensorError::NpyIo(format!("保存{}失败：{e}", path.as_ref().display())))
    }

    /// 从npy文件加载张量。文件须为f32类型（numpy端请先astype(np.float32)）。
    pub fn load_npy<P: AsRef<Path>>(path: P) -> Result<Tensor, TensorError> {
        let data: Array<f32, IxDyn> = read_npy(path.as_ref())
            .map_err(|e| TensorError::NpyIo(format!("加载{}失败：{e}", path.as_ref().display())))?;
        Ok(Tensor { data })
    }
}
