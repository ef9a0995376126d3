/*
 * @Author       : 老董
 * @Date         : 2026-02-11
 * @Description  : 显式的命名作用域路径
 *
 * 作用域不是环境态（ambient）上下文，而是一个显式传递的值：
 * 每个复合块/算子在调用处接收父作用域，用`child()`派生自己的一层，
 * 参数的限定名由各层段用`/`拼接而成。检查点按限定名定位参数，
 * 因此相同拓扑、相同序号的重复构图会得到完全相同的限定名。
 */

/// 命名作用域 - 有序的路径段列表
///
/// # 使用示例
/// ```ignore
/// let root = Scope::root();
/// let block = root.child("coupled_conv_0");
/// let op = block.child("conv_02");
/// assert_eq!(op.qualify("kernel"), "coupled_conv_0/conv_02/kernel");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    segments: Vec<String>,
}

impl Scope {
    /// 创建根作用域（空路径）
    pub fn root() -> Self {
        Self::default()
    }

    /// 派生一层子作用域
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// 当前作用域的完整路径（各段以`/`拼接）
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// 生成`name`在本作用域下的限定名
    pub fn qualify(&self, name: &str) -> String {
        if self.segments.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path(), name)
        }
    }

    /// 是否为根作用域
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}
