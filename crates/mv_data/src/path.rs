// crates/mv_data/src/path.rs

//! 数组路径
//!
//! 以 (容器名, 矩阵名, 数组名) 三元组定位数据数组。

use serde::{Deserialize, Serialize};

/// 数组路径三元组
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DataArrayPath {
    /// 数据容器名
    pub container: String,
    /// 属性矩阵名
    pub matrix: String,
    /// 数组名
    pub array: String,
}

impl DataArrayPath {
    /// 创建路径
    pub fn new(
        container: impl Into<String>,
        matrix: impl Into<String>,
        array: impl Into<String>,
    ) -> Self {
        Self {
            container: container.into(),
            matrix: matrix.into(),
            array: array.into(),
        }
    }

    /// 去掉数组名的矩阵级路径
    pub fn matrix_path(&self) -> Self {
        Self::new(self.container.clone(), self.matrix.clone(), "")
    }

    /// 替换容器名
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }
}

impl std::fmt::Display for DataArrayPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.container, self.matrix, self.array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = DataArrayPath::new("ImageDataContainer", "CellData", "FeatureIds");
        assert_eq!(path.to_string(), "ImageDataContainer/CellData/FeatureIds");
    }

    #[test]
    fn test_with_container() {
        let path = DataArrayPath::new("A", "M", "X").with_container("B");
        assert_eq!(path.container, "B");
        assert_eq!(path.array, "X");
    }
}
