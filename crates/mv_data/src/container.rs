// crates/mv_data/src/container.rs

//! 数据容器
//!
//! 拥有至多一个几何描述和若干属性矩阵。

use crate::geometry::ImageGeometry;
use crate::matrix::{AttributeMatrix, AttributeMatrixType};
use mv_foundation::error::{MvError, MvResult};
use std::collections::BTreeMap;

/// 数据容器
#[derive(Debug, Clone)]
pub struct DataContainer {
    name: String,
    geometry: Option<ImageGeometry>,
    matrices: BTreeMap<String, AttributeMatrix>,
}

impl DataContainer {
    /// 创建空容器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: None,
            matrices: BTreeMap::new(),
        }
    }

    /// 容器名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 几何描述
    pub fn geometry(&self) -> Option<&ImageGeometry> {
        self.geometry.as_ref()
    }

    /// 几何描述（可变）
    pub fn geometry_mut(&mut self) -> Option<&mut ImageGeometry> {
        self.geometry.as_mut()
    }

    /// 设置几何描述
    pub fn set_geometry(&mut self, geometry: ImageGeometry) {
        self.geometry = Some(geometry);
    }

    /// 矩阵数量
    pub fn num_matrices(&self) -> usize {
        self.matrices.len()
    }

    /// 是否包含矩阵
    pub fn has_matrix(&self, name: &str) -> bool {
        self.matrices.contains_key(name)
    }

    /// 矩阵名称列表
    pub fn matrix_names(&self) -> Vec<String> {
        self.matrices.keys().cloned().collect()
    }

    /// 加入属性矩阵
    ///
    /// 名称已存在时返回名称重复错误。
    pub fn add_matrix(&mut self, matrix: AttributeMatrix) -> MvResult<()> {
        let name = matrix.name().to_string();
        if self.matrices.contains_key(&name) {
            return Err(MvError::duplicate_name(&name));
        }
        self.matrices.insert(name, matrix);
        Ok(())
    }

    /// 整体替换（或插入）属性矩阵
    ///
    /// 用于结构性形状变更：旧矩阵被移出并立即释放，避免部分调整
    /// 导致的不一致。
    pub fn replace_matrix(&mut self, matrix: AttributeMatrix) {
        self.matrices.insert(matrix.name().to_string(), matrix);
    }

    /// 取属性矩阵
    pub fn get_matrix(&self, name: &str) -> MvResult<&AttributeMatrix> {
        self.matrices
            .get(name)
            .ok_or_else(|| MvError::not_found(format!("{}/{}", self.name, name)))
    }

    /// 取属性矩阵（可变）
    pub fn get_matrix_mut(&mut self, name: &str) -> MvResult<&mut AttributeMatrix> {
        match self.matrices.get_mut(name) {
            Some(m) => Ok(m),
            None => Err(MvError::not_found(format!("{}/{}", self.name, name))),
        }
    }

    /// 移除属性矩阵
    pub fn remove_matrix(&mut self, name: &str) -> MvResult<AttributeMatrix> {
        self.matrices
            .remove(name)
            .ok_or_else(|| MvError::not_found(format!("{}/{}", self.name, name)))
    }

    /// 以新名称深拷贝容器
    pub fn duplicate(&self, new_name: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.name = new_name.into();
        copy
    }

    /// 校验几何与 Cell 矩阵的形状一致性
    ///
    /// 若存在几何，所有 Cell 类型矩阵的元组形状必须等于几何维度。
    pub fn validate(&self) -> MvResult<()> {
        for matrix in self.matrices.values() {
            matrix.validate()?;
            if matrix.matrix_type() == AttributeMatrixType::Cell {
                if let Some(geom) = &self.geometry {
                    if matrix.tuple_dims() != geom.dims {
                        return Err(MvError::size_mismatch(
                            matrix.name().to_string(),
                            geom.num_elements(),
                            matrix.num_tuples(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_add_and_get_matrix() {
        let mut dc = DataContainer::new("ImageDataContainer");
        dc.add_matrix(AttributeMatrix::new(
            "CellData",
            AttributeMatrixType::Cell,
            vec![2, 2, 1],
        ))
        .unwrap();
        assert!(dc.has_matrix("CellData"));
        assert!(dc.get_matrix("CellData").is_ok());
        assert!(dc.get_matrix("Other").is_err());
    }

    #[test]
    fn test_add_duplicate_matrix_fails() {
        let mut dc = DataContainer::new("DC");
        let m = AttributeMatrix::new("M", AttributeMatrixType::Generic, vec![1]);
        dc.add_matrix(m.clone()).unwrap();
        assert!(dc.add_matrix(m).is_err());
    }

    #[test]
    fn test_validate_geometry_consistency() {
        let mut dc = DataContainer::new("DC");
        dc.set_geometry(ImageGeometry::new([2, 2, 1], Vec3::ONE));
        dc.add_matrix(AttributeMatrix::new(
            "CellData",
            AttributeMatrixType::Cell,
            vec![2, 2, 1],
        ))
        .unwrap();
        assert!(dc.validate().is_ok());

        dc.replace_matrix(AttributeMatrix::new(
            "CellData",
            AttributeMatrixType::Cell,
            vec![3, 3, 1],
        ));
        assert!(dc.validate().is_err());
    }

    #[test]
    fn test_duplicate_deep_copies() {
        let mut dc = DataContainer::new("A");
        let mut m = AttributeMatrix::new("CellData", AttributeMatrixType::Cell, vec![2, 1, 1]);
        m.create_array::<i32>("FeatureIds", 1).unwrap();
        dc.add_matrix(m).unwrap();

        let mut copy = dc.duplicate("B");
        copy.get_matrix_mut("CellData")
            .unwrap()
            .get_typed_mut::<i32>("FeatureIds")
            .unwrap()
            .set(0, 0, 9)
            .unwrap();

        let original = dc
            .get_matrix("CellData")
            .unwrap()
            .get_typed::<i32>("FeatureIds")
            .unwrap();
        assert_eq!(original.get(0, 0).unwrap(), 0);
        assert_eq!(copy.name(), "B");
    }
}
