// crates/mv_data/src/container_array.rs

//! 数据容器注册表
//!
//! 管线传递的顶层对象：名称到数据容器的映射。
//!
//! # 访问约定
//!
//! 过滤器不得缓存跨结构性变更的数组引用；每次 `data_check`/`execute`
//! 内都通过路径重新查找。`prereq_*` 访问器把缺失资源统一报告为
//! 前置条件缺失错误，供 dataCheck 记录。

use crate::array::{DataArray, Scalar, TypedArray};
use crate::container::DataContainer;
use crate::geometry::ImageGeometry;
use crate::matrix::AttributeMatrix;
use crate::path::DataArrayPath;
use mv_foundation::error::{MvError, MvResult};
use std::collections::BTreeMap;

/// 数据容器注册表
#[derive(Debug, Clone, Default)]
pub struct DataContainerArray {
    containers: BTreeMap<String, DataContainer>,
}

impl DataContainerArray {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 容器数量
    pub fn num_containers(&self) -> usize {
        self.containers.len()
    }

    /// 是否包含容器
    pub fn has_container(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    /// 容器名称列表
    pub fn container_names(&self) -> Vec<String> {
        self.containers.keys().cloned().collect()
    }

    /// 加入容器
    ///
    /// 名称已存在时返回名称重复错误。
    pub fn add_container(&mut self, container: DataContainer) -> MvResult<()> {
        let name = container.name().to_string();
        if self.containers.contains_key(&name) {
            return Err(MvError::duplicate_name(&name));
        }
        self.containers.insert(name, container);
        Ok(())
    }

    /// 取容器
    pub fn get_container(&self, name: &str) -> MvResult<&DataContainer> {
        self.containers
            .get(name)
            .ok_or_else(|| MvError::not_found(name))
    }

    /// 取容器（可变）
    pub fn get_container_mut(&mut self, name: &str) -> MvResult<&mut DataContainer> {
        match self.containers.get_mut(name) {
            Some(c) => Ok(c),
            None => Err(MvError::not_found(name)),
        }
    }

    /// 移除容器
    pub fn remove_container(&mut self, name: &str) -> MvResult<DataContainer> {
        self.containers
            .remove(name)
            .ok_or_else(|| MvError::not_found(name))
    }

    /// 深拷贝容器到新名称
    pub fn duplicate_container(&mut self, src: &str, dst: &str) -> MvResult<()> {
        if self.containers.contains_key(dst) {
            return Err(MvError::duplicate_name(dst));
        }
        let copy = self.get_container(src)?.duplicate(dst);
        self.containers.insert(dst.to_string(), copy);
        Ok(())
    }

    // ========================================================================
    // dataCheck 前置条件访问器
    // ========================================================================

    /// 要求容器存在且带图像几何
    pub fn prereq_geometry(&self, container: &str) -> MvResult<&ImageGeometry> {
        let dc = self
            .containers
            .get(container)
            .ok_or_else(|| MvError::missing_prerequisite(format!("DataContainer '{}'", container)))?;
        dc.geometry().ok_or_else(|| {
            MvError::missing_prerequisite(format!("ImageGeometry in '{}'", container))
        })
    }

    /// 要求路径上的属性矩阵存在
    pub fn prereq_matrix(&self, path: &DataArrayPath) -> MvResult<&AttributeMatrix> {
        let dc = self.containers.get(&path.container).ok_or_else(|| {
            MvError::missing_prerequisite(format!("DataContainer '{}'", path.container))
        })?;
        dc.get_matrix(&path.matrix).map_err(|_| {
            MvError::missing_prerequisite(format!(
                "AttributeMatrix '{}/{}'",
                path.container, path.matrix
            ))
        })
    }

    /// 要求路径上的数组存在且类型与分量数相符
    pub fn prereq_array<T: Scalar>(
        &self,
        path: &DataArrayPath,
        num_components: usize,
    ) -> MvResult<&TypedArray<T>> {
        let matrix = self.prereq_matrix(path)?;
        let array = matrix.get_array(&path.array).map_err(|_| {
            MvError::missing_prerequisite(format!("DataArray '{}'", path))
        })?;
        let typed = crate::array::downcast_array::<T>(array)?;
        if typed.num_components() != num_components {
            return Err(MvError::type_mismatch(
                path.to_string(),
                format!("{} x{}", T::SCALAR_TYPE, num_components),
                format!("{} x{}", typed.scalar_type(), typed.num_components()),
            ));
        }
        Ok(typed)
    }

    /// 要求路径上的数组存在且类型相符（可变）
    pub fn prereq_array_mut<T: Scalar>(
        &mut self,
        path: &DataArrayPath,
        num_components: usize,
    ) -> MvResult<&mut TypedArray<T>> {
        // 先以只读路径完成全部校验，再做可变查找
        self.prereq_array::<T>(path, num_components)?;
        let matrix = self
            .get_container_mut(&path.container)?
            .get_matrix_mut(&path.matrix)?;
        matrix.get_typed_mut::<T>(&path.array)
    }

    /// 在路径处创建输出数组（已存在则整体替换）
    ///
    /// 用于过滤器的"创建数组"声明：preflight 阶段即建立正确形状的
    /// 占位数组，使下游过滤器看到一致的结构。
    pub fn create_array_at_path<T: Scalar>(
        &mut self,
        path: &DataArrayPath,
        num_components: usize,
    ) -> MvResult<()> {
        let matrix = self
            .containers
            .get_mut(&path.container)
            .ok_or_else(|| {
                MvError::missing_prerequisite(format!("DataContainer '{}'", path.container))
            })?
            .get_matrix_mut(&path.matrix)
            .map_err(|_| {
                MvError::missing_prerequisite(format!(
                    "AttributeMatrix '{}/{}'",
                    path.container, path.matrix
                ))
            })?;
        let array = TypedArray::<T>::new(path.array.clone(), matrix.num_tuples(), num_components);
        matrix.replace_array(Box::new(array))
    }

    /// 校验全部容器
    pub fn validate(&self) -> MvResult<()> {
        for container in self.containers.values() {
            container.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::AttributeMatrixType;
    use glam::Vec3;

    fn build_dca() -> DataContainerArray {
        let mut dc = DataContainer::new("ImageDataContainer");
        dc.set_geometry(ImageGeometry::new([2, 2, 1], Vec3::ONE));
        let mut cell = AttributeMatrix::new("CellData", AttributeMatrixType::Cell, vec![2, 2, 1]);
        cell.create_array::<i32>("FeatureIds", 1).unwrap();
        dc.add_matrix(cell).unwrap();

        let mut dca = DataContainerArray::new();
        dca.add_container(dc).unwrap();
        dca
    }

    #[test]
    fn test_prereq_geometry() {
        let dca = build_dca();
        assert!(dca.prereq_geometry("ImageDataContainer").is_ok());
        assert!(matches!(
            dca.prereq_geometry("Missing"),
            Err(MvError::MissingPrerequisite { .. })
        ));
    }

    #[test]
    fn test_prereq_array_type_checked() {
        let dca = build_dca();
        let path = DataArrayPath::new("ImageDataContainer", "CellData", "FeatureIds");
        assert!(dca.prereq_array::<i32>(&path, 1).is_ok());
        assert!(matches!(
            dca.prereq_array::<f32>(&path, 1),
            Err(MvError::TypeMismatch { .. })
        ));
        assert!(matches!(
            dca.prereq_array::<i32>(&path, 3),
            Err(MvError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_prereq_array_missing() {
        let dca = build_dca();
        let path = DataArrayPath::new("ImageDataContainer", "CellData", "Nope");
        assert!(matches!(
            dca.prereq_array::<i32>(&path, 1),
            Err(MvError::MissingPrerequisite { .. })
        ));
    }

    #[test]
    fn test_create_array_at_path() {
        let mut dca = build_dca();
        let path = DataArrayPath::new("ImageDataContainer", "CellData", "Output");
        dca.create_array_at_path::<f32>(&path, 3).unwrap();
        let arr = dca.prereq_array::<f32>(&path, 3).unwrap();
        assert_eq!(arr.num_tuples(), 4);
    }

    #[test]
    fn test_duplicate_container() {
        let mut dca = build_dca();
        dca.duplicate_container("ImageDataContainer", "Resampled")
            .unwrap();
        assert!(dca.has_container("Resampled"));
        assert!(dca
            .duplicate_container("ImageDataContainer", "Resampled")
            .is_err());
    }
}
