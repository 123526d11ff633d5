// crates/mv_data/src/matrix.rs

//! 属性矩阵
//!
//! 名称到数据数组的有序映射，所有数组共享同一元组形状。
//! 元组形状描述实体网格：体素(Cell)、特征(Feature)、相(Ensemble)等。
//!
//! # 不变量
//!
//! 每个数组的元组数恒等于元组形状各维度之积。
//!
//! # 结构性操作
//!
//! - [`AttributeMatrix::resize_tuples`] 是破坏性的：重新分配所有数组但不
//!   重映射数据。任何非简单增缩的形状变更必须由调用方配合索引映射完成
//!   （见重采样过滤器）。
//! - [`AttributeMatrix::remove_inactive`] 压实：按活跃掩码保留元组并
//!   返回旧索引到新索引的重映射表。以本矩阵索引为值的引用数组（如
//!   每体素特征号）由调用方通过该表改写。

use crate::array::{DataArray, Scalar, TypedArray};
use mv_foundation::error::{MvError, MvResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 属性矩阵语义类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeMatrixType {
    /// 体素数据，元组形状为 [nx, ny, nz]
    Cell,
    /// 特征(晶粒)数据，元组形状为 [N]
    Feature,
    /// 相(类别)数据，元组形状为 [N]
    Ensemble,
    /// 通用数据
    Generic,
}

impl std::fmt::Display for AttributeMatrixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cell => "Cell",
            Self::Feature => "Feature",
            Self::Ensemble => "Ensemble",
            Self::Generic => "Generic",
        };
        write!(f, "{}", s)
    }
}

/// 属性矩阵
#[derive(Debug, Clone)]
pub struct AttributeMatrix {
    name: String,
    matrix_type: AttributeMatrixType,
    tuple_dims: Vec<usize>,
    arrays: BTreeMap<String, Box<dyn DataArray>>,
}

impl AttributeMatrix {
    /// 创建空矩阵
    pub fn new(
        name: impl Into<String>,
        matrix_type: AttributeMatrixType,
        tuple_dims: Vec<usize>,
    ) -> Self {
        Self {
            name: name.into(),
            matrix_type,
            tuple_dims,
            arrays: BTreeMap::new(),
        }
    }

    /// 矩阵名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 语义类型
    pub fn matrix_type(&self) -> AttributeMatrixType {
        self.matrix_type
    }

    /// 元组形状
    pub fn tuple_dims(&self) -> &[usize] {
        &self.tuple_dims
    }

    /// 元组数量（形状各维度之积）
    pub fn num_tuples(&self) -> usize {
        self.tuple_dims.iter().product()
    }

    /// 数组数量
    pub fn num_arrays(&self) -> usize {
        self.arrays.len()
    }

    /// 是否包含数组
    pub fn has_array(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// 数组名称列表（按名称有序）
    pub fn array_names(&self) -> Vec<String> {
        self.arrays.keys().cloned().collect()
    }

    /// 创建新数组，大小取自当前元组形状
    ///
    /// 名称已存在时返回名称重复错误。
    pub fn create_array<T: Scalar>(
        &mut self,
        name: impl Into<String>,
        num_components: usize,
    ) -> MvResult<()> {
        let name = name.into();
        if self.arrays.contains_key(&name) {
            return Err(MvError::duplicate_name(&name));
        }
        let array = TypedArray::<T>::new(name.clone(), self.num_tuples(), num_components);
        self.arrays.insert(name, Box::new(array));
        Ok(())
    }

    /// 加入既有数组
    ///
    /// 数组元组数必须与矩阵一致；名称已存在时返回名称重复错误。
    pub fn add_array(&mut self, array: Box<dyn DataArray>) -> MvResult<()> {
        let name = array.name().to_string();
        if self.arrays.contains_key(&name) {
            return Err(MvError::duplicate_name(&name));
        }
        MvError::check_size(&name, self.num_tuples(), array.num_tuples())?;
        self.arrays.insert(name, array);
        Ok(())
    }

    /// 替换（或插入）数组，元组数仍须一致
    pub fn replace_array(&mut self, array: Box<dyn DataArray>) -> MvResult<()> {
        let name = array.name().to_string();
        MvError::check_size(&name, self.num_tuples(), array.num_tuples())?;
        self.arrays.insert(name, array);
        Ok(())
    }

    /// 取数组
    pub fn get_array(&self, name: &str) -> MvResult<&dyn DataArray> {
        self.arrays
            .get(name)
            .map(|a| a.as_ref())
            .ok_or_else(|| MvError::not_found(format!("{}/{}", self.name, name)))
    }

    /// 取数组（可变）
    pub fn get_array_mut(&mut self, name: &str) -> MvResult<&mut dyn DataArray> {
        match self.arrays.get_mut(name) {
            Some(a) => Ok(a.as_mut()),
            None => Err(MvError::not_found(format!("{}/{}", self.name, name))),
        }
    }

    /// 取带类型数组
    pub fn get_typed<T: Scalar>(&self, name: &str) -> MvResult<&TypedArray<T>> {
        crate::array::downcast_array(self.get_array(name)?)
    }

    /// 取带类型数组（可变）
    pub fn get_typed_mut<T: Scalar>(&mut self, name: &str) -> MvResult<&mut TypedArray<T>> {
        crate::array::downcast_array_mut(self.get_array_mut(name)?)
    }

    /// 移除数组
    pub fn remove_array(&mut self, name: &str) -> MvResult<Box<dyn DataArray>> {
        self.arrays
            .remove(name)
            .ok_or_else(|| MvError::not_found(format!("{}/{}", self.name, name)))
    }

    /// 改变元组形状并重新分配所有数组
    ///
    /// 破坏性操作：各数组按新元组数重新分配，但不重映射数据。
    pub fn resize_tuples(&mut self, tuple_dims: Vec<usize>) {
        self.tuple_dims = tuple_dims;
        let n = self.num_tuples();
        for array in self.arrays.values_mut() {
            array.resize_tuples(n);
        }
    }

    /// 按活跃掩码压实矩阵
    ///
    /// 构建旧索引到新索引的重映射表（被丢弃的元组映射为 -1），新建只含
    /// 活跃元组的矩阵并按升序原索引复制各数组的存活元组，最后整体替换
    /// 自身。返回重映射表；以矩阵索引为值的引用数组由调用方改写。
    ///
    /// 掩码不做任何保留约定：需要保留 0 号背景元组的调用方自行将
    /// `active[0]` 置为 true。
    pub fn remove_inactive(&mut self, active: &[bool]) -> MvResult<Vec<i32>> {
        let old_count = self.num_tuples();
        MvError::check_size("active mask", old_count, active.len())?;

        let mut remap = vec![-1i32; old_count];
        let mut new_count = 0usize;
        for (old_idx, &keep) in active.iter().enumerate() {
            if keep {
                remap[old_idx] = new_count as i32;
                new_count += 1;
            }
        }

        let mut new_arrays: BTreeMap<String, Box<dyn DataArray>> = BTreeMap::new();
        for (name, array) in &self.arrays {
            let mut compacted = array.create_compatible(new_count);
            for old_idx in 0..old_count {
                let new_idx = remap[old_idx];
                if new_idx >= 0 {
                    compacted.copy_tuple(new_idx as usize, array.as_ref(), old_idx)?;
                }
            }
            new_arrays.insert(name.clone(), compacted);
        }

        self.tuple_dims = vec![new_count];
        self.arrays = new_arrays;
        Ok(remap)
    }

    /// 校验形状不变量
    pub fn validate(&self) -> MvResult<()> {
        let expected = self.num_tuples();
        for (name, array) in &self.arrays {
            MvError::check_size(name, expected, array.num_tuples())?;
        }
        Ok(())
    }
}
