// crates/mv_data/src/lib.rs

//! MicroVox 数据模型
//!
//! 体素化三维材料数据集的所有权模型：
//!
//! - [`array`]: 带类型、可调整大小、多分量的数据数组
//! - [`matrix`]: 共享元组形状的数组集合（属性矩阵），支持结构性
//!   调整与压实
//! - [`geometry`]: 规则体素网格几何
//! - [`container`]: 几何 + 属性矩阵的容器
//! - [`container_array`]: 顶层容器注册表，管线传递的根对象
//! - [`path`]: (容器, 矩阵, 数组) 路径三元组
//!
//! # 所有权
//!
//! 数组由属性矩阵独占拥有，矩阵由容器独占拥有，容器由注册表独占
//! 拥有。结构性变更以整体替换表达，旧存储随替换立即释放。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod container;
pub mod container_array;
pub mod geometry;
pub mod matrix;
pub mod path;

pub use array::{
    downcast_array, downcast_array_mut, make_array, DataArray, Scalar, ScalarType, TypedArray,
};
pub use container::DataContainer;
pub use container_array::DataContainerArray;
pub use geometry::ImageGeometry;
pub use matrix::{AttributeMatrix, AttributeMatrixType};
pub use path::DataArrayPath;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::array::{DataArray, Scalar, ScalarType, TypedArray};
    pub use crate::container::DataContainer;
    pub use crate::container_array::DataContainerArray;
    pub use crate::geometry::ImageGeometry;
    pub use crate::matrix::{AttributeMatrix, AttributeMatrixType};
    pub use crate::path::DataArrayPath;
}
