// crates/mv_data/src/geometry.rs

//! 图像几何
//!
//! 描述规则体素网格：三轴维度、体素间距与原点。
//! 线性索引采用行主序（x 最快，其次 y，最后 z）。

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// 图像(规则网格)几何描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    /// 三轴维度 [nx, ny, nz]
    pub dims: [usize; 3],
    /// 体素间距 [dx, dy, dz]
    pub spacing: Vec3,
    /// 原点
    pub origin: Vec3,
}

impl ImageGeometry {
    /// 创建几何，原点为零
    pub fn new(dims: [usize; 3], spacing: Vec3) -> Self {
        Self {
            dims,
            spacing,
            origin: Vec3::ZERO,
        }
    }

    /// 设置原点
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    /// 体素总数
    pub fn num_elements(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// 行主序线性索引
    #[inline]
    pub fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dims[1] * self.dims[0]) + (y * self.dims[0]) + x
    }

    /// 各轴的物理尺寸
    pub fn physical_size(&self) -> Vec3 {
        Vec3::new(
            self.dims[0] as f32 * self.spacing.x,
            self.dims[1] as f32 * self.spacing.y,
            self.dims[2] as f32 * self.spacing.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_elements() {
        let geom = ImageGeometry::new([4, 3, 2], Vec3::ONE);
        assert_eq!(geom.num_elements(), 24);
    }

    #[test]
    fn test_linear_index_row_major() {
        let geom = ImageGeometry::new([4, 4, 4], Vec3::ONE);
        assert_eq!(geom.linear_index(0, 0, 0), 0);
        assert_eq!(geom.linear_index(1, 0, 0), 1);
        assert_eq!(geom.linear_index(0, 1, 0), 4);
        assert_eq!(geom.linear_index(0, 0, 1), 16);
        assert_eq!(geom.linear_index(2, 2, 2), 42);
    }

    #[test]
    fn test_physical_size() {
        let geom = ImageGeometry::new([4, 4, 1], Vec3::new(0.5, 0.5, 2.0));
        let size = geom.physical_size();
        assert_eq!(size.x, 2.0);
        assert_eq!(size.y, 2.0);
        assert_eq!(size.z, 2.0);
    }
}
