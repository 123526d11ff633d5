// crates/mv_filters/src/resample.rs

//! 图像重采样过滤器
//!
//! 把体素网格重采样到新的体素间距：按下取整最近邻（点采样，非插值）
//! 建立新旧索引映射，逐元组整块复制 Cell 矩阵的所有数组，随后整体
//! 替换几何与 Cell 矩阵。可选地对特征矩阵做压实重编号，丢弃重采样
//! 后不再有体素引用的特征。
//!
//! # 算法
//!
//! 1. 新维度 `N'_axis = floor(D_axis * R_axis / R'_axis)`，各轴下限 1。
//! 2. 新体素 (i,j,k) 的物理坐标除以旧间距再下取整，线性化为旧索引。
//! 3. 每个 Cell 数组按映射逐元组复制（完整分量块）。
//! 4. 整体替换几何尺寸/间距与 Cell 矩阵。
//! 5. 重编号开启时扫描重采样后的特征号建活跃掩码，压实特征矩阵，
//!    并把特征号数组改写到新索引。
//!
//! # 取消语义
//!
//! 取消在 z 切片边界协作式轮询；取消发生在矩阵替换前，原矩阵保持
//! 不变（无部分写入暴露）。

use glam::Vec3;
use mv_data::container_array::DataContainerArray;
use mv_data::geometry::ImageGeometry;
use mv_data::matrix::AttributeMatrix;
use mv_data::path::DataArrayPath;
use mv_foundation::error::{MvError, MvResult};
use mv_pipeline::filter::{Filter, FilterContext, CODE_CANCELLED};
use mv_pipeline::params::{ParameterSet, ParameterValue};

// ============================================================================
// 错误码
// ============================================================================

/// X 间距非正
pub const CODE_BAD_SPACING_X: i32 = -5555;
/// Y 间距非正
pub const CODE_BAD_SPACING_Y: i32 = -5556;
/// Z 间距非正
pub const CODE_BAD_SPACING_Z: i32 = -5557;
/// 缺少图像几何
pub const CODE_MISSING_GEOMETRY: i32 = -300;
/// 缺少 Cell 属性矩阵
pub const CODE_MISSING_CELL_MATRIX: i32 = -301;
/// 缺少特征号数组
pub const CODE_MISSING_FEATURE_IDS: i32 = -302;
/// 缺少特征属性矩阵
pub const CODE_MISSING_FEATURE_MATRIX: i32 = -303;
/// 容器复制失败
pub const CODE_DUPLICATE_FAILED: i32 = -304;
/// 特征数量为零
pub const CODE_ZERO_FEATURES: i32 = -600;
/// 特征号超出特征矩阵范围
pub const CODE_FEATURE_ID_RANGE: i32 = -601;
/// 执行期结构性失败
pub const CODE_INTERNAL: i32 = -5550;

/// 注册表键
pub const CLASS_NAME: &str = "ResampleImage";

// ============================================================================
// 参数
// ============================================================================

/// 图像重采样过滤器
///
/// 参数键：`Spacing` (floatvec3)、`RenumberFeatures` (bool)、
/// `ReserveBackground` (bool)、`SaveAsNewContainer` (bool)、
/// `NewContainerName` (str)、`CellMatrixPath` (path)、
/// `FeatureMatrixPath` (path)、`FeatureIdsPath` (path)。
#[derive(Debug, Clone)]
pub struct ResampleImage {
    spacing: Vec3,
    renumber_features: bool,
    reserve_background: bool,
    save_as_new_container: bool,
    new_container_name: String,
    cell_matrix_path: DataArrayPath,
    feature_matrix_path: DataArrayPath,
    feature_ids_path: DataArrayPath,
}

impl Default for ResampleImage {
    fn default() -> Self {
        Self {
            spacing: Vec3::ONE,
            renumber_features: false,
            reserve_background: true,
            save_as_new_container: false,
            new_container_name: "ResampledDataContainer".to_string(),
            cell_matrix_path: DataArrayPath::new("ImageDataContainer", "CellData", ""),
            feature_matrix_path: DataArrayPath::new("ImageDataContainer", "CellFeatureData", ""),
            feature_ids_path: DataArrayPath::new("ImageDataContainer", "CellData", "FeatureIds"),
        }
    }
}

impl ResampleImage {
    /// 目标容器名：另存为新容器时为新名称，否则为 Cell 路径上的容器
    fn target_container(&self) -> &str {
        if self.save_as_new_container {
            &self.new_container_name
        } else {
            &self.cell_matrix_path.container
        }
    }

    fn run_resample(
        &mut self,
        dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> MvResult<()> {
        let target = self.target_container().to_string();
        let geom = dca.get_container(&target)?.geometry().cloned().ok_or_else(
            || MvError::missing_prerequisite(format!("ImageGeometry in '{}'", target)),
        )?;

        // 间距已相等则无事可做
        if geom.spacing == self.spacing {
            return Ok(());
        }

        let new_dims = compute_new_dims(&geom, self.spacing);
        let total_points = new_dims[0] * new_dims[1] * new_dims[2];

        // 新索引 -> 旧索引的点采样映射，逐 z 切片轮询取消
        let mut index_map = vec![0usize; total_points];
        for i in 0..new_dims[2] {
            if ctx.is_cancelled() {
                ctx.record::<()>(CODE_CANCELLED, Err(MvError::Cancelled));
                return Ok(());
            }
            let progress = ((i as f32 / new_dims[2] as f32) * 100.0) as usize;
            ctx.status(format!("Changing Resolution || {}% Complete", progress));
            for j in 0..new_dims[1] {
                for k in 0..new_dims[0] {
                    let x = k as f32 * self.spacing.x;
                    let y = j as f32 * self.spacing.y;
                    let z = i as f32 * self.spacing.z;
                    let col = (x / geom.spacing.x) as usize;
                    let row = (y / geom.spacing.y) as usize;
                    let plane = (z / geom.spacing.z) as usize;
                    let index_old = geom.linear_index(col, row, plane);
                    let index = (i * new_dims[0] * new_dims[1]) + (j * new_dims[0]) + k;
                    index_map[index] = index_old;
                }
            }
        }

        ctx.status("Copying Data...");

        let dc = dca.get_container_mut(&target)?;
        let cell = dc.get_matrix(&self.cell_matrix_path.matrix)?;
        let mut new_cell = AttributeMatrix::new(
            cell.name(),
            cell.matrix_type(),
            vec![new_dims[0], new_dims[1], new_dims[2]],
        );
        for name in cell.array_names() {
            let src = cell.get_array(&name)?;
            let mut dst = src.create_compatible(total_points);
            for (new_idx, &old_idx) in index_map.iter().enumerate() {
                dst.copy_tuple(new_idx, src, old_idx)?;
            }
            new_cell.add_array(dst)?;
        }

        if let Some(g) = dc.geometry_mut() {
            g.dims = new_dims;
            g.spacing = self.spacing;
        }
        dc.replace_matrix(new_cell);

        if self.renumber_features {
            self.renumber(dca, &target, ctx)?;
        }

        ctx.status("Complete");
        Ok(())
    }

    /// 压实特征矩阵并改写特征号数组
    ///
    /// 只有重采样后仍有体素引用的特征保留；背景元组（索引 0）是否
    /// 强制保留由 `ReserveBackground` 参数决定。
    fn renumber(
        &mut self,
        dca: &mut DataContainerArray,
        target: &str,
        ctx: &mut FilterContext,
    ) -> MvResult<()> {
        let dc = dca.get_container_mut(target)?;

        let total_features = dc
            .get_matrix(&self.feature_matrix_path.matrix)?
            .num_tuples();
        if total_features == 0 {
            ctx.set_error(
                CODE_ZERO_FEATURES,
                "The number of Features is 0 and should be greater than 0",
            );
            return Ok(());
        }

        // 旧特征号数组已在复制循环中被替换，这里重新查找
        let mut active = vec![false; total_features];
        if self.reserve_background {
            active[0] = true;
        }
        {
            let ids = dc
                .get_matrix(&self.cell_matrix_path.matrix)?
                .get_typed::<i32>(&self.feature_ids_path.array)?;
            for &id in ids.as_slice() {
                if id < 0 || id as usize >= total_features {
                    ctx.set_error(
                        CODE_FEATURE_ID_RANGE,
                        format!(
                            "Feature id {} is outside the feature matrix range [0, {})",
                            id, total_features
                        ),
                    );
                    return Ok(());
                }
                active[id as usize] = true;
            }
        }

        let remap = dc
            .get_matrix_mut(&self.feature_matrix_path.matrix)?
            .remove_inactive(&active)?;

        let ids = dc
            .get_matrix_mut(&self.cell_matrix_path.matrix)?
            .get_typed_mut::<i32>(&self.feature_ids_path.array)?;
        for id in ids.as_slice_mut() {
            *id = remap[*id as usize];
        }
        Ok(())
    }
}

// ============================================================================
// 几何计算
// ============================================================================

/// 新间距下的网格维度：`floor(dims * res / new_res)`，各轴下限 1
pub fn compute_new_dims(geom: &ImageGeometry, new_spacing: Vec3) -> [usize; 3] {
    let size = geom.physical_size();
    let xp = ((size.x / new_spacing.x) as usize).max(1);
    let yp = ((size.y / new_spacing.y) as usize).max(1);
    let zp = ((size.z / new_spacing.z) as usize).max(1);
    [xp, yp, zp]
}

// ============================================================================
// Filter 实现
// ============================================================================

impl Filter for ResampleImage {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn human_label(&self) -> &'static str {
        "Resample Image"
    }

    fn group(&self) -> &'static str {
        "Sampling"
    }

    fn set_parameters(&mut self, params: &ParameterSet) -> MvResult<()> {
        if params.contains("Spacing") {
            self.spacing = Vec3::from_array(params.get_float_vec3("Spacing")?);
        }
        self.renumber_features = params.get_bool_or("RenumberFeatures", self.renumber_features)?;
        self.reserve_background =
            params.get_bool_or("ReserveBackground", self.reserve_background)?;
        self.save_as_new_container =
            params.get_bool_or("SaveAsNewContainer", self.save_as_new_container)?;
        self.new_container_name =
            params.get_str_or("NewContainerName", &self.new_container_name)?;
        if params.contains("CellMatrixPath") {
            self.cell_matrix_path = params.get_path("CellMatrixPath")?;
        }
        if params.contains("FeatureMatrixPath") {
            self.feature_matrix_path = params.get_path("FeatureMatrixPath")?;
        }
        if params.contains("FeatureIdsPath") {
            self.feature_ids_path = params.get_path("FeatureIdsPath")?;
        }
        Ok(())
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with("Spacing", ParameterValue::FloatVec3(self.spacing.to_array()))
            .with(
                "RenumberFeatures",
                ParameterValue::Bool(self.renumber_features),
            )
            .with(
                "ReserveBackground",
                ParameterValue::Bool(self.reserve_background),
            )
            .with(
                "SaveAsNewContainer",
                ParameterValue::Bool(self.save_as_new_container),
            )
            .with(
                "NewContainerName",
                ParameterValue::Str(self.new_container_name.clone()),
            )
            .with(
                "CellMatrixPath",
                ParameterValue::Path(self.cell_matrix_path.clone()),
            )
            .with(
                "FeatureMatrixPath",
                ParameterValue::Path(self.feature_matrix_path.clone()),
            )
            .with(
                "FeatureIdsPath",
                ParameterValue::Path(self.feature_ids_path.clone()),
            )
    }

    /// 结构校验
    ///
    /// 任何校验失败都不修改注册表：容器复制只在全部前置检查通过后
    /// 进行，重复调用时覆盖上一次的副本以保持幂等。
    fn data_check(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext) {
        ctx.clear_error();

        if self.spacing.x <= 0.0 {
            ctx.set_error(
                CODE_BAD_SPACING_X,
                format!("The X spacing ({}) must be positive", self.spacing.x),
            );
        }
        if self.spacing.y <= 0.0 {
            ctx.set_error(
                CODE_BAD_SPACING_Y,
                format!("The Y spacing ({}) must be positive", self.spacing.y),
            );
        }
        if self.spacing.z <= 0.0 {
            ctx.set_error(
                CODE_BAD_SPACING_Z,
                format!("The Z spacing ({}) must be positive", self.spacing.z),
            );
        }

        ctx.record(
            CODE_MISSING_GEOMETRY,
            dca.prereq_geometry(&self.cell_matrix_path.container).map(|_| ()),
        );
        ctx.record(
            CODE_MISSING_CELL_MATRIX,
            dca.prereq_matrix(&self.cell_matrix_path).map(|_| ()),
        );

        if self.renumber_features {
            ctx.record(
                CODE_MISSING_FEATURE_MATRIX,
                dca.prereq_matrix(&self.feature_matrix_path).map(|_| ()),
            );
            ctx.record(
                CODE_MISSING_FEATURE_IDS,
                dca.prereq_array::<i32>(&self.feature_ids_path, 1).map(|_| ()),
            );
            // 特征 ID 必须挂在被重采样的 Cell 矩阵下，否则重编号改写不到它
            if self.feature_ids_path.matrix_path() != self.cell_matrix_path {
                ctx.warn(
                    0,
                    format!(
                        "FeatureIds array '{}' is outside the resampled cell matrix '{}'",
                        self.feature_ids_path, self.cell_matrix_path
                    ),
                );
            }
        }

        if self.save_as_new_container && !ctx.has_fatal_error() {
            // preflight 重复调用时覆盖旧副本
            if dca.has_container(&self.new_container_name) {
                let _ = dca.remove_container(&self.new_container_name);
            }
            ctx.record(
                CODE_DUPLICATE_FAILED,
                dca.duplicate_container(
                    &self.cell_matrix_path.container,
                    &self.new_container_name,
                ),
            );
        }
    }

    /// 干跑
    ///
    /// 计算新维度并用零填充的占位 Cell 矩阵整体替换，更新几何；
    /// 重编号开启时对特征矩阵做全活跃的压实干跑。下游过滤器由此
    /// 看到与 execute 相同的结构。
    fn preflight(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext) {
        self.data_check(dca, ctx);
        if ctx.has_fatal_error() {
            return;
        }

        let target = self.target_container().to_string();
        let result: MvResult<()> = (|| {
            let dc = dca.get_container_mut(&target)?;
            let geom = dc.geometry().cloned().ok_or_else(|| {
                MvError::missing_prerequisite(format!(
                    "ImageGeometry in '{}'",
                    target
                ))
            })?;
            let new_dims = compute_new_dims(&geom, self.spacing);
            let total_points = new_dims[0] * new_dims[1] * new_dims[2];

            if let Some(g) = dc.geometry_mut() {
                g.dims = new_dims;
                g.spacing = self.spacing;
            }

            let cell = dc.get_matrix(&self.cell_matrix_path.matrix)?;
            let mut new_cell = AttributeMatrix::new(
                cell.name(),
                cell.matrix_type(),
                vec![new_dims[0], new_dims[1], new_dims[2]],
            );
            for name in cell.array_names() {
                let placeholder = cell.get_array(&name)?.create_compatible(total_points);
                new_cell.add_array(placeholder)?;
            }
            dc.replace_matrix(new_cell);

            if self.renumber_features {
                if let Ok(features) = dc.get_matrix_mut(&self.feature_matrix_path.matrix) {
                    let all_active = vec![true; features.num_tuples()];
                    features.remove_inactive(&all_active)?;
                }
            }
            Ok(())
        })();
        ctx.record(CODE_INTERNAL, result);
    }

    fn execute(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext) {
        ctx.clear_error();
        self.data_check(dca, ctx);
        if ctx.has_fatal_error() {
            return;
        }
        let result = self.run_resample(dca, ctx);
        ctx.record(CODE_INTERNAL, result);
    }
}
