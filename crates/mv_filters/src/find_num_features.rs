// crates/mv_filters/src/find_num_features.rs

//! 特征数量统计过滤器
//!
//! 按相(Ensemble)统计特征数量：读取特征矩阵中每个特征的相编号，
//! 在相矩阵的输出数组中累加计数。索引 0 是背景，特征与相的第 0 号
//! 元组都不参与统计。

use mv_data::container_array::DataContainerArray;
use mv_data::DataArray;
use mv_data::path::DataArrayPath;
use mv_foundation::error::MvResult;
use mv_pipeline::filter::{Filter, FilterContext};
use mv_pipeline::params::{ParameterSet, ParameterValue};

/// 缺少特征相数组
pub const CODE_MISSING_PHASES: i32 = -301;
/// 输出数组创建失败
pub const CODE_CREATE_OUTPUT: i32 = -302;
/// 相编号超出相矩阵范围
pub const CODE_PHASE_RANGE: i32 = -303;

/// 注册表键
pub const CLASS_NAME: &str = "FindNumFeatures";

/// 特征数量统计过滤器
///
/// 参数键：`FeaturePhasesPath` (path，特征矩阵中的 i32 相编号数组)、
/// `NumFeaturesPath` (path，在相矩阵中创建的 i32 输出数组)。
#[derive(Debug, Clone)]
pub struct FindNumFeatures {
    feature_phases_path: DataArrayPath,
    num_features_path: DataArrayPath,
}

impl Default for FindNumFeatures {
    fn default() -> Self {
        Self {
            feature_phases_path: DataArrayPath::new(
                "ImageDataContainer",
                "CellFeatureData",
                "Phases",
            ),
            num_features_path: DataArrayPath::new(
                "ImageDataContainer",
                "CellEnsembleData",
                "NumFeatures",
            ),
        }
    }
}

impl FindNumFeatures {
    fn run_count(&self, dca: &mut DataContainerArray, ctx: &mut FilterContext) -> MvResult<()> {
        let phases: Vec<i32> = dca
            .prereq_array::<i32>(&self.feature_phases_path, 1)?
            .as_slice()
            .to_vec();
        let num_ensembles = dca
            .prereq_array::<i32>(&self.num_features_path, 1)?
            .num_tuples();

        let mut bins = vec![0i32; num_ensembles];
        for (feature, &phase) in phases.iter().enumerate().skip(1) {
            if phase < 0 || phase as usize >= num_ensembles {
                ctx.set_error(
                    CODE_PHASE_RANGE,
                    format!(
                        "Feature {} has phase {} outside the ensemble range [0, {})",
                        feature, phase, num_ensembles
                    ),
                );
                return Ok(());
            }
            bins[phase as usize] += 1;
        }

        let output = dca.prereq_array_mut::<i32>(&self.num_features_path, 1)?;
        output.as_slice_mut().copy_from_slice(&bins);

        ctx.status("Complete");
        Ok(())
    }
}

impl Filter for FindNumFeatures {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn human_label(&self) -> &'static str {
        "Find Number of Features"
    }

    fn group(&self) -> &'static str {
        "Statistics"
    }

    fn set_parameters(&mut self, params: &ParameterSet) -> MvResult<()> {
        if params.contains("FeaturePhasesPath") {
            self.feature_phases_path = params.get_path("FeaturePhasesPath")?;
        }
        if params.contains("NumFeaturesPath") {
            self.num_features_path = params.get_path("NumFeaturesPath")?;
        }
        Ok(())
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(
                "FeaturePhasesPath",
                ParameterValue::Path(self.feature_phases_path.clone()),
            )
            .with(
                "NumFeaturesPath",
                ParameterValue::Path(self.num_features_path.clone()),
            )
    }

    fn data_check(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext) {
        ctx.clear_error();
        ctx.record(
            CODE_MISSING_PHASES,
            dca.prereq_array::<i32>(&self.feature_phases_path, 1)
                .map(|_| ()),
        );
        // 输出数组在 preflight 阶段即建立，使下游看到一致结构
        ctx.record(
            CODE_CREATE_OUTPUT,
            dca.create_array_at_path::<i32>(&self.num_features_path, 1),
        );
    }

    fn execute(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext) {
        ctx.clear_error();
        self.data_check(dca, ctx);
        if ctx.has_fatal_error() {
            return;
        }
        let result = self.run_count(dca, ctx);
        ctx.record(CODE_CREATE_OUTPUT, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mv_data::container::DataContainer;
    use mv_data::matrix::{AttributeMatrix, AttributeMatrixType};
    use mv_data::TypedArray;

    fn build_dca(phases: Vec<i32>, num_ensembles: usize) -> DataContainerArray {
        let mut dc = DataContainer::new("ImageDataContainer");

        let mut features = AttributeMatrix::new(
            "CellFeatureData",
            AttributeMatrixType::Feature,
            vec![phases.len()],
        );
        features
            .add_array(Box::new(
                TypedArray::<i32>::from_vec("Phases", 1, phases).unwrap(),
            ))
            .unwrap();
        dc.add_matrix(features).unwrap();

        dc.add_matrix(AttributeMatrix::new(
            "CellEnsembleData",
            AttributeMatrixType::Ensemble,
            vec![num_ensembles],
        ))
        .unwrap();

        let mut dca = DataContainerArray::new();
        dca.add_container(dc).unwrap();
        dca
    }

    #[test]
    fn test_counts_features_per_phase() {
        // 特征 1..4 的相为 [1,1,2,2]，索引 0 是背景
        let mut dca = build_dca(vec![0, 1, 1, 2, 2], 3);
        let mut filter = FindNumFeatures::default();
        let mut ctx = FilterContext::standalone(filter.human_label());
        filter.execute(&mut dca, &mut ctx);

        assert_eq!(ctx.error_code(), 0);
        let out = dca
            .prereq_array::<i32>(
                &DataArrayPath::new("ImageDataContainer", "CellEnsembleData", "NumFeatures"),
                1,
            )
            .unwrap();
        assert_eq!(out.as_slice(), &[0, 2, 2]);
    }

    #[test]
    fn test_phase_out_of_range() {
        let mut dca = build_dca(vec![0, 1, 7], 3);
        let mut filter = FindNumFeatures::default();
        let mut ctx = FilterContext::standalone(filter.human_label());
        filter.execute(&mut dca, &mut ctx);
        assert_eq!(ctx.error_code(), CODE_PHASE_RANGE);
    }

    #[test]
    fn test_missing_phases_array() {
        let mut dca = build_dca(vec![0, 1], 2);
        let mut filter = FindNumFeatures::default();
        filter
            .set_parameters(&ParameterSet::new().with(
                "FeaturePhasesPath",
                ParameterValue::Path(DataArrayPath::new(
                    "ImageDataContainer",
                    "CellFeatureData",
                    "Nope",
                )),
            ))
            .unwrap();
        let mut ctx = FilterContext::standalone(filter.human_label());
        filter.data_check(&mut dca, &mut ctx);
        assert_eq!(ctx.error_code(), CODE_MISSING_PHASES);
    }

    #[test]
    fn test_preflight_creates_zero_output() {
        let mut dca = build_dca(vec![0, 1, 1], 2);
        let mut filter = FindNumFeatures::default();
        let mut ctx = FilterContext::standalone(filter.human_label());
        filter.preflight(&mut dca, &mut ctx);

        assert_eq!(ctx.error_code(), 0);
        let out = dca
            .prereq_array::<i32>(
                &DataArrayPath::new("ImageDataContainer", "CellEnsembleData", "NumFeatures"),
                1,
            )
            .unwrap();
        assert_eq!(out.num_tuples(), 2);
        assert!(out.as_slice().iter().all(|&v| v == 0));
    }
}
