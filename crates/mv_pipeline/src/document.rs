// crates/mv_pipeline/src/document.rs

//! 管线文档
//!
//! 持久化的管线描述：(过滤器类型标识, 参数集) 的有序列表。
//! 加载时按注册表实例化过滤器并应用参数，保存时序列化当前
//! 参数值。

use crate::params::ParameterSet;
use crate::pipeline::Pipeline;
use crate::registry::FilterRegistry;
use mv_foundation::error::{MvError, MvResult};
use serde::{Deserialize, Serialize};

/// 文档中的单个过滤器条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    /// 过滤器类型标识
    pub filter: String,
    /// 参数集
    pub parameters: ParameterSet,
}

/// 管线文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDocument {
    /// 管线名称
    pub name: String,
    /// 有序过滤器条目
    pub filters: Vec<FilterEntry>,
}

impl PipelineDocument {
    /// 创建空文档
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
        }
    }

    /// 追加条目
    pub fn push(&mut self, filter: impl Into<String>, parameters: ParameterSet) {
        self.filters.push(FilterEntry {
            filter: filter.into(),
            parameters,
        });
    }

    /// 从运行中的管线导出
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let mut doc = Self::new(pipeline.name());
        for filter in pipeline.filters() {
            doc.push(filter.class_name(), filter.parameters());
        }
        doc
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> MvResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MvError::serialization(e.to_string()))
    }

    /// 从 JSON 反序列化
    pub fn from_json(json: &str) -> MvResult<Self> {
        serde_json::from_str(json).map_err(|e| MvError::serialization(e.to_string()))
    }

    /// 按注册表实例化管线
    ///
    /// 未注册的类型标识返回未找到错误。
    pub fn instantiate(&self, registry: &FilterRegistry) -> MvResult<Pipeline> {
        let mut pipeline = Pipeline::new(self.name.clone());
        for entry in &self.filters {
            let mut filter = registry.create(&entry.filter)?;
            filter.set_parameters(&entry.parameters)?;
            pipeline.push_filter(filter);
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, FilterContext};
    use mv_data::container_array::DataContainerArray;
    use crate::params::ParameterValue;

    struct EchoFilter {
        value: i64,
    }

    impl EchoFilter {
        fn new() -> Self {
            Self { value: 0 }
        }
    }

    impl Filter for EchoFilter {
        fn class_name(&self) -> &'static str {
            "Echo"
        }

        fn human_label(&self) -> &'static str {
            "Echo"
        }

        fn set_parameters(&mut self, params: &ParameterSet) -> MvResult<()> {
            self.value = params.get_int("Value")?;
            Ok(())
        }

        fn parameters(&self) -> ParameterSet {
            ParameterSet::new().with("Value", ParameterValue::Int(self.value))
        }

        fn data_check(&mut self, _dca: &mut DataContainerArray, _ctx: &mut FilterContext) {}

        fn execute(&mut self, _dca: &mut DataContainerArray, _ctx: &mut FilterContext) {}
    }

    fn registry() -> FilterRegistry {
        let mut r = FilterRegistry::new();
        r.register("Echo", || Box::new(EchoFilter::new())).unwrap();
        r
    }

    #[test]
    fn test_document_roundtrip() {
        let mut doc = PipelineDocument::new("resample");
        doc.push("Echo", ParameterSet::new().with("Value", ParameterValue::Int(42)));

        let json = doc.to_json().unwrap();
        let back = PipelineDocument::from_json(&json).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn test_instantiate_applies_parameters() {
        let mut doc = PipelineDocument::new("p");
        doc.push("Echo", ParameterSet::new().with("Value", ParameterValue::Int(7)));

        let pipeline = doc.instantiate(&registry()).unwrap();
        assert_eq!(pipeline.len(), 1);
        assert_eq!(
            pipeline.filters()[0].parameters().get_int("Value").unwrap(),
            7
        );
    }

    #[test]
    fn test_instantiate_unknown_filter() {
        let mut doc = PipelineDocument::new("p");
        doc.push("Unknown", ParameterSet::new());
        assert!(matches!(
            doc.instantiate(&registry()),
            Err(MvError::NotFound { .. })
        ));
    }

    #[test]
    fn test_save_restores_live_values() {
        let mut doc = PipelineDocument::new("p");
        doc.push("Echo", ParameterSet::new().with("Value", ParameterValue::Int(3)));
        let pipeline = doc.instantiate(&registry()).unwrap();

        let saved = PipelineDocument::from_pipeline(&pipeline);
        assert_eq!(saved.filters.len(), 1);
        assert_eq!(saved.filters[0].parameters.get_int("Value").unwrap(), 3);
    }
}
