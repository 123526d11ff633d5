// crates/mv_pipeline/src/registry.rs

//! 过滤器注册表
//!
//! 类型标识到工厂函数的映射，管线文档反序列化时按标识实例化
//! 过滤器。

use crate::filter::Filter;
use mv_foundation::error::{MvError, MvResult};
use std::collections::BTreeMap;

/// 过滤器工厂函数
pub type FilterFactory = fn() -> Box<dyn Filter>;

/// 过滤器注册表
#[derive(Default)]
pub struct FilterRegistry {
    factories: BTreeMap<&'static str, FilterFactory>,
}

impl FilterRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工厂
    ///
    /// 同名重复注册返回名称重复错误。
    pub fn register(&mut self, class_name: &'static str, factory: FilterFactory) -> MvResult<()> {
        if self.factories.contains_key(class_name) {
            return Err(MvError::duplicate_name(class_name));
        }
        self.factories.insert(class_name, factory);
        Ok(())
    }

    /// 按类型标识实例化
    pub fn create(&self, class_name: &str) -> MvResult<Box<dyn Filter>> {
        let factory = self
            .factories
            .get(class_name)
            .ok_or_else(|| MvError::not_found(format!("Filter '{}'", class_name)))?;
        Ok(factory())
    }

    /// 是否已注册
    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    /// 已注册的类型标识列表
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// 已注册数量
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("names", &self.names())
            .finish()
    }
}
