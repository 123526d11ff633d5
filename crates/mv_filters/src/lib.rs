// crates/mv_filters/src/lib.rs

//! MicroVox 内置过滤器
//!
//! - [`resample`]: 分辨率变更重采样（点采样 + 可选特征重编号）
//! - [`find_num_features`]: 按相统计特征数量
//!
//! [`register_builtin`] 把全部内置过滤器注册到工厂注册表，管线文档
//! 反序列化时按类型标识实例化。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod find_num_features;
pub mod resample;

pub use find_num_features::FindNumFeatures;
pub use resample::ResampleImage;

use mv_foundation::error::MvResult;
use mv_pipeline::registry::FilterRegistry;

/// 注册全部内置过滤器
pub fn register_builtin(registry: &mut FilterRegistry) -> MvResult<()> {
    registry.register(resample::CLASS_NAME, || {
        Box::new(ResampleImage::default())
    })?;
    registry.register(find_num_features::CLASS_NAME, || {
        Box::new(FindNumFeatures::default())
    })?;
    tracing::debug!("Registered {} built-in filters", registry.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builtin() {
        let mut registry = FilterRegistry::new();
        register_builtin(&mut registry).unwrap();
        assert!(registry.contains("ResampleImage"));
        assert!(registry.contains("FindNumFeatures"));

        let filter = registry.create("ResampleImage").unwrap();
        assert_eq!(filter.class_name(), "ResampleImage");
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = FilterRegistry::new();
        register_builtin(&mut registry).unwrap();
        assert!(register_builtin(&mut registry).is_err());
    }
}
