// crates/mv_pipeline/src/params.rs

//! 参数源模块
//!
//! 过滤器的只读配置来源：命名的带类型值集合。核心不关心这些值
//! 如何被填充（CLI、GUI 或 JSON 管线文件）。

use mv_data::path::DataArrayPath;
use mv_foundation::error::{MvError, MvResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 带类型参数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParameterValue {
    /// 布尔
    Bool(bool),
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    Str(String),
    /// 三分量整数向量
    IntVec3([i64; 3]),
    /// 三分量浮点向量
    FloatVec3([f32; 3]),
    /// 数组路径三元组
    Path(DataArrayPath),
}

impl ParameterValue {
    /// 值的类型名
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::IntVec3(_) => "intvec3",
            Self::FloatVec3(_) => "floatvec3",
            Self::Path(_) => "path",
        }
    }
}

/// 参数集合
///
/// 键到带类型值的有序映射。带类型读取方法在键缺失或类型不符时
/// 返回错误；`*_or` 变体在键缺失时回退默认值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterSet {
    /// 创建空参数集
    pub fn new() -> Self {
        Self::default()
    }

    /// 参数数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 是否包含键
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 写入参数
    pub fn set(&mut self, key: impl Into<String>, value: ParameterValue) {
        self.values.insert(key.into(), value);
    }

    /// 链式写入参数
    pub fn with(mut self, key: impl Into<String>, value: ParameterValue) -> Self {
        self.set(key, value);
        self
    }

    /// 读取原始值
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    fn typed<T>(
        &self,
        key: &str,
        expected: &'static str,
        extract: impl Fn(&ParameterValue) -> Option<T>,
    ) -> MvResult<T> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| MvError::missing_parameter(key))?;
        extract(value).ok_or_else(|| {
            MvError::invalid_parameter(
                key,
                value.type_name(),
                format!("期望类型 {}", expected),
            )
        })
    }

    fn typed_or<T>(
        &self,
        key: &str,
        default: T,
        expected: &'static str,
        extract: impl Fn(&ParameterValue) -> Option<T>,
    ) -> MvResult<T> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => extract(value).ok_or_else(|| {
                MvError::invalid_parameter(
                    key,
                    value.type_name(),
                    format!("期望类型 {}", expected),
                )
            }),
        }
    }

    /// 读取布尔
    pub fn get_bool(&self, key: &str) -> MvResult<bool> {
        self.typed(key, "bool", |v| match v {
            ParameterValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    /// 读取布尔，缺失回退默认值
    pub fn get_bool_or(&self, key: &str, default: bool) -> MvResult<bool> {
        self.typed_or(key, default, "bool", |v| match v {
            ParameterValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    /// 读取整数
    pub fn get_int(&self, key: &str) -> MvResult<i64> {
        self.typed(key, "int", |v| match v {
            ParameterValue::Int(i) => Some(*i),
            _ => None,
        })
    }

    /// 读取浮点数
    pub fn get_float(&self, key: &str) -> MvResult<f64> {
        self.typed(key, "float", |v| match v {
            ParameterValue::Float(x) => Some(*x),
            _ => None,
        })
    }

    /// 读取字符串
    pub fn get_str(&self, key: &str) -> MvResult<String> {
        self.typed(key, "str", |v| match v {
            ParameterValue::Str(s) => Some(s.clone()),
            _ => None,
        })
    }

    /// 读取字符串，缺失回退默认值
    pub fn get_str_or(&self, key: &str, default: &str) -> MvResult<String> {
        self.typed_or(key, default.to_string(), "str", |v| match v {
            ParameterValue::Str(s) => Some(s.clone()),
            _ => None,
        })
    }

    /// 读取整数向量
    pub fn get_int_vec3(&self, key: &str) -> MvResult<[i64; 3]> {
        self.typed(key, "intvec3", |v| match v {
            ParameterValue::IntVec3(x) => Some(*x),
            _ => None,
        })
    }

    /// 读取浮点向量
    pub fn get_float_vec3(&self, key: &str) -> MvResult<[f32; 3]> {
        self.typed(key, "floatvec3", |v| match v {
            ParameterValue::FloatVec3(x) => Some(*x),
            _ => None,
        })
    }

    /// 读取数组路径
    pub fn get_path(&self, key: &str) -> MvResult<DataArrayPath> {
        self.typed(key, "path", |v| match v {
            ParameterValue::Path(p) => Some(p.clone()),
            _ => None,
        })
    }

    /// 键的迭代器（有序）
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }
}
