// crates/mv_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `MvError` 枚举和 `MvResult` 类型别名，用于整个项目的错误处理。
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层只定义核心错误，管线执行相关错误在 mv_pipeline 中扩展
//! 2. **易用性**: 提供便捷的构造方法
//! 3. **可记录**: 过滤器的 dataCheck 将错误转换为错误码+消息记录，不跨边界抛出
//!
//! # 示例
//!
//! ```
//! use mv_foundation::error::{MvError, MvResult};
//!
//! fn lookup(name: &str) -> MvResult<()> {
//!     Err(MvError::not_found(name))
//! }
//! ```

use thiserror::Error;

/// 统一结果类型
pub type MvResult<T> = Result<T, MvError>;

/// MicroVox 错误类型
///
/// 核心错误类型，覆盖数据模型与管线执行的全部失败模式。
#[derive(Error, Debug)]
pub enum MvError {
    /// 前置条件缺失（所需容器/矩阵/数组不存在）
    #[error("前置条件缺失: {resource}")]
    MissingPrerequisite {
        /// 缺失的资源描述
        resource: String,
    },

    /// 名称重复（在已有名称上创建）
    #[error("名称重复: {name}")]
    DuplicateName {
        /// 冲突的名称
        name: String,
    },

    /// 资源未找到
    #[error("资源未找到: {resource}")]
    NotFound {
        /// 资源名称
        resource: String,
    },

    /// 类型不匹配（数组存在但元素类型或分量数不符）
    #[error("类型不匹配: {name} 期望{expected}, 实际{actual}")]
    TypeMismatch {
        /// 数组名称
        name: String,
        /// 期望的类型描述
        expected: String,
        /// 实际的类型描述
        actual: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: String,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    OutOfRange {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 参数无效（参数值违反域约束，例如非正间距）
    #[error("参数无效: {name}={value}, 原因: {reason}")]
    InvalidParameter {
        /// 参数名
        name: String,
        /// 参数值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    /// 缺少必需的参数
    #[error("缺少必需的参数: {key}")]
    MissingParameter {
        /// 参数键名
        key: String,
    },

    /// 任务取消
    #[error("任务取消")]
    Cancelled,

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl MvError {
    /// 前置条件缺失
    pub fn missing_prerequisite(resource: impl Into<String>) -> Self {
        Self::MissingPrerequisite {
            resource: resource.into(),
        }
    }

    /// 名称重复
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// 资源未找到
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// 类型不匹配
    pub fn type_mismatch(
        name: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn out_of_range(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::OutOfRange {
            index_type,
            index,
            len,
        }
    }

    /// 参数无效
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 缺少参数
    pub fn missing_parameter(key: impl Into<String>) -> Self {
        Self::MissingParameter { key: key.into() }
    }

    /// 从IO错误创建
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl MvError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &str, expected: usize, actual: usize) -> MvResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> MvResult<()> {
        if index >= len {
            Err(Self::out_of_range(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for MvError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 测试
// ========================================================================
