// crates/mv_foundation/src/lib.rs

//! MicroVox Foundation Layer
//!
//! 基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`macros`]: `ensure!` / `require!` 验证宏
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 thiserror
//! 2. **不抛出**: 过滤器边界的错误以错误码+消息记录，调用方检查
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

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod macros;

pub mod error;

// 重导出常用类型
pub use error::{MvError, MvResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{MvError, MvResult};
    pub use crate::{ensure, require};
}
