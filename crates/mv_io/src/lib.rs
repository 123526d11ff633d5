// crates/mv_io/src/lib.rs

//! MicroVox 数组存储边界
//!
//! 核心与持久化格式之间的窄接口：[`store::ArrayStore`] 按键读写
//! 带形状的命名数组。内存实现用于测试与暂存，文件实现提供最简
//! 的磁盘格式（原始字节 + JSON 元数据）。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod store;

pub use store::{ArrayStore, FileStore, MemoryStore};
