// crates/mv_pipeline/src/lib.rs

//! MicroVox 管线执行核心
//!
//! 提供过滤器协议与顺序执行器：
//!
//! - [`filter`]: `Filter` trait、执行上下文与状态机
//! - [`message`]: 消息类型与监听器/分发器
//! - [`params`]: 带类型参数集（参数源边界）
//! - [`registry`]: 类型标识到工厂的注册表
//! - [`pipeline`]: preflight/execute 两趟执行器
//! - [`document`]: 可持久化的管线描述
//!
//! # 执行模型
//!
//! 单线程同步：一条管线内过滤器严格顺序执行，注册表同一时刻只有
//! 一个写者。并发运行多条管线时各管线必须持有独立的注册表。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod filter;
pub mod message;
pub mod params;
pub mod pipeline;
pub mod registry;

pub use document::{FilterEntry, PipelineDocument};
pub use filter::{Filter, FilterContext, FilterState, CODE_CANCELLED};
pub use message::{
    CollectingListener, FnListener, LoggingListener, MessageDispatcher, MessageListener,
    PipelineMessage, Severity,
};
pub use params::{ParameterSet, ParameterValue};
pub use pipeline::{Pipeline, PipelineReport, RunId};
pub use registry::{FilterFactory, FilterRegistry};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::document::PipelineDocument;
    pub use crate::filter::{Filter, FilterContext, FilterState};
    pub use crate::message::{MessageDispatcher, MessageListener, PipelineMessage, Severity};
    pub use crate::params::{ParameterSet, ParameterValue};
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use crate::registry::FilterRegistry;
}
