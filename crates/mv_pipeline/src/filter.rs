// crates/mv_pipeline/src/filter.rs

//! 过滤器协议
//!
//! 工作单元抽象：`data_check` 校验结构，`preflight` 干跑建立输出
//! 形状，`execute` 执行真实变换。
//!
//! # 错误约定
//!
//! `data_check` 把检测到的问题转换为记录在上下文中的错误码+消息，
//! 从不跨过滤器边界抛出；调用方在每次调用后检查错误码。负错误码
//! 为致命。`preflight` 不会使过滤器对象失败，只做报告。
//!
//! # 幂等性
//!
//! `preflight` 必须幂等且不得修改数组内容，只允许校验形状/类型并
//! 创建形状正确的占位输出数组，使同一趟 preflight 中的下游过滤器
//! 看到一致结构。

use crate::message::{MessageDispatcher, PipelineMessage};
use crate::params::ParameterSet;
use mv_data::container_array::DataContainerArray;
use mv_foundation::error::MvResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 取消码（协作式取消时记录）
pub const CODE_CANCELLED: i32 = -1;

/// 过滤器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// 就绪
    Ready,
    /// preflight 进行中
    Preflighting,
    /// execute 进行中
    Executing,
    /// 成功完成
    Completed,
    /// 失败（错误码保留在报告中）
    Failed,
}

impl std::fmt::Display for FilterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ready => "Ready",
            Self::Preflighting => "Preflighting",
            Self::Executing => "Executing",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

/// 过滤器执行上下文
///
/// 承载错误记录、消息发射与协作式取消。每次 `data_check`/`preflight`/
/// `execute` 调用使用新的上下文。
pub struct FilterContext {
    filter_label: String,
    error_code: i32,
    messages: Vec<PipelineMessage>,
    cancel: Arc<AtomicBool>,
    dispatcher: Arc<MessageDispatcher>,
}

impl FilterContext {
    /// 创建上下文
    pub fn new(
        filter_label: impl Into<String>,
        cancel: Arc<AtomicBool>,
        dispatcher: Arc<MessageDispatcher>,
    ) -> Self {
        Self {
            filter_label: filter_label.into(),
            error_code: 0,
            messages: Vec::new(),
            cancel,
            dispatcher,
        }
    }

    /// 独立上下文（无外部分发器，测试/单过滤器调用用）
    pub fn standalone(filter_label: impl Into<String>) -> Self {
        Self::new(
            filter_label,
            Arc::new(AtomicBool::new(false)),
            Arc::new(MessageDispatcher::new()),
        )
    }

    /// 当前错误码
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    /// 是否有致命错误（负错误码）
    pub fn has_fatal_error(&self) -> bool {
        self.error_code < 0
    }

    /// 清除错误状态（dataCheck 入口调用）
    pub fn clear_error(&mut self) {
        self.error_code = 0;
    }

    /// 本次调用累积的消息
    pub fn messages(&self) -> &[PipelineMessage] {
        &self.messages
    }

    /// 取走累积的消息
    pub fn take_messages(&mut self) -> Vec<PipelineMessage> {
        std::mem::take(&mut self.messages)
    }

    /// 记录致命错误并发射错误消息
    ///
    /// 保留第一个错误码不被后续覆盖；全部消息都会发射。
    pub fn set_error(&mut self, code: i32, text: impl Into<String>) {
        let msg = PipelineMessage::error(self.filter_label.clone(), code, text);
        if self.error_code == 0 {
            self.error_code = code;
        }
        self.dispatcher.emit(&msg);
        self.messages.push(msg);
    }

    /// 发射警告
    pub fn warn(&mut self, code: i32, text: impl Into<String>) {
        let msg = PipelineMessage::warning(self.filter_label.clone(), code, text);
        self.dispatcher.emit(&msg);
        self.messages.push(msg);
    }

    /// 发射状态消息
    pub fn status(&mut self, text: impl Into<String>) {
        let msg = PipelineMessage::status(self.filter_label.clone(), text);
        self.dispatcher.emit(&msg);
        self.messages.push(msg);
    }

    /// 把 Result 转换为记录的错误
    ///
    /// Err 时以给定错误码记录消息并返回 None。
    pub fn record<T>(&mut self, code: i32, result: MvResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.set_error(code, e.to_string());
                None
            }
        }
    }

    /// 是否已请求取消
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// 过滤器标签
    pub fn filter_label(&self) -> &str {
        &self.filter_label
    }
}

/// 过滤器trait
///
/// 每种过滤器是一个独立类型；运行期多态通过 `Box<dyn Filter>`。
/// 管线反序列化用的类型标识由注册表映射到工厂函数。
pub trait Filter: Send {
    /// 类型标识（注册表键）
    fn class_name(&self) -> &'static str;

    /// 人类可读标签（消息来源名）
    fn human_label(&self) -> &'static str;

    /// 过滤器分组
    fn group(&self) -> &'static str {
        "Core"
    }

    /// 应用参数集
    fn set_parameters(&mut self, params: &ParameterSet) -> MvResult<()>;

    /// 导出当前参数（管线保存用）
    fn parameters(&self) -> ParameterSet;

    /// 结构校验
    ///
    /// 对照数据容器注册表校验所需/创建的数组路径，记录错误码；
    /// 允许创建占位输出数组，不得修改已有数组内容。
    fn data_check(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext);

    /// 干跑
    ///
    /// 默认只运行 `data_check`；做结构性变更的过滤器需覆盖，
    /// 以便下游看到 execute 之后的形状。
    fn preflight(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext) {
        self.data_check(dca, ctx);
    }

    /// 执行变换
    ///
    /// 必须先重新运行 `data_check`（preflight 可能是独立调用，已过期），
    /// 错误状态非空时直接返回。
    fn execute(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_error_recording() {
        let mut ctx = FilterContext::standalone("Test Filter");
        assert_eq!(ctx.error_code(), 0);
        assert!(!ctx.has_fatal_error());

        ctx.set_error(-301, "missing matrix");
        assert_eq!(ctx.error_code(), -301);
        assert!(ctx.has_fatal_error());

        // 第一个错误码被保留
        ctx.set_error(-5555, "bad spacing");
        assert_eq!(ctx.error_code(), -301);
        assert_eq!(ctx.messages().len(), 2);
    }

    #[test]
    fn test_context_record_helper() {
        let mut ctx = FilterContext::standalone("Test Filter");
        let ok: MvResult<u32> = Ok(7);
        assert_eq!(ctx.record(-1, ok), Some(7));
        assert!(!ctx.has_fatal_error());

        let err: MvResult<u32> = Err(mv_foundation::MvError::not_found("x"));
        assert_eq!(ctx.record(-302, err), None);
        assert_eq!(ctx.error_code(), -302);
    }

    #[test]
    fn test_context_cancel_flag() {
        let cancel = Arc::new(AtomicBool::new(false));
        let ctx = FilterContext::new(
            "Test Filter",
            cancel.clone(),
            Arc::new(MessageDispatcher::new()),
        );
        assert!(!ctx.is_cancelled());
        cancel.store(true, Ordering::SeqCst);
        assert!(ctx.is_cancelled());
    }
}
