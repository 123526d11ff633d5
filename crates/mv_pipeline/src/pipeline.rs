// crates/mv_pipeline/src/pipeline.rs

//! 管线执行器
//!
//! 按顺序运行过滤器：先 preflight 趟整体校验，再 execute 趟执行。
//!
//! # 执行语义
//!
//! - preflight 趟对每个过滤器都运行（即使前面已有致命错误），
//!   以最大化诊断收益；整体以第一个致命错误标记为不可运行。
//! - execute 趟在第一个致命错误或取消处立即停止，不运行剩余
//!   过滤器；已写入注册表的部分结果不回滚（非事务性，是刻意的
//!   简化取舍）。
//! - 取消是协作式的：过滤器在外层循环边界轮询取消标志。

use crate::filter::{Filter, FilterContext, FilterState, CODE_CANCELLED};
use crate::message::{MessageDispatcher, PipelineMessage};
use mv_data::container_array::DataContainerArray;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// 管线运行ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    /// 创建新的运行ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// 获取内部UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一趟管线运行的结果报告
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// 运行ID
    pub run_id: RunId,
    /// 是否全部完成（preflight 趟：无致命错误；execute 趟：未中断）
    pub completed: bool,
    /// 是否被取消
    pub cancelled: bool,
    /// 第一个致命错误 (过滤器标签, 错误码)
    pub first_error: Option<(String, i32)>,
    /// 本趟累积的全部消息（含非致命警告）
    pub messages: Vec<PipelineMessage>,
    /// 实际运行的过滤器数量
    pub filters_run: usize,
}

impl PipelineReport {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            completed: false,
            cancelled: false,
            first_error: None,
            messages: Vec::new(),
            filters_run: 0,
        }
    }

    /// 首个致命错误码（无错误为 0）
    pub fn first_error_code(&self) -> i32 {
        self.first_error.as_ref().map(|(_, code)| *code).unwrap_or(0)
    }
}

/// 过滤器管线
pub struct Pipeline {
    name: String,
    filters: Vec<Box<dyn Filter>>,
    states: Vec<FilterState>,
    cancel: Arc<AtomicBool>,
    dispatcher: Arc<MessageDispatcher>,
}

impl Pipeline {
    /// 创建空管线
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            states: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            dispatcher: Arc::new(MessageDispatcher::new()),
        }
    }

    /// 管线名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 追加过滤器
    pub fn push_filter(&mut self, filter: Box<dyn Filter>) {
        self.filters.push(filter);
        self.states.push(FilterState::Ready);
    }

    /// 链式追加过滤器
    pub fn with_filter(mut self, filter: Box<dyn Filter>) -> Self {
        self.push_filter(filter);
        self
    }

    /// 过滤器数量
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// 过滤器列表
    pub fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    /// 各过滤器的当前状态
    pub fn states(&self) -> &[FilterState] {
        &self.states
    }

    /// 消息分发器
    pub fn dispatcher(&self) -> &Arc<MessageDispatcher> {
        &self.dispatcher
    }

    /// 请求取消
    ///
    /// 正在运行的过滤器会在下一个循环边界停止。
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// 取消标志（供宿主跨线程持有）
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// preflight 趟
    ///
    /// 依次对每个过滤器运行 preflight（结构干跑），不跳过任何
    /// 过滤器；返回的报告以第一个致命错误标记整体可运行性。
    /// preflight 会结构性修改注册表（占位数组），调用方应传入
    /// 可丢弃的副本。
    pub fn preflight(&mut self, dca: &mut DataContainerArray) -> PipelineReport {
        let run_id = RunId::new();
        let mut report = PipelineReport::new(run_id);

        tracing::debug!("Pipeline '{}' preflight pass ({})", self.name, run_id);

        for (i, filter) in self.filters.iter_mut().enumerate() {
            self.states[i] = FilterState::Preflighting;
            let mut ctx = FilterContext::new(
                filter.human_label(),
                self.cancel.clone(),
                self.dispatcher.clone(),
            );
            filter.preflight(dca, &mut ctx);
            self.states[i] = FilterState::Ready;

            report.filters_run += 1;
            if ctx.has_fatal_error() && report.first_error.is_none() {
                report.first_error = Some((filter.human_label().to_string(), ctx.error_code()));
            }
            report.messages.extend(ctx.take_messages());
        }

        report.completed = report.first_error.is_none();
        if !report.completed {
            tracing::warn!(
                "Pipeline '{}' preflight failed: {:?}",
                self.name,
                report.first_error
            );
        }
        report
    }

    /// execute 趟
    ///
    /// 依次运行每个过滤器，在第一个致命错误或取消处停止。
    pub fn execute(&mut self, dca: &mut DataContainerArray) -> PipelineReport {
        let run_id = RunId::new();
        let mut report = PipelineReport::new(run_id);
        self.cancel.store(false, Ordering::SeqCst);

        tracing::info!(
            "Pipeline '{}' execute pass started ({}, {} filters)",
            self.name,
            run_id,
            self.filters.len()
        );
        self.dispatcher.emit(&PipelineMessage::status(
            self.name.clone(),
            format!("Pipeline started ({})", run_id),
        ));

        for (i, filter) in self.filters.iter_mut().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }

            self.states[i] = FilterState::Executing;
            self.dispatcher.emit(&PipelineMessage::status(
                filter.human_label(),
                "Filter started",
            ));
            let mut ctx = FilterContext::new(
                filter.human_label(),
                self.cancel.clone(),
                self.dispatcher.clone(),
            );
            filter.execute(dca, &mut ctx);
            report.filters_run += 1;

            let fatal = ctx.has_fatal_error();
            let code = ctx.error_code();
            report.messages.extend(ctx.take_messages());

            // 协作取消以 -1 码记录，优先于失败归类
            if code == CODE_CANCELLED {
                self.states[i] = FilterState::Ready;
                report.cancelled = true;
                break;
            }

            if fatal {
                self.states[i] = FilterState::Failed;
                report.first_error = Some((filter.human_label().to_string(), code));
                tracing::error!(
                    "Pipeline '{}' stopped: filter '{}' failed with code {}",
                    self.name,
                    filter.human_label(),
                    code
                );
                break;
            }
            self.states[i] = FilterState::Completed;
            self.dispatcher.emit(&PipelineMessage::status(
                filter.human_label(),
                "Filter completed",
            ));

            if self.cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }
        }

        report.completed = !report.cancelled && report.first_error.is_none();
        let outcome = if report.completed {
            tracing::info!("Pipeline '{}' completed ({})", self.name, run_id);
            "completed"
        } else if report.cancelled {
            tracing::info!("Pipeline '{}' cancelled ({})", self.name, run_id);
            "cancelled"
        } else {
            "failed"
        };
        self.dispatcher.emit(&PipelineMessage::status(
            self.name.clone(),
            format!("Pipeline {} ({})", outcome, run_id),
        ));
        report
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("num_filters", &self.filters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::params::ParameterSet;
    use mv_foundation::error::MvResult;

    /// 记录调用并可配置失败的测试过滤器
    struct ScriptedFilter {
        label: &'static str,
        fail_execute: bool,
        preflights: usize,
        executes: usize,
    }

    impl ScriptedFilter {
        fn new(label: &'static str, fail_execute: bool) -> Self {
            Self {
                label,
                fail_execute,
                preflights: 0,
                executes: 0,
            }
        }
    }

    impl Filter for ScriptedFilter {
        fn class_name(&self) -> &'static str {
            "Scripted"
        }

        fn human_label(&self) -> &'static str {
            self.label
        }

        fn set_parameters(&mut self, _params: &ParameterSet) -> MvResult<()> {
            Ok(())
        }

        fn parameters(&self) -> ParameterSet {
            ParameterSet::new()
        }

        fn data_check(&mut self, _dca: &mut DataContainerArray, _ctx: &mut FilterContext) {}

        fn preflight(&mut self, dca: &mut DataContainerArray, ctx: &mut FilterContext) {
            self.preflights += 1;
            self.data_check(dca, ctx);
        }

        fn execute(&mut self, _dca: &mut DataContainerArray, ctx: &mut FilterContext) {
            self.executes += 1;
            if self.fail_execute {
                ctx.set_error(-999, "intentional failure");
            }
        }
    }

    #[test]
    fn test_execute_stops_at_first_fatal() {
        let mut pipeline = Pipeline::new("test")
            .with_filter(Box::new(ScriptedFilter::new("F1", false)))
            .with_filter(Box::new(ScriptedFilter::new("F2", true)))
            .with_filter(Box::new(ScriptedFilter::new("F3", false)));

        let mut dca = DataContainerArray::new();
        let report = pipeline.execute(&mut dca);

        assert!(!report.completed);
        assert_eq!(report.filters_run, 2);
        assert_eq!(
            report.first_error,
            Some(("F2".to_string(), -999))
        );
        assert_eq!(pipeline.states()[1], FilterState::Failed);
        assert_eq!(pipeline.states()[2], FilterState::Ready);
    }

    #[test]
    fn test_preflight_visits_all_filters() {
        let mut pipeline = Pipeline::new("test")
            .with_filter(Box::new(ScriptedFilter::new("F1", false)))
            .with_filter(Box::new(ScriptedFilter::new("F2", true)))
            .with_filter(Box::new(ScriptedFilter::new("F3", false)));

        let mut dca = DataContainerArray::new();
        let report = pipeline.preflight(&mut dca);

        // ScriptedFilter 的 preflight 不报错，三个都应运行
        assert!(report.completed);
        assert_eq!(report.filters_run, 3);
    }

    #[test]
    fn test_cancel_before_execute() {
        let mut pipeline =
            Pipeline::new("test").with_filter(Box::new(ScriptedFilter::new("F1", false)));

        let mut dca = DataContainerArray::new();
        // cancel 在 execute 开头被重置，随后正常运行
        pipeline.cancel();
        let report = pipeline.execute(&mut dca);
        assert!(report.completed);
    }

    /// execute 中途自行请求取消的过滤器
    struct SelfCancelFilter;

    impl Filter for SelfCancelFilter {
        fn class_name(&self) -> &'static str {
            "SelfCancel"
        }

        fn human_label(&self) -> &'static str {
            "SelfCancel"
        }

        fn set_parameters(&mut self, _params: &ParameterSet) -> MvResult<()> {
            Ok(())
        }

        fn parameters(&self) -> ParameterSet {
            ParameterSet::new()
        }

        fn data_check(&mut self, _dca: &mut DataContainerArray, _ctx: &mut FilterContext) {}

        fn execute(&mut self, _dca: &mut DataContainerArray, ctx: &mut FilterContext) {
            ctx.set_error(CODE_CANCELLED, "stop requested");
        }
    }

    #[test]
    fn test_execute_emits_filter_lifecycle_messages() {
        let mut pipeline = Pipeline::new("test")
            .with_filter(Box::new(ScriptedFilter::new("F1", false)))
            .with_filter(Box::new(ScriptedFilter::new("F2", false)));
        let collector = Arc::new(crate::message::CollectingListener::new());
        pipeline.dispatcher().add_listener(collector.clone());

        let mut dca = DataContainerArray::new();
        let report = pipeline.execute(&mut dca);
        assert!(report.completed);

        let seen: Vec<(String, String)> = collector
            .messages()
            .iter()
            .map(|m| (m.filter.clone(), m.text.clone()))
            .collect();
        assert!(seen.iter().any(|(f, t)| f == "test" && t.starts_with("Pipeline started")));
        for label in ["F1", "F2"] {
            assert!(seen.iter().any(|(f, t)| f == label && t == "Filter started"));
            assert!(seen.iter().any(|(f, t)| f == label && t == "Filter completed"));
        }
        assert!(seen.iter().any(|(f, t)| f == "test" && t.starts_with("Pipeline completed")));
    }

    #[test]
    fn test_self_cancel_classified_as_cancelled() {
        let mut pipeline = Pipeline::new("test")
            .with_filter(Box::new(SelfCancelFilter))
            .with_filter(Box::new(ScriptedFilter::new("F2", false)));
        let collector = Arc::new(crate::message::CollectingListener::new());
        pipeline.dispatcher().add_listener(collector.clone());

        let mut dca = DataContainerArray::new();
        let report = pipeline.execute(&mut dca);

        // -1 码归类为取消而非失败，后续过滤器不运行
        assert!(report.cancelled);
        assert!(!report.completed);
        assert_eq!(report.first_error, None);
        assert_eq!(report.filters_run, 1);
        assert_eq!(pipeline.states()[0], FilterState::Ready);
        assert!(collector
            .messages()
            .iter()
            .any(|m| m.filter == "test" && m.text.starts_with("Pipeline cancelled")));
    }
}
