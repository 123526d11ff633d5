// crates/mv_pipeline/src/message.rs

//! 消息通道模块
//!
//! 提供过滤器消息的定义和分发机制。消息纯粹是观察性的：
//! 监听器的返回值不影响控制流。

use parking_lot::RwLock;
use std::sync::Arc;

/// 消息级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// 状态/进度
    Status,
    /// 警告（不致命）
    Warning,
    /// 错误（负错误码为致命）
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Status => "Status",
            Self::Warning => "Warning",
            Self::Error => "Error",
        };
        write!(f, "{}", s)
    }
}

/// 管线消息
#[derive(Debug, Clone)]
pub struct PipelineMessage {
    /// 来源过滤器的人类可读标签
    pub filter: String,
    /// 级别
    pub severity: Severity,
    /// 错误码（0 表示无错误，负值为致命）
    pub code: i32,
    /// 消息文本
    pub text: String,
}

impl PipelineMessage {
    /// 状态消息
    pub fn status(filter: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            severity: Severity::Status,
            code: 0,
            text: text.into(),
        }
    }

    /// 警告消息
    pub fn warning(filter: impl Into<String>, code: i32, text: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            severity: Severity::Warning,
            code,
            text: text.into(),
        }
    }

    /// 错误消息
    pub fn error(filter: impl Into<String>, code: i32, text: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            severity: Severity::Error,
            code,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for PipelineMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.code != 0 {
            write!(f, "[{}] {} ({}): {}", self.severity, self.filter, self.code, self.text)
        } else {
            write!(f, "[{}] {}: {}", self.severity, self.filter, self.text)
        }
    }
}

/// 消息监听器trait
pub trait MessageListener: Send + Sync {
    /// 处理消息
    fn on_message(&self, message: &PipelineMessage);

    /// 获取监听器名称 (用于调试)
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// 函数式消息监听器
pub struct FnListener<F>
where
    F: Fn(&PipelineMessage) + Send + Sync,
{
    name: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(&PipelineMessage) + Send + Sync,
{
    /// 创建函数式监听器
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> MessageListener for FnListener<F>
where
    F: Fn(&PipelineMessage) + Send + Sync,
{
    fn on_message(&self, message: &PipelineMessage) {
        (self.handler)(message);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 日志消息监听器
///
/// 按消息级别转发到 tracing。
pub struct LoggingListener {
    /// 日志前缀
    prefix: String,
}

impl LoggingListener {
    /// 创建日志监听器
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl MessageListener for LoggingListener {
    fn on_message(&self, message: &PipelineMessage) {
        match message.severity {
            Severity::Status => tracing::info!("{}: {}", self.prefix, message),
            Severity::Warning => tracing::warn!("{}: {}", self.prefix, message),
            Severity::Error => tracing::error!("{}: {}", self.prefix, message),
        }
    }

    fn name(&self) -> &str {
        "LoggingListener"
    }
}

/// 收集消息监听器
///
/// 累积全部消息供事后检查（CLI/测试用）。
#[derive(Default)]
pub struct CollectingListener {
    messages: RwLock<Vec<PipelineMessage>>,
}

impl CollectingListener {
    /// 创建收集监听器
    pub fn new() -> Self {
        Self::default()
    }

    /// 取已收集消息的拷贝
    pub fn messages(&self) -> Vec<PipelineMessage> {
        self.messages.read().clone()
    }

    /// 已收集消息数量
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl MessageListener for CollectingListener {
    fn on_message(&self, message: &PipelineMessage) {
        self.messages.write().push(message.clone());
    }

    fn name(&self) -> &str {
        "CollectingListener"
    }
}

/// 消息分发器
#[derive(Default)]
pub struct MessageDispatcher {
    listeners: RwLock<Vec<Arc<dyn MessageListener>>>,
}

impl MessageDispatcher {
    /// 创建新的消息分发器
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// 添加监听器
    pub fn add_listener(&self, listener: Arc<dyn MessageListener>) {
        let name = listener.name().to_string();
        self.listeners.write().push(listener);
        tracing::debug!("Added message listener: {}", name);
    }

    /// 添加函数式监听器
    pub fn add_fn_listener<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&PipelineMessage) + Send + Sync + 'static,
    {
        let listener = Arc::new(FnListener::new(name, handler));
        self.add_listener(listener);
    }

    /// 移除监听器
    pub fn remove_listener(&self, listener: &Arc<dyn MessageListener>) {
        self.listeners
            .write()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// 清除所有监听器
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// 分发消息
    pub fn emit(&self, message: &PipelineMessage) {
        let listeners = self.listeners.read();
        for listener in listeners.iter() {
            listener.on_message(message);
        }
    }

    /// 获取监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatcher_fans_out() {
        let dispatcher = MessageDispatcher::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        dispatcher.add_fn_listener("test", move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.emit(&PipelineMessage::status("Resample Image", "start"));
        dispatcher.emit(&PipelineMessage::error("Resample Image", -5555, "bad spacing"));

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_collecting_listener() {
        let dispatcher = MessageDispatcher::new();
        let collector = Arc::new(CollectingListener::new());
        dispatcher.add_listener(collector.clone());

        dispatcher.emit(&PipelineMessage::warning("F", -10, "careful"));

        let messages = collector.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Warning);
        assert_eq!(messages[0].code, -10);
    }

    #[test]
    fn test_message_display() {
        let msg = PipelineMessage::error("Resample Image", -5555, "X spacing must be positive");
        let s = msg.to_string();
        assert!(s.contains("Resample Image"));
        assert!(s.contains("-5555"));
    }
}
