//! 历史变更通知模块
//!
//! 核心在每次历史状态变化后把完整快照推给通知接收方，
//! 渲染与交互完全由接收方负责。接收方失效只降级为日志，不影响核心。

use tokio::sync::mpsc::UnboundedSender;

use crate::history::Entry;

/// 历史变更的接收方
pub trait NotificationSink: Send {
    /// 收到一份按当前顺序排列的完整历史快照
    fn notify(&mut self, entries: &[Entry]);
}

/// 仅记录日志的接收方，守护进程独立运行时的默认选择
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, entries: &[Entry]) {
        log::debug!("📋 历史已更新，共 {} 条", entries.len());
    }
}

/// 把快照转发到通道的接收方，供嵌入方或测试消费
pub struct ChannelSink {
    tx: UnboundedSender<Vec<Entry>>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<Vec<Entry>>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&mut self, entries: &[Entry]) {
        if self.tx.send(entries.to_vec()).is_err() {
            log::warn!("通知接收端已关闭，快照被丢弃");
        }
    }
}
