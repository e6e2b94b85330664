//! 剪贴板监控服务子模块
//!
//! ## 职责
//! - 以固定间隔轮询剪贴板，识别真正的内容变化
//! - 把新捕获交给分析线程池，结果到达后写入历史存储
//! - 接收用户动作（复制回写 / 置顶 / 删除 / 清空）并在每次状态变化后
//!   推送通知
//!
//! ## 实现思路
//!
//! - 单个服务任务用 `tokio::select!` 聚合四类事件：轮询滴答、分析结果、
//!   用户动作、停止信号。历史存储只被这个任务改动，天然单写者。
//! - 监控在"空闲"与"处理中"之间流转：检测到变化即更新 `last_seen`
//!   并提交分析，期间新的变化照常提交——并发在途的分析相互独立，
//!   靠任务编号与文本关联，不做互斥。
//! - 分析结果与淘汰/删除之间的竞争由存储的"未命中即空操作"规则化解，
//!   监控不需要任何锁。
//! - 超长文本跳过分析直接入库，保证轮询节奏不受病态输入影响。

use std::time::Duration;

use tokio::sync::mpsc::{
    channel, unbounded_channel, Receiver, UnboundedReceiver, UnboundedSender,
};
use tokio::time::MissedTickBehavior;

use crate::analysis::pool::{AnalysisJob, AnalysisPool, AnalysisResult};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::history::HistoryStore;
use crate::notify::NotificationSink;

use super::TextClipboard;

/// 结果通道容量；分析产出远低于这个量级，写满意味着服务停摆
const RESULT_CHANNEL_CAPACITY: usize = 255;

/// 外部提交的用户动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// 把指定条目复制回系统剪贴板并移到队首
    Recopy(i64),
    TogglePin(i64),
    Delete(i64),
    /// 清空所有未置顶条目
    ClearUnpinned,
}

/// 服务的外部控制句柄
///
/// 可自由克隆、跨线程使用；所有方法立即返回，动作在服务任务上执行。
#[derive(Clone)]
pub struct ServiceHandle {
    action_tx: UnboundedSender<UserAction>,
    stop_tx: UnboundedSender<()>,
}

impl ServiceHandle {
    pub fn recopy(&self, timestamp: i64) -> Result<(), AppError> {
        self.send(UserAction::Recopy(timestamp))
    }

    pub fn toggle_pin(&self, timestamp: i64) -> Result<(), AppError> {
        self.send(UserAction::TogglePin(timestamp))
    }

    pub fn delete(&self, timestamp: i64) -> Result<(), AppError> {
        self.send(UserAction::Delete(timestamp))
    }

    pub fn clear_unpinned(&self) -> Result<(), AppError> {
        self.send(UserAction::ClearUnpinned)
    }

    /// 请求服务停机；重复调用无害
    pub fn stop(&self) -> Result<(), AppError> {
        self.stop_tx
            .send(())
            .map_err(|_| AppError::Channel("服务已停止".to_string()))
    }

    fn send(&self, action: UserAction) -> Result<(), AppError> {
        self.action_tx
            .send(action)
            .map_err(|_| AppError::Channel("服务已停止，动作无法投递".to_string()))
    }
}

/// 剪贴板监控服务
///
/// 由 [`ClipboardMonitor::new`] 构造，`run()` 消耗自身并一直运行到
/// 停止信号到达。
pub struct ClipboardMonitor<C: TextClipboard> {
    state: MonitorState<C>,
    result_rx: Receiver<AnalysisResult>,
    action_rx: UnboundedReceiver<UserAction>,
    stop_rx: UnboundedReceiver<()>,
    poll_interval: Duration,
}

/// 服务任务私有的可变状态
struct MonitorState<C: TextClipboard> {
    clipboard: C,
    store: HistoryStore,
    pool: AnalysisPool,
    sink: Box<dyn NotificationSink>,
    /// 最近一次见到的剪贴板文本，用于同一内容的重复滴答去重
    last_seen: String,
    next_job_id: u64,
    analysis_char_cap: usize,
}

impl<C: TextClipboard> ClipboardMonitor<C> {
    pub fn new(
        clipboard: C,
        store: HistoryStore,
        sink: Box<dyn NotificationSink>,
        config: &AppConfig,
    ) -> (Self, ServiceHandle) {
        let (result_tx, result_rx) = channel::<AnalysisResult>(RESULT_CHANNEL_CAPACITY);
        let (action_tx, action_rx) = unbounded_channel::<UserAction>();
        let (stop_tx, stop_rx) = unbounded_channel::<()>();

        let pool = AnalysisPool::new(config.workers(), result_tx);

        let monitor = Self {
            state: MonitorState {
                clipboard,
                store,
                pool,
                sink,
                last_seen: String::new(),
                next_job_id: 0,
                analysis_char_cap: config.analysis_char_cap,
            },
            result_rx,
            action_rx,
            stop_rx,
            poll_interval: config.poll_interval(),
        };
        let handle = ServiceHandle { action_tx, stop_tx };

        (monitor, handle)
    }

    /// 运行服务直到收到停止信号
    pub async fn run(self) {
        let Self {
            mut state,
            mut result_rx,
            mut action_rx,
            mut stop_rx,
            poll_interval,
        } = self;

        // 启动时记住既有内容：服务启动前就在剪贴板里的文本不算捕获
        state.last_seen = state.clipboard.read_text();
        // 启动即推送一次已恢复的历史
        state.notify();

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!("📋 剪贴板监控已启动，间隔 {}ms", poll_interval.as_millis());

        loop {
            tokio::select! {
                _ = ticker.tick() => state.poll_clipboard(),

                result = result_rx.recv() => {
                    let Some(result) = result else {
                        log::error!("分析结果通道已关闭，服务退出");
                        break;
                    };
                    state.handle_result(result);
                }

                action = action_rx.recv() => {
                    let Some(action) = action else {
                        log::info!("所有控制句柄已释放，服务退出");
                        break;
                    };
                    state.handle_action(action);
                }

                _ = stop_rx.recv() => {
                    log::info!("收到停止信号，服务退出");
                    break;
                }
            }
        }

        // 先关结果通道再回收线程池，避免工作线程阻塞在投递上
        drop(result_rx);
        state.shutdown();
    }
}

impl<C: TextClipboard> MonitorState<C> {
    /// 一次轮询滴答
    fn poll_clipboard(&mut self) {
        let text = self.clipboard.read_text();
        if text.trim().is_empty() {
            return;
        }
        if text == self.last_seen {
            return;
        }
        if self.store.head_text() == Some(text.as_str()) {
            // 内容与队首一致（典型来源：复制回写），只刷新缓存
            self.last_seen = text;
            return;
        }

        self.last_seen = text.clone();

        if text.chars().count() > self.analysis_char_cap {
            log::debug!("捕获文本超过分析上限（{} 字符），直接入库", self.analysis_char_cap);
            if self.store.insert(&text).is_some() {
                self.notify();
            }
            return;
        }

        let job = AnalysisJob {
            id: self.next_job_id,
            text,
        };
        self.next_job_id += 1;

        if let Err(err) = self.pool.submit(job) {
            log::error!("提交分析任务失败: {err}");
        }
    }

    /// 一条分析结果到达
    fn handle_result(&mut self, result: AnalysisResult) {
        let changed = match result.outcome {
            Ok(metadata) => match self.store.insert(&result.text) {
                Some(entry) => {
                    self.store.attach_metadata(entry.timestamp, metadata);
                    true
                }
                None => false,
            },
            Err(err) => {
                // 丢掉捕获比丢掉元数据更糟：条目照常入库，只是没有分析结果
                log::warn!("文本分析失败（任务 {}），条目以无元数据形式保存: {err}", result.id);
                self.store.insert(&result.text).is_some()
            }
        };

        if changed {
            self.notify();
        }
    }

    /// 一个用户动作到达
    fn handle_action(&mut self, action: UserAction) {
        match action {
            UserAction::Recopy(timestamp) => {
                let Some(entry) = self.store.recopy(timestamp) else {
                    log::debug!("复制回写的目标条目已不存在: {timestamp}");
                    return;
                };
                // 回写触发的下一次捕获与队首相同，会被轮询的队首去重吸收
                if let Err(err) = self.clipboard.write_text(&entry.text) {
                    log::warn!("复制回写剪贴板失败: {err}");
                }
                self.notify();
            }
            UserAction::TogglePin(timestamp) => {
                if self.store.toggle_pin(timestamp) {
                    self.notify();
                }
            }
            UserAction::Delete(timestamp) => {
                if self.store.delete(timestamp) {
                    self.notify();
                }
            }
            UserAction::ClearUnpinned => {
                let removed = self.store.clear_unpinned();
                if removed > 0 {
                    log::info!("已清空 {removed} 条未置顶记录");
                    self.notify();
                }
            }
        }
    }

    fn notify(&mut self) {
        let snapshot = self.store.snapshot();
        self.sink.notify(&snapshot);
    }

    fn shutdown(self) {
        let MonitorState { pool, .. } = self;
        pool.shutdown();
        log::info!("📋 剪贴板监控已停止");
    }
}
