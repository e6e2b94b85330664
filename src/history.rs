//! 历史记录存储模块
//!
//! # 设计思路
//!
//! 内存中的有序 `Vec<Entry>` 是运行期的唯一权威状态，最新条目恒在下标 0。
//! 每次变更先改内存、再同步写入持久化后端；写入失败只记日志，
//! 内存状态继续生效，下一次成功的变更会把完整状态重新落盘。
//!
//! # 实现思路
//!
//! - 单写者纪律：所有变更都发生在服务任务上，读取方通过 `snapshot()`
//!   拿到一致的即时拷贝，存储本身不需要锁。
//! - `timestamp` 即条目身份。通过 `max(now, 上次发放值 + 1)` 发放，
//!   保证同一毫秒内连续插入也不会重复，且被删除的值不会复用。
//! - 容量上限是硬性的：超过 [`MAX_ENTRIES`] 时淘汰下标最大（最旧）的
//!   条目，置顶条目不豁免。
//! - 去重只对比下标 0 的条目文本：重新复制一条较旧的相同文本会产生
//!   新条目，这是有意保留的行为。

use serde::{Deserialize, Serialize};

use crate::analysis::TextMetadata;
use crate::error::AppError;

/// 历史记录容量硬上限
pub const MAX_ENTRIES: usize = 100;

/// 一条剪贴板历史
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// 捕获到的原始文本，保留全部空白
    pub text: String,
    /// 捕获时刻（毫秒），同时是条目的稳定身份键
    pub timestamp: i64,
    /// 分析元数据；分析未完成或失败时为 `None`
    #[serde(default)]
    pub metadata: Option<TextMetadata>,
    #[serde(default)]
    pub is_pinned: bool,
}

/// 历史记录的持久化后端
///
/// 后端只负责按顺序整体存取，排序、去重、容量等规则全部在
/// [`HistoryStore`] 内实施。
pub trait HistoryPersistence: Send {
    /// 启动时读取全部条目，无历史数据时返回空序列
    fn load(&mut self) -> Result<Vec<Entry>, AppError>;
    /// 将当前完整状态按顺序落盘
    fn save(&mut self, entries: &[Entry]) -> Result<(), AppError>;
}

/// 有界、有序、可持久化的历史记录存储
pub struct HistoryStore {
    entries: Vec<Entry>,
    /// 已发放的最大时间戳，用于保证身份键单调唯一
    last_timestamp: i64,
    persistence: Box<dyn HistoryPersistence>,
}

impl HistoryStore {
    /// 从持久化后端恢复历史并构造存储
    pub fn load(mut persistence: Box<dyn HistoryPersistence>) -> Result<Self, AppError> {
        let mut entries = persistence.load()?;
        entries.truncate(MAX_ENTRIES);
        let last_timestamp = entries.iter().map(|e| e.timestamp).max().unwrap_or(0);
        Ok(Self {
            entries,
            last_timestamp,
            persistence,
        })
    }

    fn next_timestamp(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let issued = now.max(self.last_timestamp + 1);
        self.last_timestamp = issued;
        issued
    }

    fn persist(&mut self) {
        if let Err(err) = self.persistence.save(&self.entries) {
            log::error!("保存历史记录失败，内存状态继续生效: {err}");
        }
    }

    /// 在队首插入一条新捕获
    ///
    /// 文本去空白后为空、或与当前下标 0 条目完全相同时拒绝（返回 `None`）。
    /// 插入后超出容量则淘汰末尾条目，置顶与否不影响淘汰。
    pub fn insert(&mut self, text: &str) -> Option<Entry> {
        if text.trim().is_empty() {
            return None;
        }
        if self.entries.first().is_some_and(|head| head.text == text) {
            return None;
        }

        let entry = Entry {
            text: text.to_string(),
            timestamp: self.next_timestamp(),
            metadata: None,
            is_pinned: false,
        };
        self.entries.insert(0, entry.clone());
        if self.entries.len() > MAX_ENTRIES {
            self.entries.truncate(MAX_ENTRIES);
        }
        self.persist();
        Some(entry)
    }

    /// 为指定条目补充分析元数据
    ///
    /// 条目已被淘汰或删除时静默丢弃（返回 `false`），
    /// 这是分析结果与淘汰竞争时的约定行为。
    pub fn attach_metadata(&mut self, timestamp: i64, metadata: TextMetadata) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.timestamp == timestamp) else {
            return false;
        };
        entry.metadata = Some(metadata);
        self.persist();
        true
    }

    /// 将已有条目移到队首，字段与时间戳保持不变
    ///
    /// 这是唯一一个不产生新条目的重排操作。条目不存在时返回 `None`；
    /// 已在队首时直接返回该条目，不触发落盘。
    pub fn recopy(&mut self, timestamp: i64) -> Option<Entry> {
        let position = self.entries.iter().position(|e| e.timestamp == timestamp)?;
        if position == 0 {
            return Some(self.entries[0].clone());
        }
        let entry = self.entries.remove(position);
        self.entries.insert(0, entry.clone());
        self.persist();
        Some(entry)
    }

    /// 切换置顶标志
    ///
    /// 本身不调整顺序——置顶优先的排序属于展示层。
    pub fn toggle_pin(&mut self, timestamp: i64) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.timestamp == timestamp) else {
            return false;
        };
        entry.is_pinned = !entry.is_pinned;
        self.persist();
        true
    }

    /// 删除条目，重复删除是无害的空操作
    pub fn delete(&mut self, timestamp: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.timestamp != timestamp);
        if self.entries.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// 一键清空所有未置顶条目，返回删除数量
    pub fn clear_unpinned(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.is_pinned);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// 当前状态的一致性拷贝
    pub fn snapshot(&self) -> Vec<Entry> {
        self.entries.clone()
    }

    /// 下标 0 条目的文本，供监控去重
    pub fn head_text(&self) -> Option<&str> {
        self.entries.first().map(|e| e.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
