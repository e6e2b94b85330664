//! # clipwatch — 后台剪贴板历史服务
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              外部协作方（展示层 / 嵌入方）                 │
//! │                                                          │
//! │   NotificationSink ◄── 快照推送      ServiceHandle ──►   │
//! │   （渲染、交互）                     （置顶/删除/回写）    │
//! └───────▲──────────────────────────────────┬───────────────┘
//!         │                                  ▼
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       │        服务任务 (tokio::select!)                  │
//! │                                                          │
//! │  ┌─ clipboard ── TextClipboard 特征 + arboard 系统实现    │
//! │  │   └─ monitor      轮询·去重·动作分发（单写者）          │
//! │  │                                                       │
//! │  ├─ analysis ──── 纯函数分析（词数/字符数/URL/邮箱）       │
//! │  │   └─ pool         固定线程池，panic 隔离               │
//! │  │                                                       │
//! │  ├─ history ───── 有界有序存储：插入·去重·淘汰·置顶        │
//! │  │                                                       │
//! │  ├─ db ────────── SQLite (rusqlite) 持久化镜像            │
//! │  │   └─ schema       建表 + user_version                  │
//! │  │                                                       │
//! │  ├─ notify ────── 通知接收方特征与默认实现                 │
//! │  ├─ config ────── JSON 配置，缺省回退 + 数值夹取           │
//! │  └─ error ─────── AppError (统一错误类型)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有可失败路径的返回类型 |
//! | [`config`] | 运行配置的读取、缺省与夹取 |
//! | [`analysis`] | 文本统计与模式检测；`pool` 子模块负责线程池隔离 |
//! | [`history`] | 有界历史存储：插入、去重、硬上限淘汰、置顶、快照 |
//! | [`db`] | 历史状态的 SQLite 镜像（WAL + user_version） |
//! | [`clipboard`] | 剪贴板访问特征与系统实现；`monitor` 子模块是服务主循环 |
//! | [`notify`] | 历史变更通知的接收方特征与默认实现 |

pub mod error;
pub mod config;
pub mod analysis;
pub mod history;
pub mod db;
pub mod clipboard;
pub mod notify;
