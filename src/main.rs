//! # 剪贴板历史服务 — 进程入口
//!
//! 本文件仅负责初始化与装配：日志、配置、数据库、监控服务。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;

use clipwatch::clipboard::monitor::ClipboardMonitor;
use clipwatch::clipboard::SystemClipboard;
use clipwatch::config::AppConfig;
use clipwatch::db::SqliteHistory;
use clipwatch::history::HistoryStore;
use clipwatch::notify::LogSink;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("setup: begin");

    // 配置路径：命令行参数优先，其次平台配置目录
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => AppConfig::load_from_path(&path),
        None => match AppConfig::default_config_path() {
            Some(path) => AppConfig::load_from_path(&path),
            None => AppConfig::default(),
        },
    };

    let db_path = match config.resolve_db_path() {
        Ok(path) => path,
        Err(err) => {
            log::error!("setup: 无法确定数据库路径: {err}");
            return;
        }
    };
    log::info!("数据库路径: {}", db_path.display());

    let persistence = match SqliteHistory::open(&db_path) {
        Ok(persistence) => persistence,
        Err(err) => {
            log::error!("setup: 数据库初始化失败: {err}");
            return;
        }
    };

    let store = match HistoryStore::load(Box::new(persistence)) {
        Ok(store) => store,
        Err(err) => {
            log::error!("setup: 恢复历史记录失败: {err}");
            return;
        }
    };
    log::info!("setup: 已恢复 {} 条历史记录", store.len());

    let clipboard = match SystemClipboard::new() {
        Ok(clipboard) => clipboard,
        Err(err) => {
            log::error!("setup: 剪贴板不可用: {err}");
            return;
        }
    };

    let (monitor, handle) = ClipboardMonitor::new(clipboard, store, Box::new(LogSink), &config);

    // Ctrl-C → 停止信号；同步持久化保证停机前所有已确认变更均已落盘
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("收到 Ctrl-C");
            let _ = handle.stop();
        }
    });

    log::info!("setup: complete");
    monitor.run().await;
}
