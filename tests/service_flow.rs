//! 服务级集成测试：真实事件循环 + 替身剪贴板 + SQLite 落盘

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clipwatch::clipboard::monitor::ClipboardMonitor;
use clipwatch::clipboard::TextClipboard;
use clipwatch::config::AppConfig;
use clipwatch::db::SqliteHistory;
use clipwatch::error::AppError;
use clipwatch::history::{Entry, HistoryPersistence, HistoryStore};
use clipwatch::notify::ChannelSink;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Clone)]
struct FakeClipboard {
    content: Arc<Mutex<String>>,
}

impl FakeClipboard {
    fn new() -> Self {
        Self {
            content: Arc::new(Mutex::new(String::new())),
        }
    }

    fn set(&self, text: &str) {
        *self.content.lock().expect("lock clipboard") = text.to_string();
    }
}

impl TextClipboard for FakeClipboard {
    fn read_text(&mut self) -> String {
        self.content.lock().expect("lock clipboard").clone()
    }

    fn write_text(&mut self, text: &str) -> Result<(), AppError> {
        self.set(text);
        Ok(())
    }
}

fn unique_temp_dir() -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock error")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("clipwatch-service-test-{nanos}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn fast_config() -> AppConfig {
    AppConfig {
        poll_interval_ms: 100,
        ..AppConfig::default()
    }
}

/// 等待下一份快照，带超时兜底
async fn next_snapshot(rx: &mut UnboundedReceiver<Vec<Entry>>) -> Vec<Entry> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for snapshot")
        .expect("sink channel closed")
}

/// 一直收快照，直到谓词成立
async fn wait_until(
    rx: &mut UnboundedReceiver<Vec<Entry>>,
    predicate: impl Fn(&[Entry]) -> bool,
) -> Vec<Entry> {
    loop {
        let snapshot = next_snapshot(rx).await;
        if predicate(&snapshot) {
            return snapshot;
        }
    }
}

#[tokio::test]
async fn capture_pipeline_end_to_end_and_state_survives_restart() {
    let dir = unique_temp_dir();
    let db_path = dir.join("clipboard.db");

    let clipboard = FakeClipboard::new();
    let (sink_tx, mut sink_rx) = tokio::sync::mpsc::unbounded_channel();

    let backend = SqliteHistory::open(&db_path).expect("open db");
    let store = HistoryStore::load(Box::new(backend)).expect("load store");
    let (monitor, handle) = ClipboardMonitor::new(
        clipboard.clone(),
        store,
        Box::new(ChannelSink::new(sink_tx)),
        &fast_config(),
    );
    let service = tokio::spawn(monitor.run());

    // 启动即收到一份（空的）恢复快照
    let initial = next_snapshot(&mut sink_rx).await;
    assert!(initial.is_empty());

    // "foo" 被捕获并带上分析元数据
    clipboard.set("foo");
    let snapshot = wait_until(&mut sink_rx, |s| !s.is_empty()).await;
    assert_eq!(snapshot[0].text, "foo");
    let metadata = snapshot[0].metadata.as_ref().expect("metadata attached");
    assert_eq!(metadata.words, 1);
    assert_eq!(metadata.characters, 3);
    assert!(!metadata.has_url);

    // 剪贴板内容不变（又"复制"了一次 foo）：几个轮询周期内不得产生新条目
    tokio::time::sleep(Duration::from_millis(350)).await;

    // "bar" 成为新的队首
    clipboard.set("bar");
    let snapshot = wait_until(&mut sink_rx, |s| s.len() >= 2).await;
    assert_eq!(snapshot.len(), 2, "重复的 foo 不得占据第三个条目");
    assert_eq!(snapshot[0].text, "bar");
    assert_eq!(snapshot[1].text, "foo");
    assert!(snapshot[0].metadata.is_some());

    handle.stop().expect("request stop");
    service.await.expect("service task");

    // 重启：同一数据库文件恢复出完全相同的状态
    let mut reopened = SqliteHistory::open(&db_path).expect("reopen db");
    let restored = reopened.load().expect("load persisted state");
    assert_eq!(restored, snapshot);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn user_actions_flow_through_handle() {
    let dir = unique_temp_dir();
    let db_path = dir.join("clipboard.db");

    let clipboard = FakeClipboard::new();
    let (sink_tx, mut sink_rx) = tokio::sync::mpsc::unbounded_channel();

    let backend = SqliteHistory::open(&db_path).expect("open db");
    let store = HistoryStore::load(Box::new(backend)).expect("load store");
    let (monitor, handle) = ClipboardMonitor::new(
        clipboard.clone(),
        store,
        Box::new(ChannelSink::new(sink_tx)),
        &fast_config(),
    );
    let service = tokio::spawn(monitor.run());

    let _initial = next_snapshot(&mut sink_rx).await;

    clipboard.set("first");
    wait_until(&mut sink_rx, |s| s.len() == 1).await;
    clipboard.set("second");
    let snapshot = wait_until(&mut sink_rx, |s| s.len() == 2).await;

    let first_timestamp = snapshot[1].timestamp;

    // 置顶
    handle.toggle_pin(first_timestamp).expect("send toggle pin");
    let snapshot = wait_until(&mut sink_rx, |s| s.iter().any(|e| e.is_pinned)).await;
    assert_eq!(snapshot[1].text, "first");
    assert!(snapshot[1].is_pinned, "置顶不改变顺序");

    // 复制回写：移到队首，时间戳不变，剪贴板拿到文本
    handle.recopy(first_timestamp).expect("send recopy");
    let snapshot =
        wait_until(&mut sink_rx, |s| s.first().is_some_and(|e| e.text == "first")).await;
    assert_eq!(snapshot[0].timestamp, first_timestamp);
    assert_eq!(snapshot.len(), 2);
    assert_eq!(
        clipboard.content.lock().expect("lock").as_str(),
        "first"
    );

    // 回写触发的下一次轮询不产生重复条目
    tokio::time::sleep(Duration::from_millis(350)).await;

    // 清空未置顶：只有 "second" 消失
    handle.clear_unpinned().expect("send clear");
    let snapshot = wait_until(&mut sink_rx, |s| s.len() == 1).await;
    assert_eq!(snapshot[0].text, "first");

    // 删除最后一条
    handle.delete(first_timestamp).expect("send delete");
    wait_until(&mut sink_rx, |s| s.is_empty()).await;

    handle.stop().expect("request stop");
    service.await.expect("service task");

    let _ = std::fs::remove_dir_all(dir);
}
