//! 分析工作线程池子模块
//!
//! ## 职责
//! - 在主服务任务之外执行文本分析，保证轮询与展示永不被分析阻塞
//! - 捕获分析过程中的 panic，转为失败结果而不是进程崩溃
//!
//! ## 输入/输出
//! - 输入：`submit(AnalysisJob)`（任务 id + 文本）
//! - 输出：结果通道上的 `AnalysisResult`，按完成顺序到达，
//!   调用方必须用 id/文本做关联，不能依赖完成顺序
//!
//! ## 错误语义
//! - 工作线程内 panic 统一映射为 `AppError::Analysis`
//! - 队列关闭后的提交返回 `AppError::Channel`

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use tokio::sync::mpsc::Sender;

use crate::error::AppError;

use super::{analyze, TextMetadata};

/// 提交给线程池的一次分析请求
#[derive(Debug)]
pub struct AnalysisJob {
    /// 单调递增的任务编号，由提交方分配
    pub id: u64,
    pub text: String,
}

/// 一次分析请求的最终结果
#[derive(Debug)]
pub struct AnalysisResult {
    pub id: u64,
    /// 原样带回提交的文本，结果到达时条目可能尚未创建
    pub text: String,
    pub outcome: Result<TextMetadata, AppError>,
}

type AnalyzeFn = fn(&str) -> TextMetadata;

/// 固定大小的分析线程池
///
/// 工作线程在构造时一次性创建并长期存活，共享同一个任务队列，
/// 避免剪贴板高频变化时无限制地创建线程。
pub struct AnalysisPool {
    job_tx: mpsc::Sender<AnalysisJob>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl AnalysisPool {
    /// 创建线程池，结果通过 `result_tx` 送回
    pub fn new(worker_count: usize, result_tx: Sender<AnalysisResult>) -> Self {
        Self::with_analyzer(worker_count, result_tx, analyze)
    }

    /// 以自定义分析函数创建线程池（测试用，可注入会 panic 的分析器）
    pub(crate) fn with_analyzer(
        worker_count: usize,
        result_tx: Sender<AnalysisResult>,
        analyzer: AnalyzeFn,
    ) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<AnalysisJob>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..worker_count.max(1))
            .map(|index| {
                let job_rx = Arc::clone(&job_rx);
                let result_tx = result_tx.clone();
                thread::Builder::new()
                    .name(format!("analysis-worker-{index}"))
                    .spawn(move || worker_loop(job_rx, result_tx, analyzer))
                    .expect("创建分析工作线程失败")
            })
            .collect();

        Self { job_tx, workers }
    }

    /// 提交一次分析请求
    ///
    /// 立即返回；结果稍后从结果通道到达。
    pub fn submit(&self, job: AnalysisJob) -> Result<(), AppError> {
        self.job_tx
            .send(job)
            .map_err(|_| AppError::Channel("分析任务队列已关闭".to_string()))
    }

    /// 关闭任务队列并等待所有工作线程退出
    ///
    /// 调用方必须先丢弃结果接收端，否则阻塞在投递上的线程无法退出。
    pub fn shutdown(self) {
        drop(self.job_tx);
        for worker in self.workers {
            if worker.join().is_err() {
                log::warn!("分析工作线程退出异常");
            }
        }
    }
}

fn worker_loop(
    job_rx: Arc<Mutex<mpsc::Receiver<AnalysisJob>>>,
    result_tx: Sender<AnalysisResult>,
    analyzer: AnalyzeFn,
) {
    loop {
        // 只在取任务时持锁，分析在锁外进行
        let job = {
            let guard = match job_rx.lock() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    log::warn!("分析任务队列锁中毒，继续使用恢复数据");
                    poisoned.into_inner()
                }
            };
            guard.recv()
        };

        let Ok(job) = job else {
            // 队列关闭，线程正常退出
            break;
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| analyzer(&job.text)))
            .map_err(|payload| AppError::Analysis(panic_message(payload.as_ref())));

        let result = AnalysisResult {
            id: job.id,
            text: job.text,
            outcome,
        };

        if result_tx.blocking_send(result).is_err() {
            // 接收端已关闭，服务在停机
            break;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知原因".to_string()
    }
}
