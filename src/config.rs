//! 运行配置模块
//!
//! 配置来自 JSON 文件，所有字段可省略；文件缺失或损坏时回退到默认值，
//! 数值项在读取侧做夹取，坏配置永远不会阻止服务启动。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const POLL_INTERVAL_DEFAULT_MS: u64 = 1_000;
const POLL_INTERVAL_MIN_MS: u64 = 100;
const POLL_INTERVAL_MAX_MS: u64 = 10_000;

const WORKER_COUNT_DEFAULT: usize = 2;
const WORKER_COUNT_MIN: usize = 1;
const WORKER_COUNT_MAX: usize = 8;

/// 超过该字符数的捕获跳过分析、直接入库
const ANALYSIS_CHAR_CAP_DEFAULT: usize = 100_000;

fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_DEFAULT_MS
}

fn default_worker_count() -> usize {
    WORKER_COUNT_DEFAULT
}

fn default_analysis_char_cap() -> usize {
    ANALYSIS_CHAR_CAP_DEFAULT
}

fn normalize_poll_interval_ms(value_ms: u64) -> u64 {
    value_ms.clamp(POLL_INTERVAL_MIN_MS, POLL_INTERVAL_MAX_MS)
}

fn normalize_worker_count(value: usize) -> usize {
    value.clamp(WORKER_COUNT_MIN, WORKER_COUNT_MAX)
}

/// 服务运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 数据目录覆盖；未设置时使用平台数据目录下的 `clipwatch`
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_analysis_char_cap")]
    pub analysis_char_cap: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            poll_interval_ms: POLL_INTERVAL_DEFAULT_MS,
            worker_count: WORKER_COUNT_DEFAULT,
            analysis_char_cap: ANALYSIS_CHAR_CAP_DEFAULT,
        }
    }
}

impl AppConfig {
    /// 从指定路径读取配置，缺失或解析失败时回退默认值
    pub fn load_from_path(config_path: &Path) -> Self {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        log::warn!("解析配置文件失败，使用默认配置: {}", err);
                    }
                },
                Err(err) => {
                    log::warn!("读取配置文件失败，使用默认配置: {}", err);
                }
            }
        }
        Self::default()
    }

    /// 默认配置文件位置：`<平台配置目录>/clipwatch/config.json`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("clipwatch").join("config.json"))
    }

    /// 轮询间隔，夹取到可用范围
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(normalize_poll_interval_ms(self.poll_interval_ms))
    }

    /// 分析线程数，夹取到可用范围
    pub fn workers(&self) -> usize {
        normalize_worker_count(self.worker_count)
    }

    /// 解析数据目录（优先自定义目录），不存在时自动创建
    pub fn resolve_data_dir(&self) -> Result<PathBuf, AppError> {
        let dir = match self.data_dir.as_deref() {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => dirs::data_dir()
                .ok_or_else(|| AppError::Storage("无法确定平台数据目录".to_string()))?
                .join("clipwatch"),
        };
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Storage(format!("创建数据目录 '{}' 失败: {}", dir.display(), e)))?;
        Ok(dir)
    }

    /// 数据库文件路径
    pub fn resolve_db_path(&self) -> Result<PathBuf, AppError> {
        Ok(self.resolve_data_dir()?.join("clipboard.db"))
    }
}
