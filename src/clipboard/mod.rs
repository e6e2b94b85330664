//! 剪贴板访问模块
//!
//! # 设计思路
//!
//! 核心只需要两件事：同步读出当前剪贴板文本、在用户复制回写时写入文本。
//! 这两件事收敛在 [`TextClipboard`] 特征后面，监控逻辑对真实系统
//! 剪贴板与测试替身一视同仁。
//!
//! # 实现思路
//!
//! - 系统实现基于 `arboard`。
//! - 读取永不失败：剪贴板为空、被占用或内容不是文本时一律返回空串，
//!   由监控的空文本判断自然跳过。

pub mod monitor;

use crate::error::AppError;

/// 纯文本剪贴板访问
pub trait TextClipboard: Send {
    /// 读取当前剪贴板文本；不可用时返回空串
    fn read_text(&mut self) -> String;

    /// 写入文本（仅复制回写的用户动作使用，监控自身从不写入）
    fn write_text(&mut self, text: &str) -> Result<(), AppError>;
}

/// 系统剪贴板
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, AppError> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| AppError::Clipboard(format!("初始化剪贴板失败: {}", e)))?;
        Ok(Self { inner })
    }
}

impl TextClipboard for SystemClipboard {
    fn read_text(&mut self) -> String {
        match self.inner.get_text() {
            Ok(text) => text,
            Err(arboard::Error::ContentNotAvailable) => String::new(),
            Err(err) => {
                log::debug!("读取剪贴板失败，按空内容处理: {}", err);
                String::new()
            }
        }
    }

    fn write_text(&mut self, text: &str) -> Result<(), AppError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| AppError::Clipboard(format!("写入剪贴板失败: {}", e)))
    }
}
