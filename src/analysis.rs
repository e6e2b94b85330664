//! 文本分析模块
//!
//! # 设计思路
//!
//! 对每条捕获的剪贴板文本做一次轻量统计：词数、字符数、
//! 是否包含 URL、是否包含邮箱地址。分析结果作为元数据挂到历史条目上，
//! 供展示层筛选与标注。
//!
//! # 实现思路
//!
//! - `analyze` 是纯函数：无共享状态、确定性、对任意有限输入必然终止。
//! - 通过 `once_cell::sync::Lazy` 在首次调用时编译正则，后续零成本复用。
//! - URL / 邮箱检测是全文子串匹配，不要求整串匹配——
//!   长文本中间出现的链接同样会命中。

pub mod pool;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// HTTP/HTTPS URL 模式
///
/// `://` 之后的首字符不能是空白或 `/ $ . ? #`，
/// 其后至少还要有一个字符，保证匹配到的是一个像样的 URL
/// 而不是孤零零的协议头。
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://[^\s/$.?#].[^\s]*").unwrap()
});

/// `local@domain.tld` 形式的邮箱模式，local/domain 允许 `._-`
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._-]+@[A-Za-z0-9._-]+\.[A-Za-z0-9_-]+").unwrap()
});

/// 单条文本的分析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMetadata {
    /// 以空白分隔的词数
    pub words: usize,
    /// 字符总数（含空白）
    pub characters: usize,
    pub has_url: bool,
    pub has_email: bool,
}

/// 分析一段文本
///
/// 对同一输入的重复调用返回完全相同的结果。
pub fn analyze(text: &str) -> TextMetadata {
    TextMetadata {
        words: text.split_whitespace().count(),
        characters: text.chars().count(),
        has_url: URL_PATTERN.is_match(text),
        has_email: EMAIL_PATTERN.is_match(text),
    }
}
