//! SQLite 持久化模块
//!
//! # 设计思路
//!
//! 历史记录的内存状态才是权威，数据库只是它的有序镜像：
//! `save` 在一个事务里整体重写，`load` 在启动时按位置恢复。
//! 单次状态不超过 [`crate::history::MAX_ENTRIES`] 条，整体重写的成本
//! 可以忽略，换来的是"落盘内容恒等于内存快照"这一简单不变式。
//!
//! # 实现思路
//!
//! - 使用 `rusqlite` 直接操作 SQLite，WAL 模式，`user_version` 管理迁移。
//! - `position` 列记录队列顺序——recopy 会在不改变 `timestamp` 的情况下
//!   调整顺序，所以顺序必须独立于时间戳存储。
//! - 元数据四列同生共死：全部非空才恢复为 `Some(TextMetadata)`。

mod schema;

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};

use crate::analysis::TextMetadata;
use crate::error::AppError;
use crate::history::{Entry, HistoryPersistence};

/// 基于 SQLite 的历史持久化后端
pub struct SqliteHistory {
    conn: Connection,
}

impl SqliteHistory {
    /// 打开（必要时创建）数据库文件并初始化 Schema
    pub fn open(db_path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Database(format!("创建数据库目录失败: {}", e)))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Database(format!("打开数据库失败: {}", e)))?;
        schema::initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// 打开内存数据库（测试用）
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("创建内存数据库失败: {}", e)))?;
        schema::initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl HistoryPersistence for SqliteHistory {
    fn load(&mut self) -> Result<Vec<Entry>, AppError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT text, timestamp, is_pinned, words, characters, has_url, has_email
                 FROM history ORDER BY position ASC",
            )
            .map_err(|e| AppError::Database(format!("准备历史查询失败: {}", e)))?;

        let entries = stmt
            .query_map([], |row| {
                let words: Option<i64> = row.get(3)?;
                let characters: Option<i64> = row.get(4)?;
                let has_url: Option<bool> = row.get(5)?;
                let has_email: Option<bool> = row.get(6)?;
                let metadata = match (words, characters, has_url, has_email) {
                    (Some(words), Some(characters), Some(has_url), Some(has_email)) => {
                        Some(TextMetadata {
                            words: words.max(0) as usize,
                            characters: characters.max(0) as usize,
                            has_url,
                            has_email,
                        })
                    }
                    _ => None,
                };
                Ok(Entry {
                    text: row.get(0)?,
                    timestamp: row.get(1)?,
                    metadata,
                    is_pinned: row.get(2)?,
                })
            })
            .map_err(|e| AppError::Database(format!("查询历史失败: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("读取历史行失败: {}", e)))?;

        Ok(entries)
    }

    fn save(&mut self, entries: &[Entry]) -> Result<(), AppError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| AppError::Database(format!("开始保存事务失败: {}", e)))?;

        tx.execute("DELETE FROM history", [])
            .map_err(|e| AppError::Database(format!("清空旧状态失败: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO history (position, text, timestamp, is_pinned, words, characters, has_url, has_email)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )
                .map_err(|e| AppError::Database(format!("准备插入语句失败: {}", e)))?;

            for (position, entry) in entries.iter().enumerate() {
                let metadata = entry.metadata.as_ref();
                stmt.execute(params![
                    position as i64,
                    entry.text,
                    entry.timestamp,
                    entry.is_pinned,
                    metadata.map(|m| m.words as i64),
                    metadata.map(|m| m.characters as i64),
                    metadata.map(|m| m.has_url),
                    metadata.map(|m| m.has_email),
                ])
                .map_err(|e| AppError::Database(format!("写入历史条目失败: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| AppError::Database(format!("提交保存事务失败: {}", e)))
    }
}
