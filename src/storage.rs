use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use crate::error::StorageError;
use crate::unlock::ReadingProgress;

/// 键值存储
///
/// 阅读进度与分段缓存都以 JSON 字符串形式按键保存
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// 阅读进度的存储键
pub fn progress_key(book_id: &str) -> String {
    format!("reader.progress.{}", book_id)
}

/// 分段结果缓存的存储键
pub fn boundaries_key(book_id: &str) -> String {
    format!("reader.boundaries.{}", book_id)
}

/// 基于 SQLite `kv_store` 表的实现
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// # 参数
    /// - `conn`: 已通过 `db::init_db` 初始化的连接
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }
}

/// 内存实现
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// 读取并反序列化 JSON 值
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// 序列化并写入 JSON 值
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// 读取书籍的阅读进度
///
/// 记录不存在时返回初始值；记录损坏时记录警告并回退到初始值，不向上抛错
///
/// # 返回
/// (进度, 是否来自已保存的记录)
pub fn load_progress<S>(store: &S, book_id: &str) -> (ReadingProgress, bool)
where
    S: KeyValueStore + ?Sized,
{
    let key = progress_key(book_id);
    match load_json::<ReadingProgress, S>(store, &key) {
        Ok(Some(mut progress)) => {
            progress.normalize();
            (progress, true)
        }
        Ok(None) => (ReadingProgress::default(), false),
        Err(e) => {
            log::warn!("阅读进度 {} 无法解析，已重置: {}", key, e);
            (ReadingProgress::default(), false)
        }
    }
}

/// 保存书籍的阅读进度（整条覆盖）
pub fn save_progress<S>(
    store: &mut S,
    book_id: &str,
    progress: &ReadingProgress,
) -> Result<(), StorageError>
where
    S: KeyValueStore + ?Sized,
{
    save_json(store, &progress_key(book_id), progress)
}
