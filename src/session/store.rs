//! 会话存储
//!
//! 统一的会话读写接口，内存与 SQLite 两种实现。持久化失败由调度器记录日志
//! 并继续返回本回合结果，不向学生暴露。

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use super::Session;

/// 会话存储错误（save 显式返回，供调度器记录）
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialize session failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// 会话存储接口
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 按 id 加载会话；不存在或数据损坏时返回 None
    async fn load(&self, id: &str) -> Option<Session>;

    /// 写入会话（整体覆盖）
    async fn save(&self, session: &Session) -> Result<(), StoreError>;
}

/// 内存会话存储
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }
}

/// SQLite 会话存储：单表，整条会话序列化为 JSON 存入
///
/// rusqlite 是同步接口；所有操作都在锁内完成、不跨 await，单回合一次读写的
/// 负载下足够。
pub struct SqliteSessionStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteSessionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id         TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, id: &str) -> Option<Session> {
        let conn = self.conn.lock().unwrap();
        let data: Option<String> = conn
            .query_row("SELECT data FROM sessions WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .ok();
        data.and_then(|d| serde_json::from_str(&d).ok())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let data = serde_json::to_string(session)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (id, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            rusqlite::params![session.id, data, session.updated_at.to_rfc3339()],
        )?;
        Ok(())
    }
}

/// 创建会话存储
///
/// 提供了 db_path 则使用 SQLite；打开失败时告警并退回内存存储
pub fn create_session_store(db_path: Option<&Path>) -> Arc<dyn SessionStore> {
    if let Some(path) = db_path {
        match SqliteSessionStore::open(path) {
            Ok(store) => {
                tracing::info!("Using sqlite session store: {:?}", path);
                return Arc::new(store);
            }
            Err(e) => {
                tracing::warn!("Failed to open sqlite store, falling back to memory: {}", e);
            }
        }
    }

    tracing::info!("Using in-memory session store");
    Arc::new(MemorySessionStore::new())
}
