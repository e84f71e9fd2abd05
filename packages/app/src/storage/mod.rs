//! SQLite 本地存储模块
//!
//! 提供单机本地持久化，支持：
//! - 词库与学习状态的本地存储
//! - 学习进度、连续天数与测验历史
//! - 用户设置 (含 XP/等级缓存)
//!
//! 所有仓储共享同一个 `Arc<Mutex<Connection>>`，写入在单一逻辑
//! 线程的事件处理中同步发生，无并发写者。

// ============================================================
// 子模块声明
// ============================================================

pub mod migrations;
pub mod models;
pub mod progress;
pub mod seed;
pub mod settings;
pub mod stat;
pub mod word;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use migrations::run_migrations;
pub use models::*;
pub use progress::ProgressRepository;
pub use settings::SettingsRepository;
pub use stat::WordStatRepository;
pub use word::WordRepository;

// ============================================================
// 依赖导入
// ============================================================

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("数据未找到: {0}")]
    NotFound(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// DatabaseManager - 数据库连接管理器
// ============================================================

/// 数据库连接管理器
///
/// 打开 (或创建) 数据库文件、执行迁移、内置词库播种，并向各仓储
/// 分发共享连接。
pub struct DatabaseManager {
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseManager {
    /// 打开指定路径的数据库，完成迁移与播种
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// 打开内存数据库 (测试用)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> StorageResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        seed::seed_builtin_words(&conn)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// 获取共享连接句柄
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.connection)
    }
}
