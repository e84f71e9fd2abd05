//! 用户设置数据库操作
//!
//! 单行设置，含 XP/等级缓存。`clear` 将全部表重置为初始状态。

use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::storage::models::UserSettings;
use crate::storage::{StorageError, StorageResult};

/// 用户设置仓储
#[derive(Clone)]
pub struct SettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsRepository {
    /// 创建新的仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 读取设置
    pub fn get_settings(&self) -> StorageResult<UserSettings> {
        let conn = self.get_conn()?;
        let settings = conn.query_row("SELECT * FROM user_settings WHERE id = 1", [], |row| {
            UserSettings::from_row(row)
        })?;
        Ok(settings)
    }

    /// 整行写回设置
    pub fn save_settings(&self, settings: &UserSettings) -> StorageResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE user_settings SET
                grade = ?1, daily_goal = ?2, username = ?3, theme = ?4,
                speech_rate = ?5, auto_play_audio = ?6, xp = ?7, level = ?8
            WHERE id = 1
            "#,
            params![
                settings.grade.as_str(),
                settings.daily_goal,
                settings.username,
                settings.theme,
                settings.speech_rate,
                settings.auto_play_audio as i32,
                settings.xp,
                settings.level,
            ],
        )?;
        Ok(())
    }

    /// 清空全部数据，恢复初始状态
    ///
    /// 删除自定义数据与学习记录，重置设置与进度，内置词库保留。
    pub fn clear(&self) -> StorageResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            r#"
            DELETE FROM word_stat;
            DELETE FROM quiz_history;
            DELETE FROM word WHERE is_custom = 1;
            UPDATE progress SET
                learned_today = 0, learned_date = NULL, total_learned = 0,
                current_streak = 0, best_streak = 0, last_learned_date = NULL,
                quiz_taken_date = NULL
            WHERE id = 1;
            UPDATE user_settings SET
                grade = 'middle1', daily_goal = 10, username = '', theme = 'light',
                speech_rate = 1.0, auto_play_audio = 1, xp = 0, level = 1
            WHERE id = 1;
            "#,
        )?;
        tx.commit()?;
        Ok(())
    }
}
