//! 单词学习状态数据库操作
//!
//! 状态行按需懒创建: 读取缺失行返回默认值且不产生写入，
//! 首次写入时落库。

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lexi_algo::types::WordStat;

use crate::storage::models::WordStatRecord;
use crate::storage::{StorageError, StorageResult};

/// 学习状态仓储
#[derive(Clone)]
pub struct WordStatRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WordStatRepository {
    /// 创建新的仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 获取单个学习状态 (不存在返回 None)
    pub fn get_record(&self, word_id: &str) -> StorageResult<Option<WordStatRecord>> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                "SELECT * FROM word_stat WHERE word_id = ?1",
                params![word_id],
                |row| WordStatRecord::from_row(row),
            )
            .optional()?;
        Ok(record)
    }

    /// 获取学习状态，缺失时返回默认值 (纯读取，不落库)
    pub fn get_or_default(&self, word_id: &str) -> StorageResult<WordStat> {
        Ok(self
            .get_record(word_id)?
            .map(|r| r.stat())
            .unwrap_or_default())
    }

    /// 按单词 ID 批量获取学习状态 (缺失的单词不在结果中)
    pub fn get_all_stats(&self) -> StorageResult<HashMap<String, WordStat>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT * FROM word_stat")?;
        let stats = stmt
            .query_map([], |row| WordStatRecord::from_row(row))?
            .filter_map(|r| r.ok())
            .map(|r| (r.word_id.clone(), r.stat()))
            .collect();
        Ok(stats)
    }

    /// 写入完整学习状态 (不存在则插入)
    pub fn upsert(&self, word_id: &str, stat: &WordStat) -> StorageResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO word_stat (word_id, is_mastered, last_reviewed, quiz_incorrect_count, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (word_id) DO UPDATE SET
                is_mastered = excluded.is_mastered,
                last_reviewed = excluded.last_reviewed,
                quiz_incorrect_count = excluded.quiz_incorrect_count,
                updated_at = excluded.updated_at
            "#,
            params![
                word_id,
                stat.is_mastered as i32,
                stat.last_reviewed.map(|ts| ts.to_rfc3339()),
                stat.quiz_incorrect_count,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 刷新最后复习时间
    pub fn touch_reviewed(&self, word_id: &str, now: DateTime<Utc>) -> StorageResult<()> {
        let mut stat = self.get_or_default(word_id)?;
        stat.last_reviewed = Some(now);
        self.upsert(word_id, &stat)
    }

    /// 答错一次，计数 +1
    pub fn increment_incorrect(&self, word_id: &str) -> StorageResult<()> {
        let mut stat = self.get_or_default(word_id)?;
        stat.quiz_incorrect_count += 1;
        self.upsert(word_id, &stat)
    }

    /// 设置掌握标记
    pub fn set_mastered(&self, word_id: &str, mastered: bool) -> StorageResult<()> {
        let mut stat = self.get_or_default(word_id)?;
        stat.is_mastered = mastered;
        self.upsert(word_id, &stat)
    }
}
