//! Word 数据库操作
//!
//! 提供词条的 CRUD 操作与选词所需的查询。

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use lexi_algo::types::Grade;

use crate::storage::models::Word;
use crate::storage::{StorageError, StorageResult};

/// 词条数据库操作仓库
#[derive(Clone)]
pub struct WordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WordRepository {
    /// 创建新的 WordRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取连接锁
    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 根据 ID 获取单词
    pub fn get_word(&self, id: &str) -> StorageResult<Option<Word>> {
        let conn = self.get_conn()?;
        let word = conn
            .query_row("SELECT * FROM word WHERE id = ?1", params![id], |row| {
                Word::from_row(row)
            })
            .optional()?;
        Ok(word)
    }

    /// 获取全部单词
    pub fn get_all_words(&self) -> StorageResult<Vec<Word>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT * FROM word ORDER BY term COLLATE NOCASE")?;
        let words: Vec<Word> = stmt
            .query_map([], |row| Word::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(words)
    }

    /// 按学段获取单词
    pub fn get_words_by_grade(&self, grade: Grade) -> StorageResult<Vec<Word>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM word WHERE grade_level = ?1 ORDER BY unit, term COLLATE NOCASE",
        )?;
        let words: Vec<Word> = stmt
            .query_map(params![grade.as_str()], |row| Word::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(words)
    }

    /// 拼写是否已存在 (大小写不敏感，覆盖内置与自建单词)
    ///
    /// `exclude_id` 用于更新路径下排除自身。
    pub fn term_exists(&self, term: &str, exclude_id: Option<&str>) -> StorageResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM word WHERE LOWER(term) = LOWER(?1) AND id != COALESCE(?2, '')",
            params![term.trim(), exclude_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 保存单词 (已存在则整行更新)
    pub fn save_word(&self, word: &Word) -> StorageResult<()> {
        let conn = self.get_conn()?;
        let changed = word.update(&conn)?;
        if changed == 0 {
            word.insert(&conn)?;
        }
        Ok(())
    }

    /// 删除单词及其学习状态
    ///
    /// 返回是否确实删除了一行。
    pub fn delete_word(&self, id: &str) -> StorageResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM word_stat WHERE word_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM word WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// 全部已知拼写的小写集合 (导入候选过滤用)
    pub fn lowercase_terms(&self) -> StorageResult<std::collections::HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT LOWER(term) FROM word")?;
        let terms = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(terms)
    }
}
