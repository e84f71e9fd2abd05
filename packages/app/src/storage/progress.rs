//! 学习进度数据库操作
//!
//! 单行聚合 (今日计数、累计计数、连续天数) 加上仅追加的测验历史。
//! 「今日」相关字段带所属日期，读取时按日期判定是否翻转归零。

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use lexi_algo::Streak;

use crate::storage::models::{format_date, ProgressSnapshot, QuizRecord};
use crate::storage::{StorageError, StorageResult};

/// 学习进度仓储
#[derive(Clone)]
pub struct ProgressRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressRepository {
    /// 创建新的仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 读取进度聚合
    pub fn get_snapshot(&self) -> StorageResult<ProgressSnapshot> {
        let conn = self.get_conn()?;
        let snapshot = conn.query_row("SELECT * FROM progress WHERE id = 1", [], |row| {
            ProgressSnapshot::from_row(row)
        })?;
        Ok(snapshot)
    }

    /// 记一个「今日学会」: 今日计数与累计计数同时 +1
    ///
    /// 存储的日期与 `today` 不一致时先翻转归零再计数。
    pub fn increment_learned(&self, today: NaiveDate) -> StorageResult<()> {
        let snapshot = self.get_snapshot()?;
        let learned_today = snapshot.learned_on(today) + 1;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE progress SET
                learned_today = ?1, learned_date = ?2, total_learned = total_learned + 1
            WHERE id = 1
            "#,
            params![learned_today, format_date(today)],
        )?;
        Ok(())
    }

    /// 写回连续天数状态
    pub fn save_streak(&self, streak: &Streak) -> StorageResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE progress SET
                current_streak = ?1, best_streak = ?2, last_learned_date = ?3
            WHERE id = 1
            "#,
            params![
                streak.current,
                streak.best,
                streak.last_learned_date.map(format_date),
            ],
        )?;
        Ok(())
    }

    /// 追加一条测验历史并标记今日已测
    pub fn append_quiz(&self, score: i32, total: i32, today: NaiveDate) -> StorageResult<QuizRecord> {
        let record = QuizRecord {
            id: Uuid::new_v4().to_string(),
            score,
            total,
            taken_on: today,
        };
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO quiz_history (id, score, total, taken_on) VALUES (?1, ?2, ?3, ?4)",
            params![record.id, record.score, record.total, format_date(record.taken_on)],
        )?;
        conn.execute(
            "UPDATE progress SET quiz_taken_date = ?1 WHERE id = 1",
            params![format_date(today)],
        )?;
        Ok(record)
    }

    /// 全部测验历史 (按时间先后)
    pub fn quiz_history(&self) -> StorageResult<Vec<QuizRecord>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT * FROM quiz_history ORDER BY taken_on, id")?;
        let records = stmt
            .query_map([], |row| QuizRecord::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// 平均测验得分率 (百分制；无历史时为 0)
    pub fn average_quiz_score(&self) -> StorageResult<f64> {
        let history = self.quiz_history()?;
        if history.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = history
            .iter()
            .filter(|r| r.total > 0)
            .map(|r| r.score as f64 / r.total as f64 * 100.0)
            .sum();
        Ok(sum / history.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DatabaseManager;

    fn setup() -> ProgressRepository {
        let db = DatabaseManager::open_in_memory().unwrap();
        ProgressRepository::new(db.connection())
    }

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + chrono::Duration::days(n)
    }

    #[test]
    fn test_increment_learned_rolls_over_daily() {
        let repo = setup();
        repo.increment_learned(day(0)).unwrap();
        repo.increment_learned(day(0)).unwrap();

        let snapshot = repo.get_snapshot().unwrap();
        assert_eq!(snapshot.learned_on(day(0)), 2);
        assert_eq!(snapshot.total_learned, 2);

        // 次日: 今日计数翻转，累计不变
        repo.increment_learned(day(1)).unwrap();
        let snapshot = repo.get_snapshot().unwrap();
        assert_eq!(snapshot.learned_on(day(1)), 1);
        assert_eq!(snapshot.learned_on(day(0)), 0);
        assert_eq!(snapshot.total_learned, 3);
    }

    #[test]
    fn test_streak_round_trip() {
        let repo = setup();
        let streak = Streak {
            current: 4,
            best: 6,
            last_learned_date: Some(day(3)),
        };
        repo.save_streak(&streak).unwrap();
        assert_eq!(repo.get_snapshot().unwrap().streak(), streak);
    }

    #[test]
    fn test_quiz_history_append_only() {
        let repo = setup();
        repo.append_quiz(7, 10, day(0)).unwrap();
        repo.append_quiz(0, 3, day(1)).unwrap();

        let history = repo.quiz_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].score, 7);
        assert_eq!(history[1].total, 3);

        let snapshot = repo.get_snapshot().unwrap();
        assert!(snapshot.quiz_taken_on(day(1)));
        assert!(!snapshot.quiz_taken_on(day(2)));
    }

    #[test]
    fn test_average_quiz_score() {
        let repo = setup();
        assert_eq!(repo.average_quiz_score().unwrap(), 0.0);

        repo.append_quiz(5, 10, day(0)).unwrap();
        repo.append_quiz(10, 10, day(1)).unwrap();
        let avg = repo.average_quiz_score().unwrap();
        assert!((avg - 75.0).abs() < f64::EPSILON);
    }
}
