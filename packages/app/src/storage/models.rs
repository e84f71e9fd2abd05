//! 数据模型定义
//!
//! 定义 SQLite 存储所需的所有数据结构，以及与数据库行互转的方法。

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};

use lexi_algo::types::{Grade, WordStat};
use lexi_algo::Streak;

use crate::storage::StorageResult;

// ============================================================
// Word - 词条
// ============================================================

/// 词条
///
/// `is_custom = true` 的用户自建单词可编辑、可删除；内置单词只读。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// 单词唯一标识 (内置词为固定 ID，自建词为 UUID)
    pub id: String,
    /// 单词拼写
    pub term: String,
    /// 词性
    pub part_of_speech: String,
    /// 释义
    pub meaning: String,
    /// 例句
    pub example_sentence: String,
    /// 音标/发音 (可选)
    pub pronunciation: Option<String>,
    /// 例句译文 (可选)
    pub example_sentence_meaning: Option<String>,
    /// 学段
    pub grade_level: Grade,
    /// 单元编号 (可选)
    pub unit: Option<i32>,
    /// 是否为用户自建单词
    pub is_custom: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Word {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            term: row.get("term")?,
            part_of_speech: row.get("part_of_speech")?,
            meaning: row.get("meaning")?,
            example_sentence: row.get("example_sentence")?,
            pronunciation: row.get("pronunciation")?,
            example_sentence_meaning: row.get("example_sentence_meaning")?,
            grade_level: Grade::from_str(&row.get::<_, String>("grade_level")?),
            unit: row.get("unit")?,
            is_custom: row.get::<_, i32>("is_custom")? != 0,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
        })
    }

    /// 插入到数据库
    pub fn insert(&self, conn: &Connection) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO word (
                id, term, part_of_speech, meaning, example_sentence,
                pronunciation, example_sentence_meaning, grade_level, unit,
                is_custom, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                self.id,
                self.term,
                self.part_of_speech,
                self.meaning,
                self.example_sentence,
                self.pronunciation,
                self.example_sentence_meaning,
                self.grade_level.as_str(),
                self.unit,
                self.is_custom as i32,
                self.created_at.to_rfc3339(),
                self.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 更新已有行 (按 ID)
    pub fn update(&self, conn: &Connection) -> StorageResult<usize> {
        let changed = conn.execute(
            r#"
            UPDATE word SET
                term = ?2, part_of_speech = ?3, meaning = ?4,
                example_sentence = ?5, pronunciation = ?6,
                example_sentence_meaning = ?7, grade_level = ?8, unit = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                self.id,
                self.term,
                self.part_of_speech,
                self.meaning,
                self.example_sentence,
                self.pronunciation,
                self.example_sentence_meaning,
                self.grade_level.as_str(),
                self.unit,
                self.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(changed)
    }
}

// ============================================================
// WordStatRecord - 单词学习状态行
// ============================================================

/// 单词学习状态的持久化行
///
/// 缺失行等价于 [`WordStat::default`]；读取不会产生写入。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStatRecord {
    /// 所属单词 ID
    pub word_id: String,
    /// 是否已掌握
    pub is_mastered: bool,
    /// 最后复习时间
    pub last_reviewed: Option<DateTime<Utc>>,
    /// 测验答错累计次数
    pub quiz_incorrect_count: i64,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl WordStatRecord {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            word_id: row.get("word_id")?,
            is_mastered: row.get::<_, i32>("is_mastered")? != 0,
            last_reviewed: row
                .get::<_, Option<String>>("last_reviewed")?
                .map(parse_datetime),
            quiz_incorrect_count: row.get("quiz_incorrect_count")?,
            updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
        })
    }

    /// 转为算法层学习状态
    pub fn stat(&self) -> WordStat {
        WordStat {
            is_mastered: self.is_mastered,
            last_reviewed: self.last_reviewed,
            quiz_incorrect_count: self.quiz_incorrect_count,
        }
    }
}

// ============================================================
// UserSettings - 用户设置
// ============================================================

/// 用户设置 (单行)
///
/// `xp`/`level` 是写时缓存: 等级只在加 XP 时重算，读取时不反推。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// 当前学段
    pub grade: Grade,
    /// 每日学习目标 (单词数)
    pub daily_goal: u32,
    /// 用户名
    pub username: String,
    /// 主题
    pub theme: String,
    /// 朗读语速
    pub speech_rate: f64,
    /// 是否自动播放发音
    pub auto_play_audio: bool,
    /// 累计 XP
    pub xp: i64,
    /// 等级 (缓存投影)
    pub level: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            grade: Grade::Middle1,
            daily_goal: 10,
            username: String::new(),
            theme: "light".to_string(),
            speech_rate: 1.0,
            auto_play_audio: true,
            xp: 0,
            level: 1,
        }
    }
}

impl UserSettings {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            grade: Grade::from_str(&row.get::<_, String>("grade")?),
            daily_goal: row.get::<_, i64>("daily_goal")?.max(0) as u32,
            username: row.get("username")?,
            theme: row.get("theme")?,
            speech_rate: row.get("speech_rate")?,
            auto_play_audio: row.get::<_, i32>("auto_play_audio")? != 0,
            xp: row.get("xp")?,
            level: row.get::<_, i64>("level")?.max(1) as u32,
        })
    }
}

// ============================================================
// ProgressSnapshot - 学习进度聚合
// ============================================================

/// 学习进度聚合 (单行)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// 今日学会的单词数 (所属日期见 `learned_date`)
    pub learned_today: i64,
    /// `learned_today` 对应的日历日
    pub learned_date: Option<NaiveDate>,
    /// 累计学会的单词数 (单调递增，不随日期重置)
    pub total_learned: i64,
    /// 当前连续学习天数
    pub current_streak: i32,
    /// 历史最佳连续天数
    pub best_streak: i32,
    /// 最后一次有效学习的日历日
    pub last_learned_date: Option<NaiveDate>,
    /// 最后一次完成测验的日历日
    pub quiz_taken_date: Option<NaiveDate>,
}

impl ProgressSnapshot {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            learned_today: row.get("learned_today")?,
            learned_date: row
                .get::<_, Option<String>>("learned_date")?
                .and_then(|s| parse_date(&s)),
            total_learned: row.get("total_learned")?,
            current_streak: row.get("current_streak")?,
            best_streak: row.get("best_streak")?,
            last_learned_date: row
                .get::<_, Option<String>>("last_learned_date")?
                .and_then(|s| parse_date(&s)),
            quiz_taken_date: row
                .get::<_, Option<String>>("quiz_taken_date")?
                .and_then(|s| parse_date(&s)),
        })
    }

    /// 指定日历日的「今日已学」计数 (日期不匹配视为 0)
    pub fn learned_on(&self, today: NaiveDate) -> i64 {
        if self.learned_date == Some(today) {
            self.learned_today
        } else {
            0
        }
    }

    /// 指定日历日是否已完成过测验
    pub fn quiz_taken_on(&self, today: NaiveDate) -> bool {
        self.quiz_taken_date == Some(today)
    }

    /// 提取连续天数状态
    pub fn streak(&self) -> Streak {
        Streak {
            current: self.current_streak,
            best: self.best_streak,
            last_learned_date: self.last_learned_date,
        }
    }
}

// ============================================================
// QuizRecord - 测验历史
// ============================================================

/// 一次测验的结果记录 (仅追加)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecord {
    /// 记录 ID (UUID)
    pub id: String,
    /// 得分
    pub score: i32,
    /// 题目总数
    pub total: i32,
    /// 测验日期
    pub taken_on: NaiveDate,
}

impl QuizRecord {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            score: row.get("score")?,
            total: row.get("total")?,
            taken_on: parse_date(&row.get::<_, String>("taken_on")?)
                .unwrap_or_else(|| Utc::now().date_naive()),
        })
    }
}

// ============================================================
// 日期/时间解析
// ============================================================

/// 日期格式 (存储用)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_datetime(s: String) -> DateTime<Utc> {
    // 尝试多种格式
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return dt.with_timezone(&Utc);
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
        return DateTime::from_naive_utc_and_offset(dt, Utc);
    }

    // 默认返回当前时间
    Utc::now()
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
