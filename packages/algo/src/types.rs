//! 公共类型和常量
//!
//! 各算法模块共享的数据结构。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==================== 常量 ====================

/// 每日新词完成一个单词获得的 XP
pub const XP_PER_DAILY_WORD: i64 = 5;

/// 快速复习完成一个单词获得的 XP
pub const XP_PER_QUICK_REVIEW: i64 = 1;

/// 创建自定义单词获得的 XP
pub const XP_PER_CUSTOM_WORD: i64 = 2;

/// 测验得分换算 XP 的系数 (XP = round(score * 系数))
pub const QUIZ_XP_MULTIPLIER: f64 = 1.5;

/// 每次测验的最大题目数
pub const QUIZ_QUESTION_LIMIT: usize = 10;

/// 快速复习每轮的单词数
pub const QUICK_REVIEW_COUNT: usize = 3;

/// 每道测验题的选项数 (1 个正确释义 + 3 个干扰项)
pub const QUIZ_OPTION_COUNT: usize = 4;

// ==================== 学段 ====================

/// 学段分区键
///
/// 词库按学段划分，每个单词归属且仅归属一个学段。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Middle1,
    Middle2,
    Middle3,
    High1,
    High2,
    High3,
}

impl Grade {
    /// 全部学段，按学级升序
    pub const ALL: [Grade; 6] = [
        Grade::Middle1,
        Grade::Middle2,
        Grade::Middle3,
        Grade::High1,
        Grade::High2,
        Grade::High3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Middle1 => "middle1",
            Grade::Middle2 => "middle2",
            Grade::Middle3 => "middle3",
            Grade::High1 => "high1",
            Grade::High2 => "high2",
            Grade::High3 => "high3",
        }
    }

    /// 从字符串解析，未知值回退到 Middle1
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "middle2" => Grade::Middle2,
            "middle3" => Grade::Middle3,
            "high1" => Grade::High1,
            "high2" => Grade::High2,
            "high3" => Grade::High3,
            _ => Grade::Middle1,
        }
    }
}

impl Default for Grade {
    fn default() -> Self {
        Grade::Middle1
    }
}

// ==================== 选词模式 ====================

/// 选词模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionMode {
    /// 每日新词: 今天尚未复习过的单词
    DailyNew,
    /// 快速复习: 往日复习过、但今天尚未复习的单词
    QuickReview,
}

// ==================== 单词学习状态 ====================

/// 单词学习状态
///
/// 每个单词一条，缺失记录等价于默认值。
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WordStat {
    /// 是否已掌握 (用户手动标记，掌握后不再进入任何选词)
    pub is_mastered: bool,
    /// 最后一次复习时间 (从未复习为 None)
    pub last_reviewed: Option<DateTime<Utc>>,
    /// 测验答错累计次数 (单调递增)
    pub quiz_incorrect_count: i64,
}

impl WordStat {
    /// 最后复习时间是否落在指定日历日
    pub fn reviewed_on(&self, date: NaiveDate) -> bool {
        self.last_reviewed
            .map(|ts| ts.date_naive() == date)
            .unwrap_or(false)
    }

    /// 排序用时间戳: 从未复习视为 epoch 0，排在最前
    pub fn last_reviewed_ts(&self) -> i64 {
        self.last_reviewed.map(|ts| ts.timestamp()).unwrap_or(0)
    }
}

// ==================== 选词候选 ====================

/// 选词引擎的输入候选
///
/// 调用方 (应用层) 负责按学段过滤后构造；选词引擎只关心
/// 学习状态与是否为自定义单词。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionCandidate {
    /// 单词 ID
    pub id: String,
    /// 是否为用户自建单词 (同分时优先)
    pub is_custom: bool,
    /// 学习状态
    pub stat: WordStat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_grade_round_trip() {
        for grade in Grade::ALL {
            assert_eq!(Grade::from_str(grade.as_str()), grade);
        }
    }

    #[test]
    fn test_grade_unknown_falls_back() {
        assert_eq!(Grade::from_str("elementary9"), Grade::Middle1);
        assert_eq!(Grade::from_str(""), Grade::Middle1);
    }

    #[test]
    fn test_default_stat() {
        let stat = WordStat::default();
        assert!(!stat.is_mastered);
        assert!(stat.last_reviewed.is_none());
        assert_eq!(stat.quiz_incorrect_count, 0);
        assert_eq!(stat.last_reviewed_ts(), 0);
    }

    #[test]
    fn test_reviewed_on_uses_calendar_day() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 5, 23, 59, 0).unwrap();
        let stat = WordStat {
            last_reviewed: Some(ts),
            ..Default::default()
        };
        assert!(stat.reviewed_on(ts.date_naive()));
        assert!(!stat.reviewed_on(ts.date_naive().succ_opt().unwrap()));
    }
}
