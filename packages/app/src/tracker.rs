//! 学习进度追踪
//!
//! 聚合「单词学会」与「测验完成」事件: 刷新学习状态时间戳、维护
//! 今日/累计计数与连续天数，并负责 XP 入账与等级缓存重算。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use lexi_algo::level::level_for_xp;
use lexi_algo::types::{XP_PER_DAILY_WORD, XP_PER_QUICK_REVIEW};
use lexi_algo::QUIZ_XP_MULTIPLIER;

use crate::storage::{ProgressRepository, SettingsRepository, StorageResult, WordStatRepository};

/// 升级事件 (一次性通知)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
}

/// 一次测验的汇总结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizSummary {
    pub score: i32,
    pub total: i32,
    /// 本次答错的单词 ID
    pub incorrect_word_ids: Vec<String>,
}

/// 学习进度追踪器
#[derive(Clone)]
pub struct ProgressTracker {
    stats: WordStatRepository,
    progress: ProgressRepository,
    settings: SettingsRepository,
}

impl ProgressTracker {
    pub fn new(
        stats: WordStatRepository,
        progress: ProgressRepository,
        settings: SettingsRepository,
    ) -> Self {
        Self {
            stats,
            progress,
            settings,
        }
    }

    /// 单词学会事件
    ///
    /// - 总是刷新该词的最后复习时间
    /// - 每日新词且当天首次复习: 今日/累计计数 +1、更新连续天数、+5 XP
    /// - 快速复习: 仅 +1 XP，不影响计数与连续天数
    /// - 每日新词但当天已复习过: 只刷新时间戳，不重复计数
    pub fn on_word_learned(
        &self,
        word_id: &str,
        is_quick_review: bool,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<LevelUp>> {
        let today = now.date_naive();
        let already_today = self
            .stats
            .get_or_default(word_id)?
            .reviewed_on(today);

        self.stats.touch_reviewed(word_id, now)?;

        if is_quick_review {
            return self.add_xp(XP_PER_QUICK_REVIEW);
        }

        if already_today {
            log::debug!("word {word_id} already counted today, timestamp refreshed only");
            return Ok(None);
        }

        self.progress.increment_learned(today)?;

        let mut streak = self.progress.get_snapshot()?.streak();
        streak.record_learned(today);
        self.progress.save_streak(&streak)?;

        self.add_xp(XP_PER_DAILY_WORD)
    }

    /// 测验完成事件
    ///
    /// 追加历史、标记今日已测、按 `round(score * 1.5)` 入账 XP。
    /// 答错单词的计数在答题时已即时累加，这里不再处理。
    pub fn on_quiz_completed(
        &self,
        summary: &QuizSummary,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<LevelUp>> {
        let today = now.date_naive();
        self.progress
            .append_quiz(summary.score, summary.total, today)?;
        self.add_xp((summary.score as f64 * QUIZ_XP_MULTIPLIER).round() as i64)
    }

    /// XP 入账并重算等级缓存
    ///
    /// 等级只在这里重算 (写时投影)。新等级高于缓存值时返回一次性
    /// 升级事件。
    pub fn add_xp(&self, amount: i64) -> StorageResult<Option<LevelUp>> {
        if amount == 0 {
            return Ok(None);
        }
        let mut settings = self.settings.get_settings()?;
        settings.xp += amount;

        let new_level = level_for_xp(settings.xp);
        let level_up = if new_level > settings.level {
            let event = LevelUp {
                from: settings.level,
                to: new_level,
            };
            settings.level = new_level;
            Some(event)
        } else {
            None
        };

        self.settings.save_settings(&settings)?;
        Ok(level_up)
    }

    /// 应用启动时的连续天数校正
    pub fn correct_streak_on_load(&self, today: NaiveDate) -> StorageResult<()> {
        let mut streak = self.progress.get_snapshot()?.streak();
        if streak.correct_on_load(today) {
            log::info!("streak broken after absence, current reset to 0");
            self.progress.save_streak(&streak)?;
        }
        Ok(())
    }
}
