//! 学习会话控制
//!
//! 驱动一次学习会话的状态机:
//!
//! ```text
//! Loading → DailyActive → DailyFinished → (ReviewActive → ReviewFinished)
//! ```
//!
//! 每日新词会话支持当天断点续学: 选词结果的内容签名与当前下标写入
//! 会话暂存，重新进入时签名一致则恢复下标，否则从头开始。快速复习
//! 会话从不跨重载恢复。

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use lexi_algo::types::{SelectionCandidate, SelectionMode, QUICK_REVIEW_COUNT};
use lexi_algo::select_words;

use crate::scratch::{load_resume_point, save_resume_point, ResumePoint, ScratchStore};
use crate::storage::models::Word;
use crate::storage::{SettingsRepository, StorageResult, WordRepository, WordStatRepository};
use crate::tracker::{LevelUp, ProgressTracker};

// ============================================================
// 会话状态
// ============================================================

/// 会话状态 (单一标签联合，杜绝布尔组合出非法状态)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// 尚未加载
    Loading,
    /// 每日新词进行中
    DailyActive,
    /// 每日新词已完成
    DailyFinished,
    /// 快速复习进行中
    ReviewActive,
    /// 快速复习已完成
    ReviewFinished,
}

/// 选词结果的内容签名 (有序 ID 的 SHA-256)
pub fn session_signature(ids: &[String]) -> String {
    let mut hasher = Sha256::new();
    for id in ids {
        hasher.update(id.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

// ============================================================
// SessionController
// ============================================================

/// 学习会话控制器
pub struct SessionController {
    words: WordRepository,
    stats: WordStatRepository,
    settings: SettingsRepository,
    tracker: ProgressTracker,
    scratch: Arc<dyn ScratchStore>,
    rng: ChaCha8Rng,

    phase: SessionPhase,
    word_set: Vec<Word>,
    index: usize,
    signature: String,
}

impl SessionController {
    pub fn new(
        words: WordRepository,
        stats: WordStatRepository,
        settings: SettingsRepository,
        tracker: ProgressTracker,
        scratch: Arc<dyn ScratchStore>,
    ) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::with_seed(words, stats, settings, tracker, scratch, seed)
    }

    /// 指定随机种子创建 (测试用)
    pub fn with_seed(
        words: WordRepository,
        stats: WordStatRepository,
        settings: SettingsRepository,
        tracker: ProgressTracker,
        scratch: Arc<dyn ScratchStore>,
        seed: u64,
    ) -> Self {
        Self {
            words,
            stats,
            settings,
            tracker,
            scratch,
            rng: ChaCha8Rng::seed_from_u64(seed),
            phase: SessionPhase::Loading,
            word_set: Vec::new(),
            index: 0,
            signature: String::new(),
        }
    }

    // ========== 查询 ==========

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// 当前展示的单词
    pub fn current_word(&self) -> Option<&Word> {
        self.word_set.get(self.index)
    }

    pub fn progress_in_session(&self) -> (usize, usize) {
        (self.index, self.word_set.len())
    }

    // ========== 选词 ==========

    /// 构造选词候选并执行选词，返回选中的单词 (保持选词顺序)
    fn pick(&mut self, mode: SelectionMode, count: usize, now: DateTime<Utc>) -> StorageResult<Vec<Word>> {
        let settings = self.settings.get_settings()?;
        let words = self.words.get_words_by_grade(settings.grade)?;
        let stats = self.stats.get_all_stats()?;

        let candidates: Vec<SelectionCandidate> = words
            .iter()
            .map(|w| SelectionCandidate {
                id: w.id.clone(),
                is_custom: w.is_custom,
                stat: stats.get(&w.id).cloned().unwrap_or_default(),
            })
            .collect();

        let ids = select_words(&candidates, mode, now.date_naive(), count, &mut self.rng);

        let mut by_id: HashMap<&str, &Word> = words.iter().map(|w| (w.id.as_str(), w)).collect();
        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(id.as_str()).cloned())
            .collect())
    }

    // ========== 状态迁移 ==========

    /// 进入 (或设置变更后刷新) 每日新词会话
    ///
    /// 暂存中的 `(签名, 下标)` 与新选词结果签名一致时恢复进度，
    /// 否则丢弃暂存、从下标 0 开始。
    pub fn refresh_daily(&mut self, now: DateTime<Utc>) -> StorageResult<()> {
        let goal = self.settings.get_settings()?.daily_goal as usize;
        self.word_set = self.pick(SelectionMode::DailyNew, goal, now)?;
        let ids: Vec<String> = self.word_set.iter().map(|w| w.id.clone()).collect();
        self.signature = session_signature(&ids);

        self.index = match load_resume_point(self.scratch.as_ref()) {
            Some(point) if point.signature == self.signature => point.index,
            Some(_) => {
                log::info!("resume point signature mismatch, restarting session");
                self.scratch.remove(crate::scratch::DAILY_SESSION_KEY);
                0
            }
            None => 0,
        };

        if self.index >= self.word_set.len() {
            self.phase = SessionPhase::DailyFinished;
            self.scratch.remove(crate::scratch::DAILY_SESSION_KEY);
        } else {
            self.phase = SessionPhase::DailyActive;
            self.persist_position();
        }
        Ok(())
    }

    /// 完成当前单词并前进
    ///
    /// 每日新词模式下记为「学会」(计数、连续天数、XP 见追踪器)；
    /// 快速复习模式只刷新复习时间并 +1 XP。返回可能的升级事件。
    pub fn advance(&mut self, now: DateTime<Utc>) -> StorageResult<Option<LevelUp>> {
        match self.phase {
            SessionPhase::DailyActive => {
                let word_id = match self.current_word() {
                    Some(w) => w.id.clone(),
                    None => return Ok(None),
                };
                let level_up = self.tracker.on_word_learned(&word_id, false, now)?;
                self.index += 1;
                if self.index < self.word_set.len() {
                    self.persist_position();
                } else {
                    self.phase = SessionPhase::DailyFinished;
                    self.scratch.remove(crate::scratch::DAILY_SESSION_KEY);
                }
                Ok(level_up)
            }
            SessionPhase::ReviewActive => {
                let word_id = match self.current_word() {
                    Some(w) => w.id.clone(),
                    None => return Ok(None),
                };
                let level_up = self.tracker.on_word_learned(&word_id, true, now)?;
                self.index += 1;
                if self.index >= self.word_set.len() {
                    self.phase = SessionPhase::ReviewFinished;
                }
                Ok(level_up)
            }
            _ => Ok(None),
        }
    }

    /// 从「每日新词已完成」重新抽一轮
    pub fn retry_daily(&mut self, now: DateTime<Utc>) -> StorageResult<()> {
        self.scratch.remove(crate::scratch::DAILY_SESSION_KEY);
        self.refresh_daily(now)
    }

    /// 开始快速复习 (至多 3 词; 无可复习的词返回 false)
    ///
    /// 快速复习会话不写暂存。
    pub fn start_quick_review(&mut self, now: DateTime<Utc>) -> StorageResult<bool> {
        self.word_set = self.pick(SelectionMode::QuickReview, QUICK_REVIEW_COUNT, now)?;
        self.index = 0;
        if self.word_set.is_empty() {
            self.phase = SessionPhase::ReviewFinished;
            return Ok(false);
        }
        self.phase = SessionPhase::ReviewActive;
        Ok(true)
    }

    /// 放弃会话返回主页
    pub fn exit_to_dashboard(&mut self) {
        if self.phase == SessionPhase::DailyActive {
            self.scratch.remove(crate::scratch::DAILY_SESSION_KEY);
        }
        self.phase = SessionPhase::Loading;
        self.word_set.clear();
        self.index = 0;
        self.signature.clear();
    }

    fn persist_position(&self) {
        save_resume_point(
            self.scratch.as_ref(),
            &ResumePoint {
                signature: self.signature.clone(),
                index: self.index,
            },
        );
    }
}
