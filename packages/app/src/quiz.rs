//! 测验引擎
//!
//! 从当前学段均匀随机抽取至多 10 词出题 (与选词引擎不同，不做
//! 优先级加权)。每题 4 个选项: 正确释义 + 同学段释义干扰项。
//!
//! 答题为一次性动作: 每题只接受第一次作答，答错即时累加该词的
//! 答错计数 (不等到测验结束)。测验完成后把 `(得分, 题数, 错词)`
//! 汇报给进度追踪器。

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use lexi_algo::generate_options;
use lexi_algo::types::QUIZ_QUESTION_LIMIT;

use crate::storage::models::Word;
use crate::storage::{StorageResult, WordRepository, WordStatRepository};
use crate::tracker::{LevelUp, ProgressTracker, QuizSummary};

// ============================================================
// 类型
// ============================================================

/// 一道题目 (展示视图)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// 考察的单词
    pub word: Word,
    /// 打散后的选项 (恰含一个正确释义)
    pub options: Vec<String>,
}

/// 单题作答结果
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    /// 是否还有下一题
    pub has_next: bool,
}

/// 一次测验会话
#[derive(Clone, Debug)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current: usize,
    score: i32,
    incorrect: Vec<String>,
    answered: bool,
}

impl QuizSession {
    /// 当前题目 (测验结束返回 None)
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn total(&self) -> i32 {
        self.questions.len() as i32
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.questions.len()
    }

    /// 汇总结果
    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            score: self.score,
            total: self.total(),
            incorrect_word_ids: self.incorrect.clone(),
        }
    }
}

// ============================================================
// QuizEngine
// ============================================================

/// 测验引擎
pub struct QuizEngine {
    words: WordRepository,
    stats: WordStatRepository,
    tracker: ProgressTracker,
    rng: ChaCha8Rng,
}

impl QuizEngine {
    pub fn new(words: WordRepository, stats: WordStatRepository, tracker: ProgressTracker) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::with_seed(words, stats, tracker, seed)
    }

    /// 指定随机种子创建 (测试用)
    pub fn with_seed(
        words: WordRepository,
        stats: WordStatRepository,
        tracker: ProgressTracker,
        seed: u64,
    ) -> Self {
        Self {
            words,
            stats,
            tracker,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// 开始一次测验
    ///
    /// 学段内无单词时返回 None (「无词可测」终态，不是错误)。
    pub fn start(&mut self, grade: lexi_algo::types::Grade) -> StorageResult<Option<QuizSession>> {
        let mut pool = self.words.get_words_by_grade(grade)?;
        if pool.is_empty() {
            return Ok(None);
        }

        pool.shuffle(&mut self.rng);
        pool.truncate(QUIZ_QUESTION_LIMIT);

        let meanings: Vec<String> = self
            .words
            .get_words_by_grade(grade)?
            .into_iter()
            .map(|w| w.meaning)
            .collect();

        let questions = pool
            .into_iter()
            .map(|word| {
                let distractor_pool: Vec<String> = meanings
                    .iter()
                    .filter(|m| *m != &word.meaning)
                    .cloned()
                    .collect();
                let options = generate_options(&word.meaning, &distractor_pool, &mut self.rng);
                QuizQuestion { word, options }
            })
            .collect();

        Ok(Some(QuizSession {
            questions,
            current: 0,
            score: 0,
            incorrect: Vec::new(),
            answered: false,
        }))
    }

    /// 作答当前题目
    ///
    /// 每题只接受一次作答，重复点击返回 None。答错即时累加该词的
    /// 答错计数并推进到下一题。
    pub fn answer(
        &mut self,
        session: &mut QuizSession,
        selected: &str,
    ) -> StorageResult<Option<AnswerOutcome>> {
        if session.answered || session.is_finished() {
            return Ok(None);
        }
        let question = match session.current_question() {
            Some(q) => q.clone(),
            None => return Ok(None),
        };
        session.answered = true;

        let correct = selected == question.word.meaning;
        if correct {
            session.score += 1;
        } else {
            session.incorrect.push(question.word.id.clone());
            self.stats.increment_incorrect(&question.word.id)?;
        }

        Ok(Some(AnswerOutcome {
            correct,
            has_next: session.current + 1 < session.questions.len(),
        }))
    }

    /// 进入下一题 (清除单题作答门闩)
    pub fn next_question(&self, session: &mut QuizSession) {
        if session.answered {
            session.current += 1;
            session.answered = false;
        }
    }

    /// 结束测验并汇报进度
    pub fn finish(
        &self,
        session: &QuizSession,
        now: DateTime<Utc>,
    ) -> StorageResult<(QuizSummary, Option<LevelUp>)> {
        let summary = session.summary();
        let level_up = self.tracker.on_quiz_completed(&summary, now)?;
        Ok((summary, level_up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DatabaseManager, ProgressRepository, SettingsRepository};
    use chrono::TimeZone;
    use lexi_algo::types::Grade;

    struct Fixture {
        engine: QuizEngine,
        stats: WordStatRepository,
        progress: ProgressRepository,
        settings: SettingsRepository,
        db: DatabaseManager,
    }

    fn setup() -> Fixture {
        let db = DatabaseManager::open_in_memory().unwrap();
        let stats = WordStatRepository::new(db.connection());
        let progress = ProgressRepository::new(db.connection());
        let settings = SettingsRepository::new(db.connection());
        let tracker = ProgressTracker::new(stats.clone(), progress.clone(), settings.clone());
        let engine = QuizEngine::with_seed(
            WordRepository::new(db.connection()),
            stats.clone(),
            tracker,
            11,
        );
        Fixture {
            engine,
            stats,
            progress,
            settings,
            db,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_start_samples_up_to_limit() {
        let mut fx = setup();
        let session = fx.engine.start(Grade::Middle1).unwrap().unwrap();
        // middle1 内置 3 词，全部入题
        assert_eq!(session.total(), 3);
        for q in &session.questions {
            assert!(q.options.contains(&q.word.meaning));
            assert_eq!(
                q.options.iter().filter(|o| **o == q.word.meaning).count(),
                1
            );
            let unique: std::collections::HashSet<&String> = q.options.iter().collect();
            assert_eq!(unique.len(), q.options.len());
        }
    }

    #[test]
    fn test_answer_gate_is_one_shot() {
        let mut fx = setup();
        let mut session = fx.engine.start(Grade::Middle1).unwrap().unwrap();
        let meaning = session.current_question().unwrap().word.meaning.clone();

        let outcome = fx.engine.answer(&mut session, &meaning).unwrap().unwrap();
        assert!(outcome.correct);
        // 同一题重复作答被拒
        assert!(fx.engine.answer(&mut session, &meaning).unwrap().is_none());

        fx.engine.next_question(&mut session);
        assert!(!session.answered);
    }

    #[test]
    fn test_all_wrong_quiz_updates_stats_and_history() {
        let mut fx = setup();
        let mut session = fx.engine.start(Grade::Middle1).unwrap().unwrap();
        let total = session.total();

        let mut wrong_ids = Vec::new();
        while !session.is_finished() {
            let q = session.current_question().unwrap();
            wrong_ids.push(q.word.id.clone());
            let wrong = q
                .options
                .iter()
                .find(|o| **o != q.word.meaning)
                .expect("quiz option pool should contain a distractor")
                .clone();
            let outcome = fx.engine.answer(&mut session, &wrong).unwrap().unwrap();
            assert!(!outcome.correct);
            fx.engine.next_question(&mut session);
        }

        assert_eq!(session.score(), 0);
        let (summary, level_up) = fx.engine.finish(&session, now()).unwrap();
        assert_eq!(summary.score, 0);
        assert_eq!(summary.total, total);
        assert_eq!(summary.incorrect_word_ids.len(), total as usize);
        assert!(level_up.is_none()); // round(0 * 1.5) = 0 XP

        for id in &wrong_ids {
            assert_eq!(fx.stats.get_or_default(id).unwrap().quiz_incorrect_count, 1);
        }

        let history = fx.progress.quiz_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, 0);
        assert_eq!(history[0].total, total);
        assert_eq!(fx.settings.get_settings().unwrap().xp, 0);
    }

    #[test]
    fn test_empty_grade_reports_no_words() {
        let mut fx = setup();
        // 清空 high3 学段
        let words = WordRepository::new(fx.db.connection());
        for w in words.get_words_by_grade(Grade::High3).unwrap() {
            words.delete_word(&w.id).unwrap();
        }
        assert!(fx.engine.start(Grade::High3).unwrap().is_none());
    }
}
