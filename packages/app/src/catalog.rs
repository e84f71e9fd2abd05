//! 词库管理
//!
//! 自定义单词的新建、编辑与删除，以及从外部文本提取生词候选。
//! 内置单词只读；拼写在整个词库内大小写不敏感唯一。

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use lexi_algo::types::{Grade, WordStat, XP_PER_CUSTOM_WORD};

use crate::storage::models::Word;
use crate::storage::{StorageError, StorageResult, WordRepository, WordStatRepository};
use crate::tracker::ProgressTracker;

// ============================================================
// 错误与结果类型
// ============================================================

/// 词库管理错误
///
/// 全部为用户可见的业务错误，调用方提示后继续运行，绝不崩溃。
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("必填字段缺失: {0}")]
    Validation(&'static str),

    #[error("拼写已存在: {0}")]
    DuplicateTerm(String),

    #[error("未找到可操作的自定义单词: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// 保存结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// 新建，携带新分配的单词 ID
    Created(String),
    /// 更新已有自定义单词
    Updated,
}

/// 待保存的单词草稿 (AI 补全只是预填充，保存内容以用户输入为准)
#[derive(Clone, Debug, Default)]
pub struct WordDraft {
    /// 更新路径携带已有 ID；新建为 None
    pub id: Option<String>,
    pub term: String,
    pub part_of_speech: String,
    pub meaning: String,
    pub example_sentence: String,
    pub pronunciation: Option<String>,
    pub example_sentence_meaning: Option<String>,
    pub grade_level: Grade,
    pub unit: Option<i32>,
}

// ============================================================
// CatalogService
// ============================================================

/// 词库管理服务
#[derive(Clone)]
pub struct CatalogService {
    words: WordRepository,
    stats: WordStatRepository,
    tracker: ProgressTracker,
}

impl CatalogService {
    pub fn new(words: WordRepository, stats: WordStatRepository, tracker: ProgressTracker) -> Self {
        Self {
            words,
            stats,
            tracker,
        }
    }

    /// 保存自定义单词 (新建或更新)
    ///
    /// 新建路径在整个词库 (含内置词) 内做大小写不敏感查重，命中即
    /// 拒绝且不产生任何写入；通过后分配 UUID、懒建默认学习状态并
    /// 奖励 2 XP。更新路径只允许 `is_custom = true` 的已有单词。
    pub fn save_custom_word(
        &self,
        draft: WordDraft,
        now: DateTime<Utc>,
    ) -> CatalogResult<SaveOutcome> {
        validate(&draft)?;

        if let Some(id) = &draft.id {
            return self.update_existing(id, &draft, now);
        }

        if self.words.term_exists(&draft.term, None)? {
            return Err(CatalogError::DuplicateTerm(draft.term.trim().to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let word = Word {
            id: id.clone(),
            term: draft.term.trim().to_string(),
            part_of_speech: draft.part_of_speech.trim().to_string(),
            meaning: draft.meaning.trim().to_string(),
            example_sentence: draft.example_sentence.trim().to_string(),
            pronunciation: draft.pronunciation,
            example_sentence_meaning: draft.example_sentence_meaning,
            grade_level: draft.grade_level,
            unit: draft.unit,
            is_custom: true,
            created_at: now,
            updated_at: now,
        };
        self.words.save_word(&word)?;
        self.stats.upsert(&id, &WordStat::default())?;
        self.tracker.add_xp(XP_PER_CUSTOM_WORD)?;
        log::info!("custom word created: {} ({id})", word.term);
        Ok(SaveOutcome::Created(id))
    }

    fn update_existing(
        &self,
        id: &str,
        draft: &WordDraft,
        now: DateTime<Utc>,
    ) -> CatalogResult<SaveOutcome> {
        let existing = self
            .words
            .get_word(id)?
            .filter(|w| w.is_custom)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        if self.words.term_exists(&draft.term, Some(id))? {
            return Err(CatalogError::DuplicateTerm(draft.term.trim().to_string()));
        }

        let word = Word {
            term: draft.term.trim().to_string(),
            part_of_speech: draft.part_of_speech.trim().to_string(),
            meaning: draft.meaning.trim().to_string(),
            example_sentence: draft.example_sentence.trim().to_string(),
            pronunciation: draft.pronunciation.clone(),
            example_sentence_meaning: draft.example_sentence_meaning.clone(),
            grade_level: draft.grade_level,
            unit: draft.unit,
            updated_at: now,
            ..existing
        };
        self.words.save_word(&word)?;
        Ok(SaveOutcome::Updated)
    }

    /// 删除自定义单词及其学习状态
    ///
    /// 内置单词或不存在的 ID 返回 NotFound，由调用方提示。
    pub fn delete_custom_word(&self, id: &str) -> CatalogResult<()> {
        let word = self
            .words
            .get_word(id)?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        if !word.is_custom {
            log::warn!("refusing to delete builtin word {id}");
            return Err(CatalogError::NotFound(id.to_string()));
        }
        self.words.delete_word(id)?;
        Ok(())
    }

    /// 从外部文本提取生词候选
    ///
    /// 正则分词、小写去重、过滤已在词库中的拼写，至多返回 `limit` 个。
    pub fn import_candidates(&self, text: &str, limit: usize) -> StorageResult<Vec<String>> {
        let known = self.words.lowercase_terms()?;
        let pattern = Regex::new(r"[A-Za-z][A-Za-z'\-]{2,}").expect("invalid token pattern");

        let mut seen = std::collections::HashSet::new();
        let mut candidates = Vec::new();
        for token in pattern.find_iter(text) {
            let lower = token.as_str().to_lowercase();
            if known.contains(&lower) || !seen.insert(lower.clone()) {
                continue;
            }
            candidates.push(lower);
            if candidates.len() >= limit {
                break;
            }
        }
        Ok(candidates)
    }
}

fn validate(draft: &WordDraft) -> CatalogResult<()> {
    if draft.term.trim().is_empty() {
        return Err(CatalogError::Validation("term"));
    }
    if draft.meaning.trim().is_empty() {
        return Err(CatalogError::Validation("meaning"));
    }
    if draft.part_of_speech.trim().is_empty() {
        return Err(CatalogError::Validation("partOfSpeech"));
    }
    if draft.example_sentence.trim().is_empty() {
        return Err(CatalogError::Validation("exampleSentence"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DatabaseManager, ProgressRepository, SettingsRepository};
    use chrono::TimeZone;

    struct Fixture {
        catalog: CatalogService,
        words: WordRepository,
        stats: WordStatRepository,
        settings: SettingsRepository,
    }

    fn setup() -> Fixture {
        let db = DatabaseManager::open_in_memory().unwrap();
        let words = WordRepository::new(db.connection());
        let stats = WordStatRepository::new(db.connection());
        let settings = SettingsRepository::new(db.connection());
        let tracker = ProgressTracker::new(
            stats.clone(),
            ProgressRepository::new(db.connection()),
            settings.clone(),
        );
        Fixture {
            catalog: CatalogService::new(words.clone(), stats.clone(), tracker),
            words,
            stats,
            settings,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn draft(term: &str) -> WordDraft {
        WordDraft {
            term: term.to_string(),
            part_of_speech: "n.".to_string(),
            meaning: "测试释义".to_string(),
            example_sentence: "An example.".to_string(),
            grade_level: Grade::Middle2,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_awards_xp_and_initializes_stat() {
        let fx = setup();
        let outcome = fx.catalog.save_custom_word(draft("ephemeral"), now()).unwrap();
        let id = match outcome {
            SaveOutcome::Created(id) => id,
            other => panic!("unexpected outcome: {other:?}"),
        };

        let word = fx.words.get_word(&id).unwrap().unwrap();
        assert!(word.is_custom);
        assert_eq!(fx.settings.get_settings().unwrap().xp, XP_PER_CUSTOM_WORD);
        assert!(fx.stats.get_record(&id).unwrap().is_some());
    }

    #[test]
    fn test_validation_rejects_blank_fields() {
        let fx = setup();
        let mut d = draft("valid");
        d.meaning = "   ".to_string();
        let before = fx.words.get_all_words().unwrap().len();
        assert!(matches!(
            fx.catalog.save_custom_word(d, now()),
            Err(CatalogError::Validation("meaning"))
        ));
        assert_eq!(fx.words.get_all_words().unwrap().len(), before);
    }

    #[test]
    fn test_duplicate_term_rejected_against_builtin_and_custom() {
        let fx = setup();
        let before = fx.words.get_all_words().unwrap().len();

        // 撞内置词 (大小写不同)
        assert!(matches!(
            fx.catalog.save_custom_word(draft("ABANDON"), now()),
            Err(CatalogError::DuplicateTerm(_))
        ));

        // 撞自定义词
        fx.catalog.save_custom_word(draft("ephemeral"), now()).unwrap();
        assert!(matches!(
            fx.catalog.save_custom_word(draft("Ephemeral"), now()),
            Err(CatalogError::DuplicateTerm(_))
        ));

        assert_eq!(fx.words.get_all_words().unwrap().len(), before + 1);
    }

    #[test]
    fn test_update_only_touches_custom_words() {
        let fx = setup();
        let id = match fx.catalog.save_custom_word(draft("ephemeral"), now()).unwrap() {
            SaveOutcome::Created(id) => id,
            _ => unreachable!(),
        };

        let mut d = draft("ephemeral");
        d.id = Some(id.clone());
        d.meaning = "短暂的".to_string();
        assert_eq!(
            fx.catalog.save_custom_word(d, now()).unwrap(),
            SaveOutcome::Updated
        );
        assert_eq!(fx.words.get_word(&id).unwrap().unwrap().meaning, "短暂的");

        // 内置词不可走更新路径
        let mut d = draft("whatever");
        d.id = Some("w-m1-001".to_string());
        assert!(matches!(
            fx.catalog.save_custom_word(d, now()),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_custom_word_removes_stat_and_is_idempotent_error() {
        let fx = setup();
        let id = match fx.catalog.save_custom_word(draft("ephemeral"), now()).unwrap() {
            SaveOutcome::Created(id) => id,
            _ => unreachable!(),
        };
        fx.catalog.delete_custom_word(&id).unwrap();
        assert!(fx.words.get_word(&id).unwrap().is_none());
        assert!(fx.stats.get_record(&id).unwrap().is_none());

        // 再删同一 ID: NotFound，不崩溃
        assert!(matches!(
            fx.catalog.delete_custom_word(&id),
            Err(CatalogError::NotFound(_))
        ));
        // 内置词同样拒绝
        assert!(matches!(
            fx.catalog.delete_custom_word("w-m1-001"),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_import_candidates_filters_known_terms() {
        let fx = setup();
        let text = "They abandon the ship. The ephemeral glow was Ephemeral indeed, xyz ab.";
        let candidates = fx.catalog.import_candidates(text, 10).unwrap();
        // "abandon" 已在内置词库; "ephemeral" 去重后只出现一次;
        // 过短的 "ab"/"xyz" 中 "xyz" 长度够、"ab" 被丢弃
        assert!(!candidates.contains(&"abandon".to_string()));
        assert_eq!(
            candidates.iter().filter(|c| *c == "ephemeral").count(),
            1
        );
        assert!(candidates.contains(&"xyz".to_string()));
        assert!(!candidates.contains(&"ab".to_string()));
    }
}
