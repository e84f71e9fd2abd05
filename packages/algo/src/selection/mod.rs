//! 选词引擎
//!
//! 给定候选单词及其学习状态，按模式过滤资格、按优先级排序，
//! 然后整体随机打散并截断到目标数量。
//!
//! 核心规则:
//! - 已掌握的单词 (`is_mastered`) 在任何模式下都不参与
//! - 每日新词: 从未复习、或最后复习不在今天
//! - 快速复习: 往日复习过、且今天尚未复习
//!
//! 往日复习过的单词同时具备两种模式的资格; 从未复习的单词只属于
//! 每日新词，今天已复习的单词两种模式都不再入选。
//!
//! 优先级 (降序):
//! 1. 测验答错次数多的优先
//! 2. 最后复习时间早的优先 (从未复习按 epoch 0 计，排在最前)
//! 3. 完全同分时自定义单词优先于内置单词
//!
//! 排序之后对候选整体做一次随机打散再截断。优先级只决定哪些单词
//! 成为候选，不保证出场顺序 —— 必须保持「排序 → 打散 → 截断」
//! 的固定次序。

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

use crate::types::{SelectionCandidate, SelectionMode};

/// 判断候选是否具备指定模式的资格
fn is_eligible(candidate: &SelectionCandidate, mode: SelectionMode, today: NaiveDate) -> bool {
    if candidate.stat.is_mastered {
        return false;
    }
    match mode {
        SelectionMode::DailyNew => !candidate.stat.reviewed_on(today),
        SelectionMode::QuickReview => {
            candidate.stat.last_reviewed.is_some() && !candidate.stat.reviewed_on(today)
        }
    }
}

/// 优先级比较 (高优先级在前)
fn priority_order(a: &SelectionCandidate, b: &SelectionCandidate) -> Ordering {
    b.stat
        .quiz_incorrect_count
        .cmp(&a.stat.quiz_incorrect_count)
        .then_with(|| a.stat.last_reviewed_ts().cmp(&b.stat.last_reviewed_ts()))
        .then_with(|| b.is_custom.cmp(&a.is_custom))
}

/// 选词
///
/// 返回至多 `count` 个单词 ID。候选为空或全部不合格时返回空列表，
/// 调用方应将其视为「无事可做」而不是错误。
pub fn select_words<R: Rng>(
    candidates: &[SelectionCandidate],
    mode: SelectionMode,
    today: NaiveDate,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut pool: Vec<&SelectionCandidate> = candidates
        .iter()
        .filter(|c| is_eligible(c, mode, today))
        .collect();

    pool.sort_by(|a, b| priority_order(a, b));
    pool.shuffle(rng);
    pool.truncate(count);

    pool.into_iter().map(|c| c.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WordStat;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn candidate(id: &str, stat: WordStat) -> SelectionCandidate {
        SelectionCandidate {
            id: id.to_string(),
            is_custom: false,
            stat,
        }
    }

    fn reviewed_days_ago(days: i64) -> WordStat {
        let date = today() - chrono::Duration::days(days);
        WordStat {
            last_reviewed: Some(
                Utc.from_utc_datetime(&date.and_hms_opt(9, 0, 0).unwrap()),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_mastered_words_never_selected() {
        let mastered = candidate(
            "w1",
            WordStat {
                is_mastered: true,
                ..Default::default()
            },
        );
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for mode in [SelectionMode::DailyNew, SelectionMode::QuickReview] {
            let out = select_words(&[mastered.clone()], mode, today(), 10, &mut rng);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_daily_new_excludes_reviewed_today() {
        let fresh = candidate("never", WordStat::default());
        let stale = candidate("stale", reviewed_days_ago(3));
        let done_today = candidate("today", reviewed_days_ago(0));

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let out = select_words(
            &[fresh, stale, done_today],
            SelectionMode::DailyNew,
            today(),
            10,
            &mut rng,
        );
        assert_eq!(out.len(), 2);
        assert!(out.contains(&"never".to_string()));
        assert!(out.contains(&"stale".to_string()));
        assert!(!out.contains(&"today".to_string()));
    }

    #[test]
    fn test_quick_review_requires_prior_day_review() {
        let fresh = candidate("never", WordStat::default());
        let stale = candidate("stale", reviewed_days_ago(1));
        let done_today = candidate("today", reviewed_days_ago(0));

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = select_words(
            &[fresh, stale, done_today],
            SelectionMode::QuickReview,
            today(),
            10,
            &mut rng,
        );
        assert_eq!(out, vec!["stale".to_string()]);
    }

    #[test]
    fn test_eligibility_partition_by_review_state() {
        // 资格只由复习状态决定: 从未复习 → 仅每日新词;
        // 往日复习过 → 两种模式都具备; 今天已复习或已掌握 → 都不具备
        let cases = [
            (WordStat::default(), true, false),
            (reviewed_days_ago(0), false, false),
            (reviewed_days_ago(1), true, true),
            (reviewed_days_ago(30), true, true),
            (
                WordStat {
                    is_mastered: true,
                    ..Default::default()
                },
                false,
                false,
            ),
        ];
        for (i, (stat, want_daily, want_review)) in cases.iter().enumerate() {
            let c = candidate(&format!("w{i}"), stat.clone());
            let daily = super::is_eligible(&c, SelectionMode::DailyNew, today());
            let review = super::is_eligible(&c, SelectionMode::QuickReview, today());
            assert_eq!(daily, *want_daily, "candidate {i} daily eligibility");
            assert_eq!(review, *want_review, "candidate {i} review eligibility");
        }
    }

    #[test]
    fn test_single_word_catalog_scenario() {
        // 只有 1 个从未复习的单词: DailyNew 返回它，QuickReview 为空
        let w = candidate("only", WordStat::default());
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let daily = select_words(
            std::slice::from_ref(&w),
            SelectionMode::DailyNew,
            today(),
            10,
            &mut rng,
        );
        assert_eq!(daily, vec!["only".to_string()]);

        let review = select_words(
            std::slice::from_ref(&w),
            SelectionMode::QuickReview,
            today(),
            10,
            &mut rng,
        );
        assert!(review.is_empty());
    }

    #[test]
    fn test_truncates_to_count() {
        let pool: Vec<SelectionCandidate> = (0..50)
            .map(|i| candidate(&format!("w{i}"), WordStat::default()))
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let out = select_words(&pool, SelectionMode::DailyNew, today(), 7, &mut rng);
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn test_priority_order_surfaces_trouble_words() {
        let mut wrong_often = reviewed_days_ago(1);
        wrong_often.quiz_incorrect_count = 5;
        let a = candidate("wrong-often", wrong_often);
        let b = candidate("stale", reviewed_days_ago(10));
        let c = candidate("never", WordStat::default());
        let custom = SelectionCandidate {
            id: "custom-never".to_string(),
            is_custom: true,
            stat: WordStat::default(),
        };

        let mut pool: Vec<&SelectionCandidate> = vec![&b, &c, &a, &custom];
        pool.sort_by(|x, y| priority_order(x, y));
        let order: Vec<&str> = pool.iter().map(|c| c.id.as_str()).collect();
        // 答错次数最高者最优先；从未复习 (epoch 0) 先于有复习记录者；
        // 完全同分时自定义单词在前
        assert_eq!(order, vec!["wrong-often", "custom-never", "never", "stale"]);
    }

    #[test]
    fn test_empty_pool_returns_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let out = select_words(&[], SelectionMode::DailyNew, today(), 10, &mut rng);
        assert!(out.is_empty());
    }
}
