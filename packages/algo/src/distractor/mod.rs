//! 测验干扰项生成
//!
//! 为一道选择题生成至多 4 个选项: 1 个正确释义 + 至多 3 个干扰项。
//!
//! 干扰项来源 (按顺序):
//! 1. 同学段其他单词的释义，去重并排除与正确释义相同者，随机抽取
//! 2. 来源不足 3 个时，从固定兜底释义表补齐，跳过与正确释义冲突者
//!
//! 词库极小 (不足 4 个不同释义且兜底耗尽) 时允许返回少于 4 个选项，
//! 调用方必须容忍而不是崩溃。

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::types::QUIZ_OPTION_COUNT;

/// 兜底释义表 (词库过小时填充)
pub const FALLBACK_MEANINGS: &[&str] = &["暂无释义", "其他含义", "相关词义", "常见搭配"];

/// 生成一道题的选项
///
/// `pool` 为同学段其他单词的释义 (可含重复)。返回的选项已打散，
/// 恰好包含一个等于 `correct_meaning` 的条目，且无重复。
pub fn generate_options<R: Rng>(
    correct_meaning: &str,
    pool: &[String],
    rng: &mut R,
) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(correct_meaning);

    let mut unique: Vec<&str> = Vec::new();
    for meaning in pool {
        if seen.insert(meaning.as_str()) {
            unique.push(meaning.as_str());
        }
    }
    unique.shuffle(rng);

    let mut options: Vec<String> = vec![correct_meaning.to_string()];
    options.extend(
        unique
            .iter()
            .take(QUIZ_OPTION_COUNT - 1)
            .map(|s| s.to_string()),
    );

    if options.len() < QUIZ_OPTION_COUNT {
        for filler in FALLBACK_MEANINGS {
            if options.len() >= QUIZ_OPTION_COUNT {
                break;
            }
            if seen.insert(filler) {
                options.push(filler.to_string());
            }
        }
    }

    options.shuffle(rng);
    options
}
