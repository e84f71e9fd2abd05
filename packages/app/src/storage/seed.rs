//! 内置词库播种
//!
//! 首次打开数据库时写入内置单词。内置词 ID 固定，重复播种以
//! `word` 表非空为跳过条件。

use chrono::Utc;
use rusqlite::{params, Connection};

use lexi_algo::types::Grade;

use crate::storage::StorageResult;

/// 内置词条: (id, 拼写, 词性, 释义, 例句, 例句译文, 学段, 单元)
pub const BUILTIN_WORDS: &[(
    &str,
    &str,
    &str,
    &str,
    &str,
    &str,
    Grade,
    i32,
)] = &[
    (
        "w-m1-001",
        "ability",
        "n.",
        "能力；才能",
        "She has the ability to learn new words quickly.",
        "她有快速学习新单词的能力。",
        Grade::Middle1,
        1,
    ),
    (
        "w-m1-002",
        "absent",
        "adj.",
        "缺席的；不在的",
        "Two students were absent from class today.",
        "今天有两名学生缺课。",
        Grade::Middle1,
        1,
    ),
    (
        "w-m1-003",
        "accept",
        "v.",
        "接受；同意",
        "I accept your invitation with pleasure.",
        "我很高兴接受你的邀请。",
        Grade::Middle1,
        2,
    ),
    (
        "w-m2-001",
        "achieve",
        "v.",
        "实现；达到",
        "You can achieve your goal if you keep trying.",
        "只要坚持努力，你就能实现目标。",
        Grade::Middle2,
        1,
    ),
    (
        "w-m2-002",
        "admire",
        "v.",
        "钦佩；欣赏",
        "We all admire her courage.",
        "我们都钦佩她的勇气。",
        Grade::Middle2,
        1,
    ),
    (
        "w-m2-003",
        "advantage",
        "n.",
        "优势；有利条件",
        "Speaking two languages is a great advantage.",
        "会说两种语言是很大的优势。",
        Grade::Middle2,
        2,
    ),
    (
        "w-m3-001",
        "analyze",
        "v.",
        "分析",
        "Scientists analyze the data before drawing conclusions.",
        "科学家在得出结论前会先分析数据。",
        Grade::Middle3,
        1,
    ),
    (
        "w-m3-002",
        "ancient",
        "adj.",
        "古代的；古老的",
        "We visited an ancient temple last summer.",
        "去年夏天我们参观了一座古庙。",
        Grade::Middle3,
        1,
    ),
    (
        "w-m3-003",
        "anxious",
        "adj.",
        "焦虑的；渴望的",
        "He felt anxious before the exam.",
        "考试前他感到焦虑。",
        Grade::Middle3,
        2,
    ),
    (
        "w-h1-001",
        "abandon",
        "v.",
        "放弃；抛弃",
        "They had to abandon the plan because of the storm.",
        "由于暴风雨，他们不得不放弃这个计划。",
        Grade::High1,
        1,
    ),
    (
        "w-h1-002",
        "absorb",
        "v.",
        "吸收；吸引",
        "Plants absorb water through their roots.",
        "植物通过根部吸收水分。",
        Grade::High1,
        1,
    ),
    (
        "w-h1-003",
        "abundant",
        "adj.",
        "丰富的；充裕的",
        "The region has abundant natural resources.",
        "这个地区自然资源丰富。",
        Grade::High1,
        2,
    ),
    (
        "w-h2-001",
        "accurate",
        "adj.",
        "精确的；准确的",
        "The report gives an accurate picture of the situation.",
        "这份报告准确地描述了当时的情况。",
        Grade::High2,
        1,
    ),
    (
        "w-h2-002",
        "acquire",
        "v.",
        "获得；取得",
        "It takes years to acquire a large vocabulary.",
        "积累大量词汇需要多年时间。",
        Grade::High2,
        1,
    ),
    (
        "w-h2-003",
        "adapt",
        "v.",
        "适应；改编",
        "Animals adapt to their environment over time.",
        "动物会随着时间适应环境。",
        Grade::High2,
        2,
    ),
    (
        "w-h3-001",
        "advocate",
        "v.",
        "提倡；拥护",
        "Many experts advocate reading aloud every day.",
        "许多专家提倡每天朗读。",
        Grade::High3,
        1,
    ),
    (
        "w-h3-002",
        "aesthetic",
        "adj.",
        "审美的；美学的",
        "The building has great aesthetic appeal.",
        "这座建筑极具审美吸引力。",
        Grade::High3,
        1,
    ),
    (
        "w-h3-003",
        "alleviate",
        "v.",
        "减轻；缓和",
        "Regular review can alleviate the pressure of exams.",
        "定期复习可以减轻考试压力。",
        Grade::High3,
        2,
    ),
];

/// 播种内置词库 (word 表非空时跳过)
pub fn seed_builtin_words(conn: &Connection) -> StorageResult<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM word", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();
    for (id, term, pos, meaning, example, example_meaning, grade, unit) in BUILTIN_WORDS {
        conn.execute(
            r#"
            INSERT INTO word (
                id, term, part_of_speech, meaning, example_sentence,
                pronunciation, example_sentence_meaning, grade_level, unit,
                is_custom, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, ?8, 0, ?9, ?9)
            "#,
            params![id, term, pos, meaning, example, example_meaning, grade.as_str(), unit, now],
        )?;
    }
    log::info!("seeded {} builtin words", BUILTIN_WORDS.len());
    Ok(())
}
