//! # lexi-algo - 词汇学习核心算法库
//!
//! 本 crate 提供纯 Rust 实现的学习调度算法:
//!
//! - **Selection Engine** - 基于复习记录的选词与间隔复习调度
//! - **Streak** - 连续学习天数统计
//! - **Level Curve** - XP 经验曲线与等级换算
//! - **Distractor** - 测验干扰项生成
//!
//! ## 设计理念
//!
//! 本 crate 的设计目标:
//! - **纯 Rust** - 无 I/O、无持久化依赖，可在任何 Rust 项目中使用
//! - **确定性可测** - 所有随机过程接受外部 RNG，支持固定种子复现
//! - **充分测试** - 所有算法都有完整的单元测试与属性测试
//!
//! ## 模块结构
//!
//! - [`selection`] - 选词引擎 (资格过滤、优先级排序、随机打散)
//! - [`streak`] - 连续学习天数 (日历日语义、加载时校正)
//! - [`level`] - 经验曲线 (累计 XP 与等级互算)
//! - [`distractor`] - 干扰项生成 (去重、兜底填充)
//! - [`types`] - 公共类型和常量

// ============================================================================
// 模块声明
// ============================================================================

pub mod distractor;
pub mod level;
pub mod selection;
pub mod streak;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

/// 重新导出选词引擎
pub use selection::select_words;

/// 重新导出连续学习天数
pub use streak::Streak;

/// 重新导出经验曲线
pub use level::{level_for_xp, progress_within_level, xp_for_level};

/// 重新导出干扰项生成
pub use distractor::generate_options;
