//! Lexi 应用层
//!
//! 在 `lexi-algo` 的纯算法之上提供持久化与业务编排:
//! - storage: SQLite 仓储 (词库、学习统计、进度、设置)
//! - session: 每日学习与快速复习的会话控制
//! - quiz: 测验出题、判分与历史
//! - catalog: 自定义词条的增删改与批量导入
//! - tracker: 经验值、等级与连续学习天数
//! - services: AI 补全与聊天辅导 (尽力而为，核心流程不依赖)

pub mod app;
pub mod catalog;
pub mod quiz;
pub mod scratch;
pub mod services;
pub mod session;
pub mod storage;
pub mod tracker;

pub use app::App;
pub use catalog::{CatalogError, CatalogService, SaveOutcome, WordDraft};
pub use quiz::{AnswerOutcome, QuizEngine, QuizQuestion, QuizSession};
pub use scratch::{MemoryScratch, ResumePoint, ScratchStore};
pub use session::{SessionController, SessionPhase};
pub use storage::{DatabaseManager, StorageError, StorageResult};
pub use tracker::{LevelUp, ProgressTracker, QuizSummary};
