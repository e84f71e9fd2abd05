//! AI 辅助服务: 词条补全、聊天辅导，及其共用的冷却与重试机制

pub mod chat;
pub mod cooldown;
pub mod enrichment;
pub mod retry;

pub use chat::{ChatTutor, ChatTutorManager};
pub use cooldown::{CooldownGate, Clock, SystemClock, DEFAULT_COOLDOWN};
pub use enrichment::{
    AlternateExample, ChatMessage, EnrichmentError, EnrichmentProvider, WordDetails,
};
pub use retry::{with_backoff, RetryPolicy};
