//! 英语学习聊天辅导
//!
//! 按 (学段, 用户名) 维护一段对话历史。学段或用户名变化时丢弃旧对话
//! 重新开场，保证系统提示词始终与当前学习者匹配。

use std::sync::Arc;

use lexi_algo::types::Grade;

use crate::services::enrichment::{ChatMessage, EnrichmentError, EnrichmentProvider};

/// 对话历史上限 (含系统提示词)，超出后丢弃最早的一轮问答
const MAX_HISTORY: usize = 21;

fn system_prompt(grade: Grade, username: &str) -> String {
    let grade_label = match grade {
        Grade::Middle1 => "初一",
        Grade::Middle2 => "初二",
        Grade::Middle3 => "初三",
        Grade::High1 => "高一",
        Grade::High2 => "高二",
        Grade::High3 => "高三",
    };
    format!(
        "你是一位耐心的英语辅导老师，学生是{grade_label}年级的 {username}。\
         用简洁的中文解释，英文例句附中文翻译，鼓励学生多开口。"
    )
}

// ==================== ChatTutor ====================

/// 一段与固定学习者的辅导对话
pub struct ChatTutor {
    provider: Arc<EnrichmentProvider>,
    grade: Grade,
    username: String,
    history: Vec<ChatMessage>,
}

impl ChatTutor {
    pub fn new(provider: Arc<EnrichmentProvider>, grade: Grade, username: &str) -> Self {
        Self {
            provider,
            grade,
            username: username.to_string(),
            history: vec![ChatMessage::system(system_prompt(grade, username))],
        }
    }

    pub fn matches(&self, grade: Grade, username: &str) -> bool {
        self.grade == grade && self.username == username
    }

    /// 已完成的问答轮数
    pub fn turns(&self) -> usize {
        self.history.iter().filter(|m| m.role == "user").count()
    }

    /// 发送一条学生消息并返回老师的回复
    ///
    /// 调用失败时用户消息不会留在历史里，下次发送从失败前的状态继续。
    pub async fn send(&mut self, text: &str) -> Result<String, EnrichmentError> {
        self.history.push(ChatMessage::user(text));
        let response = match self.provider.chat(&self.history).await {
            Ok(r) => r,
            Err(err) => {
                self.history.pop();
                return Err(err);
            }
        };
        let Some(content) = response.first_content().map(|s| s.to_string()) else {
            self.history.pop();
            return Err(EnrichmentError::EmptyChoices);
        };
        self.history.push(ChatMessage::assistant(&content));
        self.trim_history();
        Ok(content)
    }

    fn trim_history(&mut self) {
        while self.history.len() > MAX_HISTORY {
            // 保留开头的系统提示词，丢最早的一轮问答
            self.history.drain(1..3.min(self.history.len()));
        }
    }
}

// ==================== ChatTutorManager ====================

/// 管理当前对话，按学习者键重建
pub struct ChatTutorManager {
    provider: Arc<EnrichmentProvider>,
    current: Option<ChatTutor>,
}

impl ChatTutorManager {
    pub fn new(provider: Arc<EnrichmentProvider>) -> Self {
        Self {
            provider,
            current: None,
        }
    }

    /// 取当前学习者的对话，学段或用户名变化时重新开场
    pub fn tutor_for(&mut self, grade: Grade, username: &str) -> &mut ChatTutor {
        if !matches!(&self.current, Some(t) if t.matches(grade, username)) {
            self.current = None;
        }
        self.current
            .get_or_insert_with(|| ChatTutor::new(Arc::clone(&self.provider), grade, username))
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
