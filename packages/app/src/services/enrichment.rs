//! 词条 AI 补全服务
//!
//! 通过 OpenAI 兼容接口补全词条详情、生成替换例句、摘要与配图。
//! 全部调用都是尽力而为: 失败时调用方跳过补全、继续使用用户输入，
//! 核心学习流程绝不依赖补全结果。
//!
//! 错误分类:
//! - 瞬时错误 (限流 429、超时、5xx): 指数退避重试
//! - 配额耗尽: 不重试，立即拉起全局冷却闸门
//! - 冷却中: 直接拒绝，不发请求

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::cooldown::{CooldownGate, DEFAULT_COOLDOWN};
use crate::services::retry::{with_backoff, RetryPolicy};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

// ==================== 配置 ====================

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub image_model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

// ==================== 消息与响应 ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageDatum {
    b64_json: String,
}

// ==================== 补全结果 ====================

/// 词条详情补全结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDetails {
    pub pronunciation: Option<String>,
    pub part_of_speech: String,
    pub meaning: String,
    pub example_sentence: String,
    pub example_sentence_meaning: Option<String>,
    /// 模型对拼写的纠正建议 (无需纠正时为 None)
    pub corrected_term: Option<String>,
}

/// 替换例句
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternateExample {
    pub sentence: String,
    pub translation: String,
}

// ==================== 错误 ====================

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("enrichment not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyChoices,
    #[error("quota exhausted, cooldown armed")]
    QuotaExhausted,
    #[error("cooling down after quota exhaustion")]
    CoolingDown,
    #[error("image payload decode failed: {0}")]
    ImageDecode(#[from] base64::DecodeError),
}

/// 是否为值得重试的瞬时错误
fn is_transient(err: &EnrichmentError) -> bool {
    match err {
        EnrichmentError::Request(_) => true,
        EnrichmentError::HttpStatus { status, .. } => {
            *status == reqwest::StatusCode::TOO_MANY_REQUESTS
                || *status == reqwest::StatusCode::REQUEST_TIMEOUT
                || status.is_server_error()
        }
        _ => false,
    }
}

/// 是否为配额耗尽 (429 且响应体携带配额标记)
fn is_quota_exhausted(err: &EnrichmentError) -> bool {
    match err {
        EnrichmentError::HttpStatus { status, body } => {
            *status == reqwest::StatusCode::TOO_MANY_REQUESTS
                && (body.contains("insufficient_quota") || body.contains("quota"))
        }
        _ => false,
    }
}

// ==================== EnrichmentProvider ====================

/// 词条补全服务
#[derive(Clone)]
pub struct EnrichmentProvider {
    config: EnrichmentConfig,
    client: reqwest::Client,
    gate: Arc<CooldownGate>,
    policy: RetryPolicy,
}

impl EnrichmentProvider {
    /// 从环境变量构建 (LEXI_API_KEY / LEXI_MODEL / LEXI_API_ENDPOINT / LEXI_TIMEOUT)
    pub fn from_env(gate: Arc<CooldownGate>) -> Self {
        let api_key = env_string("LEXI_API_KEY");
        let model = env_string("LEXI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let image_model =
            env_string("LEXI_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());
        let api_endpoint = normalize_endpoint(
            env_string("LEXI_API_ENDPOINT").unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
        );
        let timeout = Duration::from_millis(env_u64("LEXI_TIMEOUT").unwrap_or(DEFAULT_TIMEOUT_MS));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config: EnrichmentConfig {
                api_key,
                model,
                image_model,
                api_endpoint,
                timeout,
            },
            client,
            gate,
            policy: RetryPolicy::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
            && !self.gate.is_open()
    }

    /// 冷却闸门 (与聊天辅导等其他 AI 功能共享)
    pub fn gate(&self) -> Arc<CooldownGate> {
        Arc::clone(&self.gate)
    }

    // ========== 基础调用 ==========

    /// 一次聊天补全调用 (冷却检查 + 重试 + 配额分类)
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse, EnrichmentError> {
        if self.gate.is_open() {
            return Err(EnrichmentError::CoolingDown);
        }
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(EnrichmentError::NotConfigured("LEXI_API_KEY"))?;

        let url = format!("{}/chat/completions", self.config.api_endpoint);
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false
        });

        let result = with_backoff(
            self.policy,
            |e| is_transient(e) && !is_quota_exhausted(e),
            || send_request(self.client.post(&url).bearer_auth(api_key).json(&payload)),
        )
        .await;

        match result {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if is_quota_exhausted(&err) => {
                self.gate.trip(DEFAULT_COOLDOWN);
                Err(EnrichmentError::QuotaExhausted)
            }
            Err(err) => Err(err),
        }
    }

    async fn complete_with_system(
        &self,
        system: &str,
        user: &str,
    ) -> Result<String, EnrichmentError> {
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let response = self.chat(&messages).await?;
        response
            .first_content()
            .map(|s| s.to_string())
            .ok_or(EnrichmentError::EmptyChoices)
    }

    // ========== 补全操作 ==========

    /// 查询词条详情 (新建词条前的预填充)
    pub async fn lookup_word_details(&self, term: &str) -> Result<WordDetails, EnrichmentError> {
        let system = "你是英语词典助手。只输出 JSON，不要输出其他文本。字段: \
                      pronunciation, partOfSpeech, meaning (中文), exampleSentence, \
                      exampleSentenceMeaning (中文), correctedTerm (拼写正确时为 null)。";
        let content = self
            .complete_with_system(system, &format!("查询单词: {term}"))
            .await?;
        Ok(serde_json::from_str(strip_code_fence(&content))?)
    }

    /// 为单词生成一条不同于当前例句的替换例句
    pub async fn generate_alternate_example(
        &self,
        term: &str,
        grade: lexi_algo::types::Grade,
    ) -> Result<AlternateExample, EnrichmentError> {
        let system = "你是英语例句助手。只输出 JSON: {\"sentence\": …, \"translation\": …}。";
        let content = self
            .complete_with_system(
                system,
                &format!("为 {} 学段的学生用单词 {term} 造一个新例句。", grade.as_str()),
            )
            .await?;
        Ok(serde_json::from_str(strip_code_fence(&content))?)
    }

    /// 摘要一段文本
    pub async fn summarize(&self, text: &str) -> Result<String, EnrichmentError> {
        self.complete_with_system("用不超过三句中文摘要下面的文本。", text)
            .await
    }

    /// 为单词生成一张助记配图
    pub async fn generate_image(&self, term: &str) -> Result<Vec<u8>, EnrichmentError> {
        if self.gate.is_open() {
            return Err(EnrichmentError::CoolingDown);
        }
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(EnrichmentError::NotConfigured("LEXI_API_KEY"))?;

        let url = format!("{}/images/generations", self.config.api_endpoint);
        let payload = serde_json::json!({
            "model": self.config.image_model,
            "prompt": format!("A simple, friendly illustration of the English word \"{term}\" for students"),
            "size": "512x512",
            "response_format": "b64_json"
        });

        let result = with_backoff(
            self.policy,
            |e| is_transient(e) && !is_quota_exhausted(e),
            || send_request(self.client.post(&url).bearer_auth(api_key).json(&payload)),
        )
        .await;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) if is_quota_exhausted(&err) => {
                self.gate.trip(DEFAULT_COOLDOWN);
                return Err(EnrichmentError::QuotaExhausted);
            }
            Err(err) => return Err(err),
        };
        let response: ImageResponse = serde_json::from_slice(&bytes)?;
        let datum = response
            .data
            .into_iter()
            .next()
            .ok_or(EnrichmentError::EmptyChoices)?;
        Ok(base64::engine::general_purpose::STANDARD.decode(datum.b64_json)?)
    }
}

// ==================== 辅助 ====================

/// 发送请求并读取响应体 (非 2xx 转为 HttpStatus 错误)
async fn send_request(request: reqwest::RequestBuilder) -> Result<Vec<u8>, EnrichmentError> {
    let resp = request.send().await?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.bytes().await?.to_vec());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(EnrichmentError::HttpStatus { status, body })
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

fn normalize_endpoint(endpoint: String) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") || trimmed.contains("/v1/") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

/// 去掉模型输出外层的 Markdown 代码围栏
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("https://api.openai.com".into()),
            "https://api.openai.com/v1"
        );
        assert_eq!(
            normalize_endpoint("https://api.openai.com/v1/".into()),
            "https://api.openai.com/v1"
        );
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_error_classification() {
        let quota = EnrichmentError::HttpStatus {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "{\"error\": {\"type\": \"insufficient_quota\"}}".into(),
        };
        assert!(is_quota_exhausted(&quota));
        assert!(is_transient(&quota)); // 分类器组合时会被配额检查排除

        let rate_limited = EnrichmentError::HttpStatus {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "slow down".into(),
        };
        assert!(!is_quota_exhausted(&rate_limited));
        assert!(is_transient(&rate_limited));

        let server = EnrichmentError::HttpStatus {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: String::new(),
        };
        assert!(is_transient(&server));

        let bad_request = EnrichmentError::HttpStatus {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: String::new(),
        };
        assert!(!is_transient(&bad_request));
    }

    #[test]
    fn test_word_details_parses_camel_case() {
        let json = r#"{
            "pronunciation": "/əˈbændən/",
            "partOfSpeech": "v.",
            "meaning": "放弃；抛弃",
            "exampleSentence": "They abandoned the car.",
            "exampleSentenceMeaning": "他们弃车而去。",
            "correctedTerm": null
        }"#;
        let details: WordDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.part_of_speech, "v.");
        assert!(details.corrected_term.is_none());
    }
}
