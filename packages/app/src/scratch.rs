//! 会话暂存
//!
//! 对应浏览器「当前标签页」级别的临时键值存储，只用于每日新词
//! 会话的断点续学 `(签名, 下标)`。读写失败按「无暂存」降级处理，
//! 绝不阻断学习流程。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// 每日新词会话暂存键
pub const DAILY_SESSION_KEY: &str = "daily_session";

/// 断点续学暂存项
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    /// 选词结果的内容签名 (有序 ID 的 SHA-256)
    pub signature: String,
    /// 会话内当前下标
    pub index: usize,
}

/// 临时键值存储接口
pub trait ScratchStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// 进程内内存实现
#[derive(Default)]
pub struct MemoryScratch {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScratchStore for MemoryScratch {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// 读取断点续学暂存项 (缺失或损坏均返回 None)
pub fn load_resume_point(store: &dyn ScratchStore) -> Option<ResumePoint> {
    let raw = store.get(DAILY_SESSION_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(point) => Some(point),
        Err(e) => {
            log::warn!("discarding corrupt resume point: {e}");
            None
        }
    }
}

/// 写入断点续学暂存项
pub fn save_resume_point(store: &dyn ScratchStore, point: &ResumePoint) {
    match serde_json::to_string(point) {
        Ok(raw) => store.set(DAILY_SESSION_KEY, &raw),
        Err(e) => log::warn!("failed to serialize resume point: {e}"),
    }
}
