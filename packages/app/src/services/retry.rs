//! 通用重试
//!
//! 所有 AI 调用共用的指数退避重试: 仅对被分类为「瞬时」的错误重试，
//! 配额耗尽等终态错误立即放弃。各调用点不再各写一份重试循环。

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// 重试策略
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// 首次之外的最大重试次数
    pub max_retries: usize,
    /// 基础退避时长 (第 n 次重试等待 `base * 2^n`)
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次重试前的等待时长
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        self.base_backoff * (1u32 << attempt.min(16))
    }
}

/// 带退避地执行 `op`，`is_transient` 判定某个错误是否值得重试
pub async fn with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_retries && is_transient(&err) => {
                let backoff = policy.backoff_for(attempt);
                log::warn!("transient failure (attempt {attempt}), retrying in {backoff:?}");
                sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, &str> = with_backoff(fast_policy(), |_| true, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient")
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_error_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, &str> = with_backoff(fast_policy(), |e| *e != "quota", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("quota") }
        })
        .await;
        assert_eq!(result, Err("quota"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, &str> = with_backoff(fast_policy(), |_| true, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("transient") }
        })
        .await;
        assert_eq!(result, Err("transient"));
        assert_eq!(calls.load(Ordering::SeqCst), 4); // 1 次原始 + 3 次重试
    }

    #[test]
    fn test_backoff_is_exponential() {
        let policy = fast_policy();
        assert_eq!(policy.backoff_for(0), Duration::from_millis(1));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(2));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(4));
    }
}
