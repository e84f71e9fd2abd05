//! 全局 AI 调用冷却
//!
//! 任一 AI 调用被判定为配额耗尽后，进程级共享的冷却闸门在固定时长
//! 内压制全部后续 AI 调用，与触发来源无关。显式对象替代裸布尔开关，
//! 时钟可注入以便用假时钟测试。

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// 配额耗尽后的默认冷却时长 (15 分钟)
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(15 * 60);

/// 可注入时钟
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// 系统时钟
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 冷却闸门 (进程级断路器)
pub struct CooldownGate {
    clock: Box<dyn Clock>,
    state: Mutex<GateState>,
}

struct GateState {
    open_until: Option<Instant>,
    on_expire: Option<Box<dyn FnOnce() + Send>>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    /// 指定时钟创建 (测试用)
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(GateState {
                open_until: None,
                on_expire: None,
            }),
        }
    }

    /// 闸门是否处于冷却中
    ///
    /// 冷却到期的首次观察会触发一次性到期回调。
    pub fn is_open(&self) -> bool {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => return false,
        };
        match state.open_until {
            Some(until) if self.clock.now() < until => true,
            Some(_) => {
                state.open_until = None;
                if let Some(callback) = state.on_expire.take() {
                    callback();
                }
                false
            }
            None => false,
        }
    }

    /// 进入冷却
    pub fn trip(&self, duration: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.open_until = Some(self.clock.now() + duration);
            log::warn!("AI cooldown armed for {duration:?}");
        }
    }

    /// 注册冷却到期的一次性回调
    pub fn set_on_expire(&self, callback: impl FnOnce() + Send + 'static) {
        if let Ok(mut state) = self.state.lock() {
            state.on_expire = Some(Box::new(callback));
        }
    }

    /// 剩余冷却时长 (未冷却为 None)
    pub fn remaining(&self) -> Option<Duration> {
        let state = self.state.lock().ok()?;
        let until = state.open_until?;
        let now = self.clock.now();
        (now < until).then(|| until - now)
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new()
    }
}
