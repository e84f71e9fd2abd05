//! 连续学习天数
//!
//! 以日历日为单位统计连续学习:
//! - 当天首次「学会一个新词」触发一次记账
//! - 与上次学习日相邻 (恰好昨天) 则连续天数 +1，否则重置为 1
//! - 最佳纪录只增不减
//!
//! 应用启动时需调用 [`Streak::correct_on_load`]: 若上次学习日既不是
//! 今天也不是昨天，连续天数归零，避免长期未打开应用时显示过期数值。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 连续学习天数状态
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// 当前连续天数
    pub current: i32,
    /// 历史最佳连续天数 (单调不减)
    pub best: i32,
    /// 最后一次有效学习的日历日
    pub last_learned_date: Option<NaiveDate>,
}

impl Streak {
    /// 记录一次「当天首次学习」事件
    ///
    /// 同一天重复调用不改变任何字段。
    pub fn record_learned(&mut self, today: NaiveDate) {
        match self.last_learned_date {
            Some(last) if last == today => return,
            Some(last) if Some(last) == today.pred_opt() => self.current += 1,
            _ => self.current = 1,
        }
        self.best = self.best.max(self.current);
        self.last_learned_date = Some(today);
    }

    /// 加载时校正: 连续性已断裂则将当前连续天数归零
    ///
    /// 返回是否发生了校正。`best` 不受影响。
    pub fn correct_on_load(&mut self, today: NaiveDate) -> bool {
        let intact = match self.last_learned_date {
            Some(last) => last == today || Some(last) == today.pred_opt(),
            None => false,
        };
        if !intact && self.current != 0 {
            self.current = 0;
            return true;
        }
        false
    }
}
