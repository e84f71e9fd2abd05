//! 经验曲线
//!
//! 等级 L 升到 L+1 需要 `100 * L` XP，即处于等级 n 要求的累计 XP 为
//! `sum_{k=1}^{n-1} 100k = 50 * n * (n - 1)`。
//!
//! 等级是写时缓存的投影: 只在加 XP 时重算一次并持久化，读取时不再
//! 从累计 XP 反推。该语义由应用层保证，本模块只提供纯换算函数。

/// 处于等级 `level` 所要求的累计 XP
///
/// 等级从 1 起算，`xp_for_level(1) == 0`。
pub fn xp_for_level(level: u32) -> i64 {
    let l = level as i64;
    50 * l * (l - 1)
}

/// 由累计 XP 计算等级
pub fn level_for_xp(total_xp: i64) -> u32 {
    let mut level = 1u32;
    while total_xp >= xp_for_level(level + 1) {
        level += 1;
    }
    level
}

/// 当前等级内的进度 `(已获得, 升级所需)`
pub fn progress_within_level(total_xp: i64) -> (i64, i64) {
    let level = level_for_xp(total_xp);
    let floor = xp_for_level(level);
    let ceil = xp_for_level(level + 1);
    (total_xp - floor, ceil - floor)
}
