use chrono::Duration;

/// 解锁倒计时徽章文本
///
/// 剩余时间按分钟向上取整；没有待解锁的章节时显示 "0 min"
pub fn time_left_label(remaining: Option<Duration>) -> String {
    let minutes = match remaining {
        Some(left) if left > Duration::zero() => (left.num_seconds() + 59) / 60,
        _ => 0,
    };
    format!("{} min", minutes)
}
