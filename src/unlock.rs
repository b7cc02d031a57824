use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 解锁状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    /// 当前章节可读
    Unlocked,
    /// 等待计时解锁
    Locked,
}

/// 双页中的哪一页
///
/// 阅读方向为右→左，右页先显示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSide {
    Right,
    Left,
}

impl PageSide {
    pub fn label(&self) -> &'static str {
        match self {
            PageSide::Right => "1ページ目（右）",
            PageSide::Left => "2ページ目（左）",
        }
    }
}

/// 每个章节拆成两页
pub const PAGES_PER_CHUNK: usize = 2;

/// 单本书的阅读进度
///
/// 以 JSON 整条保存；`unlocked_chunks` 只增不减
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    /// 全书页码（章节序号 * 2 + 页侧）
    #[serde(default)]
    pub current_page: usize,
    /// 已解锁的章节序号
    #[serde(default = "initial_unlocked")]
    pub unlocked_chunks: BTreeSet<usize>,
    /// 最近一次解锁（也是当前锁定计时的起点）
    #[serde(default, rename = "lastUnlockTime")]
    pub last_unlock_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "isLocked")]
    pub locked: bool,
}

fn initial_unlocked() -> BTreeSet<usize> {
    BTreeSet::from([0])
}

impl Default for ReadingProgress {
    fn default() -> Self {
        Self {
            current_page: 0,
            unlocked_chunks: initial_unlocked(),
            last_unlock_at: None,
            locked: false,
        }
    }
}

impl ReadingProgress {
    /// 修正从存储恢复的记录：第一章始终可读
    pub fn normalize(&mut self) {
        self.unlocked_chunks.insert(0);
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked_chunks.len()
    }

    pub fn is_unlocked(&self, chunk: usize) -> bool {
        self.unlocked_chunks.contains(&chunk)
    }

    pub fn current_chunk(&self) -> usize {
        self.current_page / PAGES_PER_CHUNK
    }

    pub fn current_side(&self) -> PageSide {
        if self.current_page % PAGES_PER_CHUNK == 0 {
            PageSide::Right
        } else {
            PageSide::Left
        }
    }

    pub fn lock_state(&self) -> LockState {
        if self.locked {
            LockState::Locked
        } else {
            LockState::Unlocked
        }
    }

    /// 下一个待解锁的章节（最小的未解锁序号）
    pub fn next_locked_chunk(&self) -> usize {
        (0..)
            .find(|i| !self.unlocked_chunks.contains(i))
            .unwrap_or(self.unlocked_chunks.len())
    }

    /// 把页码限制在 `total_chunks` 范围内（章节数变化后调用）
    pub fn clamp_to(&mut self, total_chunks: usize) {
        let last_page = total_chunks.max(1) * PAGES_PER_CHUNK - 1;
        if self.current_page > last_page {
            self.current_page = last_page;
        }
    }

    /// 按已知章节总数计算的阅读进度百分比
    pub fn percent(&self, total_chunks: usize) -> u8 {
        if total_chunks == 0 {
            return 0;
        }
        let unlocked = self
            .unlocked_chunks
            .iter()
            .filter(|&&i| i < total_chunks)
            .count();
        ((unlocked * 100) / total_chunks).min(100) as u8
    }
}

/// 翻页结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// 已翻到下一页
    Turned,
    /// 进入未解锁章节，开始计时
    Locked,
    /// 当前章节尚未解锁，不能继续翻
    Blocked,
    /// 已是最后一页
    AtEnd,
}

/// 解锁调度器
///
/// 纯状态转换，不做 IO；调用方负责在状态变化后保存
#[derive(Debug, Clone)]
pub struct UnlockScheduler {
    unlock_delay: Duration,
}

impl UnlockScheduler {
    pub fn new(unlock_delay: Duration) -> Self {
        Self { unlock_delay }
    }

    pub fn unlock_delay(&self) -> Duration {
        self.unlock_delay
    }

    /// 向后翻一页
    ///
    /// 右页翻到左页；读完一章的两页后进入下一章，
    /// 若下一章未解锁则进入锁定状态并记录锁定时间
    ///
    /// # 参数
    /// - `progress`: 阅读进度
    /// - `total_chunks`: 章节总数
    /// - `now`: 当前时间
    pub fn advance(
        &self,
        progress: &mut ReadingProgress,
        total_chunks: usize,
        now: DateTime<Utc>,
    ) -> Advance {
        if total_chunks == 0 {
            return Advance::AtEnd;
        }

        let chunk = progress.current_chunk();
        if chunk >= total_chunks {
            return Advance::AtEnd;
        }
        if !progress.is_unlocked(chunk) {
            return Advance::Blocked;
        }

        if progress.current_side() == PageSide::Right {
            progress.current_page += 1;
            return Advance::Turned;
        }

        let next = chunk + 1;
        if next >= total_chunks {
            return Advance::AtEnd;
        }

        progress.current_page = next * PAGES_PER_CHUNK;
        if progress.is_unlocked(next) {
            return Advance::Turned;
        }

        // 已在计时中（读者翻回去又翻回来）时不重置起点
        if !progress.locked {
            progress.locked = true;
            progress.last_unlock_at = Some(now);
            log::info!("章节 {} 未解锁，开始计时", next);
        }
        Advance::Locked
    }

    /// 向前翻一页，不影响锁定状态
    pub fn go_back(&self, progress: &mut ReadingProgress) -> bool {
        if progress.current_page == 0 {
            return false;
        }
        progress.current_page -= 1;
        true
    }

    /// 定时检查：锁定时间超过解锁延迟后解锁下一章
    ///
    /// 下一章超出 `total_chunks` 时只解除锁定，不新增章节
    ///
    /// # 返回
    /// 状态是否发生变化
    pub fn tick(&self, progress: &mut ReadingProgress, total_chunks: usize, now: DateTime<Utc>) -> bool {
        if !progress.locked {
            return false;
        }

        let started = match progress.last_unlock_at {
            Some(t) => t,
            None => {
                // 旧记录缺少时间戳，从现在开始计时
                progress.last_unlock_at = Some(now);
                return true;
            }
        };

        if now - started < self.unlock_delay {
            return false;
        }

        if progress.next_locked_chunk() >= total_chunks {
            progress.locked = false;
            log::warn!("锁定的章节不存在（共 {} 章），解除锁定", total_chunks);
            return true;
        }

        let chunk = self.unlock_next(progress, now);
        log::info!("计时结束，章节 {} 已解锁", chunk);
        true
    }

    /// 读完：立即解锁下一章，并以当前时间作为新的计时起点
    ///
    /// # 返回
    /// 是否新解锁了章节
    pub fn finish_reading(
        &self,
        progress: &mut ReadingProgress,
        total_chunks: usize,
        now: DateTime<Utc>,
    ) -> bool {
        if progress.next_locked_chunk() >= total_chunks {
            let was_locked = progress.locked;
            progress.locked = false;
            return was_locked;
        }
        let chunk = self.unlock_next(progress, now);
        log::info!("手动完成阅读，章节 {} 已解锁", chunk);
        true
    }

    /// 距离自动解锁的剩余时间；未锁定时为 None
    pub fn remaining(&self, progress: &ReadingProgress, now: DateTime<Utc>) -> Option<Duration> {
        if !progress.locked {
            return None;
        }
        let started = progress.last_unlock_at.unwrap_or(now);
        let left = self.unlock_delay - (now - started);
        Some(left.max(Duration::zero()))
    }

    fn unlock_next(&self, progress: &mut ReadingProgress, now: DateTime<Utc>) -> usize {
        let chunk = progress.next_locked_chunk();
        progress.unlocked_chunks.insert(chunk);
        progress.locked = false;
        progress.last_unlock_at = Some(now);
        chunk
    }
}

impl Default for UnlockScheduler {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}
