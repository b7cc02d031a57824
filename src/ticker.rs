use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::reader::ReaderController;
use crate::storage::KeyValueStore;

/// 周期性解锁检查
///
/// 按固定周期调用 `ReaderController::tick`；drop 或 `stop` 后停止
pub struct UnlockTicker {
    handle: JoinHandle<()>,
}

impl UnlockTicker {
    /// 启动检查任务
    ///
    /// # 参数
    /// - `reader`: 共享的阅读控制器
    /// - `period`: 检查周期
    pub fn spawn<S>(reader: Arc<Mutex<ReaderController<S>>>, period: Duration) -> Self
    where
        S: KeyValueStore + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                if !check_once(&reader) {
                    break;
                }
            }
        });

        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// 执行一次检查；锁已损坏时返回 false
fn check_once<S: KeyValueStore>(reader: &Mutex<ReaderController<S>>) -> bool {
    let mut guard = match reader.lock() {
        Ok(guard) => guard,
        Err(e) => {
            log::error!("阅读控制器锁已损坏，停止解锁检查: {}", e);
            return false;
        }
    };
    match guard.tick(Utc::now()) {
        Ok(true) => log::debug!("《{}》解锁状态已更新", guard.book().title),
        Ok(false) => {}
        Err(e) => log::warn!("保存阅读进度失败: {}", e),
    }
    true
}

impl Drop for UnlockTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
