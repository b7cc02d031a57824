use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::reader::{PageView, ReaderController};
use crate::storage::KeyValueStore;
use crate::ticker::UnlockTicker;
use crate::ui::CoverArt;
use crate::unlock::Advance;

/// 阅读页会话
///
/// 一本书的详情页从打开到关闭的整个生命周期：持有控制器和解锁检查任务，
/// drop 时检查任务与进行中的分段请求一起停止
pub struct ReaderSession<S: KeyValueStore + 'static> {
    reader: Arc<Mutex<ReaderController<S>>>,
    cover: CoverArt,
    ticker: UnlockTicker,
}

impl<S: KeyValueStore + 'static> ReaderSession<S> {
    /// 启动会话（需要在 tokio 运行时内调用）
    pub fn start(reader: ReaderController<S>, cover: CoverArt, check_interval: Duration) -> Self {
        let reader = Arc::new(Mutex::new(reader));
        let ticker = UnlockTicker::spawn(reader.clone(), check_interval);
        Self {
            reader,
            cover,
            ticker,
        }
    }

    pub fn cover(&self) -> &CoverArt {
        &self.cover
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// 共享的控制器
    pub fn reader(&self) -> Arc<Mutex<ReaderController<S>>> {
        self.reader.clone()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ReaderController<S>>, String> {
        self.reader
            .lock()
            .map_err(|e| format!("阅读状态锁已损坏: {}", e))
    }

    /// 等待分段结果，等待期间不持锁
    pub async fn load_boundaries(&self) -> Result<(), String> {
        let job = match self.lock()?.take_segmentation_job() {
            Some(job) => job,
            None => return Ok(()),
        };
        let digest = job.text_digest().to_string();
        let result = job.wait().await;

        self.lock()?
            .apply_segmentation(&digest, result, Utc::now())
            .map_err(|e| e.to_string())
    }

    pub fn view(&self) -> Result<PageView, String> {
        Ok(self.lock()?.current_view(Utc::now()))
    }

    pub fn next_page(&self) -> Result<Advance, String> {
        self.lock()?.next_page(Utc::now()).map_err(|e| e.to_string())
    }

    pub fn prev_page(&self) -> Result<bool, String> {
        self.lock()?.prev_page().map_err(|e| e.to_string())
    }

    pub fn finish_reading(&self) -> Result<bool, String> {
        self.lock()?
            .finish_reading(Utc::now())
            .map_err(|e| e.to_string())
    }
}
