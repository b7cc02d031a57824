use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::config::ReaderConfig;
use crate::error::{SegmentationError, StorageError};
use crate::library::Book;
use crate::segmentation::{
    cache_boundaries, load_cached_boundaries, text_digest, SegmentationJob, Segmenter,
};
use crate::storage::{load_progress, save_progress, KeyValueStore};
use crate::text::{mask_locked, split_by_boundaries, split_into_two_pages_with_window};
use crate::ui::badge::time_left_label;
use crate::unlock::{
    Advance, LockState, PageSide, ReadingProgress, UnlockScheduler, PAGES_PER_CHUNK,
};

/// 当前显示的一页
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub side: PageSide,
    /// 页面文本（锁定章节已遮挡）
    pub text: String,
    pub masked: bool,
    pub lock_state: LockState,
    /// 页码指示（"1ページ目（右）" 等）
    pub page_label: String,
    /// 解锁倒计时徽章
    pub time_left: String,
    /// 分段失败时展示给读者的信息
    pub notice: Option<String>,
}

/// 单本书的阅读控制器
///
/// 持有阅读进度、章节边界与存储；每次状态变化后整条保存进度
pub struct ReaderController<S: KeyValueStore> {
    book: Book,
    text: String,
    config: ReaderConfig,
    scheduler: UnlockScheduler,
    progress: ReadingProgress,
    boundaries: Option<Vec<usize>>,
    chunks: Vec<String>,
    segmentation_error: Option<String>,
    pending: Option<SegmentationJob>,
    store: S,
}

impl<S: KeyValueStore> ReaderController<S> {
    /// 打开书籍
    ///
    /// 读取正文与已保存的进度；正文文件读取失败时退回简介，
    /// 有匹配的分段缓存时直接使用
    pub fn open(book: Book, store: S, config: ReaderConfig) -> Self {
        let text = book.body_text().unwrap_or_else(|e| {
            log::warn!("《{}》正文读取失败，改用简介: {}", book.title, e);
            book.description.clone()
        });

        let (progress, restored) = load_progress(&store, &book.id);
        if restored {
            log::debug!("恢复《{}》的阅读进度: 第 {} 页", book.title, progress.current_page);
        }

        let boundaries = load_cached_boundaries(&store, &book.id, &text);
        let scheduler = UnlockScheduler::new(config.unlock_delay());

        let mut reader = Self {
            book,
            text,
            config,
            scheduler,
            progress,
            boundaries,
            chunks: Vec::new(),
            segmentation_error: None,
            pending: None,
            store,
        };
        reader.rebuild_chunks();
        reader
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn progress(&self) -> &ReadingProgress {
        &self.progress
    }

    pub fn lock_state(&self) -> LockState {
        self.progress.lock_state()
    }

    pub fn boundaries(&self) -> Option<&[usize]> {
        self.boundaries.as_deref()
    }

    pub fn segmentation_error(&self) -> Option<&str> {
        self.segmentation_error.as_deref()
    }

    pub fn is_segmenting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 当前章节列表
    ///
    /// 没有边界（未分段或分段失败）时整篇作为一章
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// 替换正文；进行中的分段请求随之作废
    pub fn set_text(&mut self, text: String) {
        if text == self.text {
            return;
        }
        if let Some(job) = self.pending.take() {
            job.cancel();
            log::debug!("正文已变化，取消进行中的分段请求");
        }
        self.text = text;
        self.boundaries = load_cached_boundaries(&self.store, &self.book.id, &self.text);
        self.segmentation_error = None;
        self.rebuild_chunks();
    }

    /// 启动分段请求
    ///
    /// # 返回
    /// 已有边界时不请求，返回 false
    pub fn start_segmentation(&mut self, segmenter: Arc<dyn Segmenter>) -> bool {
        if self.boundaries.is_some() {
            return false;
        }
        if let Some(job) = self.pending.take() {
            job.cancel();
        }
        self.segmentation_error = None;
        self.pending = Some(SegmentationJob::spawn(segmenter, self.text.clone()));
        true
    }

    /// 取出进行中的分段请求，便于在不持锁的情况下等待
    pub fn take_segmentation_job(&mut self) -> Option<SegmentationJob> {
        self.pending.take()
    }

    /// 等待进行中的分段请求并应用结果
    pub async fn complete_segmentation(&mut self, now: DateTime<Utc>) -> Result<(), StorageError> {
        let job = match self.pending.take() {
            Some(job) => job,
            None => return Ok(()),
        };
        let digest = job.text_digest().to_string();
        let result = job.wait().await;
        self.apply_segmentation(&digest, result, now)
    }

    /// 应用分段结果
    ///
    /// 结果对应的文本已不是当前正文时丢弃；失败时记录错误信息，
    /// 保持整篇一章的回退显示
    pub fn apply_segmentation(
        &mut self,
        digest: &str,
        result: Result<Vec<usize>, SegmentationError>,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if digest != text_digest(&self.text) {
            log::debug!("丢弃过期的分段结果");
            return Ok(());
        }

        match result {
            Ok(boundaries) => {
                log::info!("《{}》分段完成，共 {} 个边界", self.book.title, boundaries.len());
                cache_boundaries(&mut self.store, &self.book.id, &self.text, &boundaries, now)?;
                self.boundaries = Some(boundaries);
                self.segmentation_error = None;
                self.rebuild_chunks();
                self.save()
            }
            Err(SegmentationError::Cancelled) => Ok(()),
            Err(e) => {
                log::warn!("《{}》分段失败: {}", self.book.title, e);
                self.segmentation_error = Some(e.to_string());
                Ok(())
            }
        }
    }

    /// 向后翻页（右→左阅读方向上的"前进"）
    pub fn next_page(&mut self, now: DateTime<Utc>) -> Result<Advance, StorageError> {
        let result = self
            .scheduler
            .advance(&mut self.progress, self.chunks.len(), now);
        if matches!(result, Advance::Turned | Advance::Locked) {
            self.save()?;
        }
        Ok(result)
    }

    /// 向前翻页
    pub fn prev_page(&mut self) -> Result<bool, StorageError> {
        let moved = self.scheduler.go_back(&mut self.progress);
        if moved {
            self.save()?;
        }
        Ok(moved)
    }

    /// 定时检查解锁
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<bool, StorageError> {
        let limit = self.unlock_limit();
        let changed = self
            .scheduler
            .tick(&mut self.progress, limit, now);
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    /// 读完，立即解锁下一章
    pub fn finish_reading(&mut self, now: DateTime<Utc>) -> Result<bool, StorageError> {
        let limit = self.unlock_limit();
        let changed = self
            .scheduler
            .finish_reading(&mut self.progress, limit, now);
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    /// 保存阅读进度
    pub fn save(&mut self) -> Result<(), StorageError> {
        save_progress(&mut self.store, &self.book.id, &self.progress)
    }

    /// 可解锁的章节上限；未分段时章节数未知，不设上限
    fn unlock_limit(&self) -> usize {
        match self.boundaries {
            Some(_) => self.chunks.len(),
            None => usize::MAX,
        }
    }

    /// 当前页面
    ///
    /// 保存的页码超出现有章节（等待分段时）只在显示上限制，不改动进度
    pub fn current_view(&self, now: DateTime<Utc>) -> PageView {
        let total_chunks = self.chunks.len();
        let last_page = total_chunks.max(1) * PAGES_PER_CHUNK - 1;
        let page = self.progress.current_page.min(last_page);
        let chunk_index = page / PAGES_PER_CHUNK;
        let side = if page % PAGES_PER_CHUNK == 0 {
            PageSide::Right
        } else {
            PageSide::Left
        };
        let masked = !self.progress.is_unlocked(chunk_index);

        let text = match self.chunks.get(chunk_index) {
            Some(chunk) => self.page_text(chunk, side, masked),
            None => String::new(),
        };

        PageView {
            chunk_index,
            total_chunks,
            side,
            text,
            masked,
            lock_state: self.progress.lock_state(),
            page_label: side.label().to_string(),
            time_left: time_left_label(self.scheduler.remaining(&self.progress, now)),
            notice: self.segmentation_error.clone(),
        }
    }

    /// 按原文确定分页位置，遮挡后仍在同一位置切开，保证版面不变
    fn page_text(&self, chunk: &str, side: PageSide, masked: bool) -> String {
        let pages = split_into_two_pages_with_window(chunk, self.config.split_window);
        if !masked {
            return match side {
                PageSide::Right => pages.right,
                PageSide::Left => pages.left,
            };
        }

        let cut = pages.right.chars().count();
        let hidden = mask_locked(
            chunk,
            self.config.visible_prefix_chars,
            self.config.placeholder_glyph,
        );
        match side {
            PageSide::Right => hidden.chars().take(cut).collect(),
            PageSide::Left => hidden.chars().skip(cut).collect(),
        }
    }

    fn rebuild_chunks(&mut self) {
        let mut chunks = match &self.boundaries {
            Some(boundaries) => split_by_boundaries(&self.text, boundaries),
            None => Vec::new(),
        };
        if chunks.is_empty() && !self.text.is_empty() {
            chunks.push(self.text.clone());
        }
        self.chunks = chunks;
        // 回退的整篇一章不代表真实章节数，保留进度等分段完成
        if self.boundaries.is_some() {
            self.progress.clamp_to(self.chunks.len());
        }
    }
}
