//! 分段服务客户端
//!
//! 把全文发给外部分段服务（`POST /api/split`），取回章节边界；
//! 请求在后台任务里执行，文本变化或视图销毁时中止。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::ReaderConfig;
use crate::error::{SegmentationError, StorageError};
use crate::storage::{boundaries_key, load_json, save_json, KeyValueStore};
use crate::text::split_by_boundaries;

pub type SplitFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<usize>, SegmentationError>> + Send + 'a>>;

/// 分段器
///
/// 输入全文，输出字符偏移形式的边界列表
pub trait Segmenter: Send + Sync {
    fn split<'a>(&'a self, text: &'a str) -> SplitFuture<'a>;
}

/// 请求体，字段固定为 `text`
#[derive(Serialize)]
struct SplitRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP 分段器
pub struct HttpSegmenter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSegmenter {
    pub fn new(config: &ReaderConfig) -> Result<Self, SegmentationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.split_endpoint(),
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<usize>, SegmentationError> {
        log::debug!("请求分段服务 {} ({} 字)", self.endpoint, text.chars().count());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SplitRequest { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| {
                    let trimmed = body.trim();
                    if trimmed.is_empty() {
                        status.canonical_reason().unwrap_or("unknown").to_string()
                    } else {
                        trimmed.to_string()
                    }
                });
            return Err(SegmentationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_boundaries(&body)
    }
}

impl Segmenter for HttpSegmenter {
    fn split<'a>(&'a self, text: &'a str) -> SplitFuture<'a> {
        Box::pin(self.request(text))
    }
}

/// 解析分段服务的响应体
///
/// 要求 `{"boundaries": [非负整数, ...]}` 且单调不减
pub fn parse_boundaries(body: &str) -> Result<Vec<usize>, SegmentationError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| SegmentationError::BadShape(format!("不是有效的 JSON: {}", e)))?;

    let items = value
        .get("boundaries")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| SegmentationError::BadShape("缺少 boundaries 数组".to_string()))?;

    let mut boundaries = Vec::with_capacity(items.len());
    for item in items {
        let offset = item
            .as_u64()
            .ok_or_else(|| SegmentationError::BadShape(format!("边界不是非负整数: {}", item)))?;
        let offset = offset as usize;
        if let Some(&prev) = boundaries.last() {
            if offset < prev {
                return Err(SegmentationError::BadShape(format!(
                    "边界未按升序排列: {} 之后出现 {}",
                    prev, offset
                )));
            }
        }
        boundaries.push(offset);
    }

    Ok(boundaries)
}

/// 文本的 SHA-256（十六进制）
pub fn text_digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 进行中的分段请求
///
/// drop 或 `cancel` 时中止后台任务
pub struct SegmentationJob {
    text_digest: String,
    handle: JoinHandle<Result<Vec<usize>, SegmentationError>>,
}

impl SegmentationJob {
    /// 在 tokio 运行时上启动分段请求
    pub fn spawn(segmenter: Arc<dyn Segmenter>, text: String) -> Self {
        let text_digest = text_digest(&text);
        let handle = tokio::spawn(async move { segmenter.split(&text).await });
        Self {
            text_digest,
            handle,
        }
    }

    /// 请求所针对文本的摘要
    pub fn text_digest(&self) -> &str {
        &self.text_digest
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// 等待结果
    pub async fn wait(mut self) -> Result<Vec<usize>, SegmentationError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(SegmentationError::Cancelled),
            Err(e) => Err(SegmentationError::TaskFailed(e.to_string())),
        }
    }
}

impl Drop for SegmentationJob {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// 缓存的分段结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedBoundaries {
    pub text_sha256: String,
    pub boundaries: Vec<usize>,
    /// 按这些边界切出的章节数（与阅读页一致）
    #[serde(default)]
    pub chunk_count: Option<usize>,
    pub fetched_at: DateTime<Utc>,
}

/// 读取缓存的分段结果；文本已变化或缓存损坏时返回 None
pub fn load_cached_boundaries<S>(store: &S, book_id: &str, text: &str) -> Option<Vec<usize>>
where
    S: KeyValueStore + ?Sized,
{
    match load_json::<CachedBoundaries, S>(store, &boundaries_key(book_id)) {
        Ok(Some(cached)) if cached.text_sha256 == text_digest(text) => Some(cached.boundaries),
        Ok(_) => None,
        Err(e) => {
            log::warn!("分段缓存 {} 无法解析，忽略: {}", book_id, e);
            None
        }
    }
}

/// 写入分段结果缓存
pub fn cache_boundaries<S>(
    store: &mut S,
    book_id: &str,
    text: &str,
    boundaries: &[usize],
    now: DateTime<Utc>,
) -> Result<(), StorageError>
where
    S: KeyValueStore + ?Sized,
{
    let cached = CachedBoundaries {
        text_sha256: text_digest(text),
        boundaries: boundaries.to_vec(),
        chunk_count: Some(split_by_boundaries(text, boundaries).len().max(1)),
        fetched_at: now,
    };
    save_json(store, &boundaries_key(book_id), &cached)
}
