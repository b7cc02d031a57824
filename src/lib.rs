use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod reader;
pub mod segmentation;
pub mod session;
pub mod storage;
pub mod text;
pub mod ticker;
pub mod ui;
pub mod unlock;


pub use config::ReaderConfig;
pub use library::{Book, BookSummary, Catalog, HomePage};
pub use reader::{PageView, ReaderController};
pub use segmentation::{HttpSegmenter, Segmenter};
pub use session::ReaderSession;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use unlock::{Advance, LockState, PageSide, ReadingProgress, UnlockScheduler};

use ui::{CoverArt, FaqAccordion, Footer};

/// 初始化日志（默认 info 级别，可用 RUST_LOG 覆盖）
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// 书籍详情页
pub enum BookDetail {
    Found(ReaderSession<SqliteStore>),
    /// ID 不存在时显示返回按钮
    NotFound { message: &'static str, back_label: &'static str },
}

impl BookDetail {
    fn not_found() -> Self {
        BookDetail::NotFound {
            message: "該当の本が見つかりません。",
            back_label: "← 戻る",
        }
    }
}

/// 页面公共部分
#[derive(Debug, Clone, Serialize)]
pub struct Chrome {
    pub footer: Footer,
}

/// 应用入口
///
/// 对外的命令层，错误统一转换为 `String`
pub struct ReaderApp {
    config: ReaderConfig,
    catalog: Catalog,
    segmenter: Arc<dyn Segmenter>,
    asset_root: Option<PathBuf>,
}

impl ReaderApp {
    /// 使用书目（未配置 `catalog_path` 时为内置书目）和 HTTP 分段服务创建应用
    pub fn new(config: ReaderConfig) -> Result<Self, String> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path),
            None => Catalog::bundled(),
        }
        .map_err(|e| e.to_string())?;
        let segmenter = HttpSegmenter::new(&config).map_err(|e| e.to_string())?;
        Ok(Self::with_parts(config, catalog, Arc::new(segmenter)))
    }

    pub fn with_parts(config: ReaderConfig, catalog: Catalog, segmenter: Arc<dyn Segmenter>) -> Self {
        Self {
            config,
            catalog,
            segmenter,
            asset_root: None,
        }
    }

    /// 本地静态资源目录（封面图片）
    pub fn set_asset_root(&mut self, root: PathBuf) {
        self.asset_root = Some(root);
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn open_store(&self) -> Result<SqliteStore, String> {
        if let Some(parent) = self.config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
        }
        let conn = db::init_db(&self.config.db_path).map_err(|e| format!("数据库错误: {}", e))?;
        Ok(SqliteStore::new(conn))
    }

    /// 首页：在读与其他书籍
    pub fn get_home(&self) -> Result<HomePage, String> {
        let store = self.open_store()?;
        Ok(HomePage::build(&self.catalog, &store))
    }

    /// 打开书籍详情页（需要在 tokio 运行时内调用）
    ///
    /// 恢复阅读进度、启动分段请求和解锁检查；ID 不存在时返回 NotFound
    pub fn open_book(&self, id: &str) -> Result<BookDetail, String> {
        let book = match self.catalog.find(id) {
            Some(book) => book.clone(),
            None => {
                log::info!("书籍 {} 不存在", id);
                return Ok(BookDetail::not_found());
            }
        };

        let cover = CoverArt::for_book(&book, self.asset_root.as_deref());
        let store = self.open_store()?;
        let mut reader = ReaderController::open(book, store, self.config.clone());
        reader.start_segmentation(self.segmenter.clone());

        Ok(BookDetail::Found(ReaderSession::start(
            reader,
            cover,
            self.config.check_interval(),
        )))
    }

    pub fn faq(&self) -> FaqAccordion {
        FaqAccordion::new()
    }

    pub fn chrome(&self) -> Chrome {
        Chrome {
            footer: Footer::current(),
        }
    }
}
