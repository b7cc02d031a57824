use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::segmentation::CachedBoundaries;
use crate::storage::{boundaries_key, load_json, load_progress, KeyValueStore};
use crate::text::load_text_file;

const BUNDLED_CATALOG: &str = include_str!("../assets/books.json");

/// 书籍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    /// 简介；没有正文文件时也作为正文
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// 正文文件（青空文库格式纯文本）
    #[serde(default)]
    pub text_file: Option<PathBuf>,
    /// 静态进度标签（如 "10%"）
    #[serde(default)]
    pub progress: Option<String>,
}

impl Book {
    /// 阅读用正文
    pub fn body_text(&self) -> Result<String, LoadError> {
        match &self.text_file {
            Some(path) => load_text_file(path),
            None => Ok(self.description.clone()),
        }
    }
}

/// 书目
#[derive(Debug, Clone)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    /// 内置书目
    pub fn bundled() -> Result<Self, LoadError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, LoadError> {
        let books: Vec<Book> = serde_json::from_str(raw)?;
        Self::new(books)
    }

    /// # 返回
    /// ID 为空或重复时返回错误
    pub fn new(books: Vec<Book>) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        for book in &books {
            if book.id.trim().is_empty() {
                return Err(LoadError::Catalog(format!("《{}》缺少 ID", book.title)));
            }
            if !seen.insert(book.id.as_str()) {
                return Err(LoadError::Catalog(format!("重复的书籍 ID: {}", book.id)));
            }
        }
        Ok(Self { books })
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn find(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// 书籍卡片
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub progress: Option<String>,
    /// 详情页路由
    pub href: String,
}

/// 首页
#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    /// 在读（有保存的进度或静态进度标签）
    pub reading_now: Vec<BookSummary>,
    /// 其他书籍
    pub new_books: Vec<BookSummary>,
}

impl HomePage {
    pub fn build<S>(catalog: &Catalog, store: &S) -> Self
    where
        S: KeyValueStore + ?Sized,
    {
        let mut reading_now = Vec::new();
        let mut new_books = Vec::new();

        for book in catalog.books() {
            let summary = BookSummary {
                id: book.id.clone(),
                title: book.title.clone(),
                author: book.author.clone(),
                progress: progress_label(book, store),
                href: format!("/books/{}", book.id),
            };
            if summary.progress.is_some() {
                reading_now.push(summary);
            } else {
                new_books.push(summary);
            }
        }

        Self {
            reading_now,
            new_books,
        }
    }
}

/// 进度标签
///
/// 有保存的进度时按已解锁章节计算百分比（章节数取自分段缓存），
/// 否则使用书目中的静态标签
pub fn progress_label<S>(book: &Book, store: &S) -> Option<String>
where
    S: KeyValueStore + ?Sized,
{
    let (progress, restored) = load_progress(store, &book.id);
    if !restored {
        return book.progress.clone();
    }

    // 旧缓存没有章节数时按边界数估算
    let total_chunks = match load_json::<CachedBoundaries, S>(store, &boundaries_key(&book.id)) {
        Ok(Some(cached)) => cached
            .chunk_count
            .unwrap_or(cached.boundaries.len())
            .max(1),
        _ => 1,
    };
    Some(format!("{}%", progress.percent(total_chunks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{save_progress, MemoryStore};
    use crate::segmentation::cache_boundaries;
    use crate::unlock::ReadingProgress;
    use chrono::Utc;

    #[test]
    fn test_bundled_catalog() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.len(), 10);
        let book = catalog.find("1").unwrap();
        assert_eq!(book.title, "走れメロス");
        assert_eq!(book.image_url.as_deref(), Some("/mock/img/hashire_merosu.jpg"));
        assert!(catalog.find("999").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let raw = r#"[
            {"id": "1", "title": "A", "author": "a", "description": ""},
            {"id": "1", "title": "B", "author": "b", "description": ""}
        ]"#;
        let err = Catalog::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("重复"));
    }

    #[test]
    fn test_empty_id_rejected() {
        let raw = r#"[{"id": " ", "title": "A", "author": "a", "description": ""}]"#;
        assert!(matches!(Catalog::from_json(raw), Err(LoadError::Catalog(_))));
    }

    #[test]
    fn test_body_text_defaults_to_description() {
        let catalog = Catalog::bundled().unwrap();
        let book = catalog.find("2").unwrap();
        assert_eq!(book.body_text().unwrap(), book.description);
    }

    #[test]
    fn test_body_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rashomon.txt");
        fs::write(&path, "或日の暮方の事である。一人の下人《げにん》が").unwrap();

        let book = Book {
            id: "6".to_string(),
            title: "羅生門".to_string(),
            author: "芥川龍之介".to_string(),
            description: String::new(),
            image_url: None,
            text_file: Some(path),
            progress: None,
        };
        assert_eq!(book.body_text().unwrap(), "或日の暮方の事である。一人の下人が");
    }

    #[test]
    fn test_home_page_static_progress() {
        let catalog = Catalog::bundled().unwrap();
        let store = MemoryStore::new();
        let home = HomePage::build(&catalog, &store);

        assert_eq!(home.reading_now.len(), 1);
        assert_eq!(home.reading_now[0].progress.as_deref(), Some("10%"));
        assert_eq!(home.reading_now[0].href, "/books/1");
        assert_eq!(home.new_books.len(), 9);
    }

    #[test]
    fn test_home_page_saved_progress() {
        let catalog = Catalog::bundled().unwrap();
        let mut store = MemoryStore::new();

        let mut progress = ReadingProgress::default();
        progress.unlocked_chunks.insert(1);
        save_progress(&mut store, "3", &progress).unwrap();
        cache_boundaries(&mut store, "3", "ABCD", &[1, 2, 3, 4], Utc::now()).unwrap();

        let home = HomePage::build(&catalog, &store);
        let kokoro = home.reading_now.iter().find(|b| b.id == "3").unwrap();
        assert_eq!(kokoro.progress.as_deref(), Some("50%"));
        assert_eq!(home.new_books.len(), 8);
    }

    #[test]
    fn test_progress_label_counts_trailing_chunk() {
        let catalog = Catalog::bundled().unwrap();
        let book = catalog.find("4").unwrap();
        let mut store = MemoryStore::new();

        let mut progress = ReadingProgress::default();
        progress.unlocked_chunks.insert(1);
        save_progress(&mut store, "4", &progress).unwrap();
        // 末尾边界之后还有文本，阅读页共 4 章
        cache_boundaries(&mut store, "4", "ABCDEFGH", &[2, 4, 6], Utc::now()).unwrap();

        assert_eq!(progress_label(book, &store).as_deref(), Some("50%"));
    }

    #[test]
    fn test_load_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        fs::write(
            &path,
            r#"[{"id": "a", "title": "檸檬", "author": "梶井基次郎", "description": "えたいの知れない"}]"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("a").unwrap().author, "梶井基次郎");
        assert!(Catalog::load(dir.path().join("missing.json")).is_err());
    }
}
