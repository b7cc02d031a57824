use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::library::Book;

/// 没有封面时显示的文字
pub const NO_IMAGE: &str = "No Image";

/// 封面
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverArt {
    /// 图片地址或 data URI；None 表示显示占位
    pub src: Option<String>,
    pub alt: String,
}

impl CoverArt {
    /// 解析书籍封面
    ///
    /// # 参数
    /// - `book`: 书籍
    /// - `asset_root`: 本地静态资源目录；图片在其中存在时内联为 data URI
    pub fn for_book(book: &Book, asset_root: Option<&Path>) -> Self {
        let src = book.image_url.as_ref().map(|url| {
            asset_root
                .and_then(|root| inline_image(&root.join(url.trim_start_matches('/'))))
                .unwrap_or_else(|| url.clone())
        });
        Self {
            src,
            alt: book.title.clone(),
        }
    }

    /// 展示文字：有图时为 alt，无图时为占位
    pub fn caption(&self) -> &str {
        match self.src {
            Some(_) => &self.alt,
            None => NO_IMAGE,
        }
    }
}

fn inline_image(path: &Path) -> Option<String> {
    let data = fs::read(path).ok()?;
    let mime = match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    };
    Some(format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(&data)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(image_url: Option<&str>) -> Book {
        Book {
            id: "1".to_string(),
            title: "走れメロス".to_string(),
            author: "太宰治".to_string(),
            description: String::new(),
            image_url: image_url.map(str::to_string),
            text_file: None,
            progress: None,
        }
    }

    #[test]
    fn test_no_image_placeholder() {
        let cover = CoverArt::for_book(&book(None), None);
        assert_eq!(cover.src, None);
        assert_eq!(cover.caption(), NO_IMAGE);
    }

    #[test]
    fn test_remote_reference_kept() {
        let cover = CoverArt::for_book(&book(Some("/mock/img/hashire_merosu.jpg")), None);
        assert_eq!(cover.src.as_deref(), Some("/mock/img/hashire_merosu.jpg"));
        assert_eq!(cover.caption(), "走れメロス");
    }

    #[test]
    fn test_local_image_inlined() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mock/img")).unwrap();
        fs::write(dir.path().join("mock/img/cover.jpg"), b"abc").unwrap();

        let cover = CoverArt::for_book(&book(Some("/mock/img/cover.jpg")), Some(dir.path()));
        assert_eq!(cover.src.as_deref(), Some("data:image/jpeg;base64,YWJj"));
    }

    #[test]
    fn test_missing_local_file_falls_back_to_url() {
        let dir = tempfile::tempdir().unwrap();
        let cover = CoverArt::for_book(&book(Some("/mock/img/none.png")), Some(dir.path()));
        assert_eq!(cover.src.as_deref(), Some("/mock/img/none.png"));
    }
}
