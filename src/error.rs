use thiserror::Error;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 分段服务错误
///
/// 所有变体的 Display 输出都直接展示给读者
#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("分段服务连接失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("分段服务返回错误 ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("分段服务响应格式错误: {0}")]
    BadShape(String),
    #[error("分段请求已取消")]
    Cancelled,
    #[error("分段任务异常终止: {0}")]
    TaskFailed(String),
}

/// 书籍正文加载错误
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("书目数据无效: {0}")]
    Catalog(String),
    #[error("配置无效: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = SegmentationError::Status {
            status: 400,
            message: "本文テキスト ('text') がありません".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("400"));
        assert!(text.contains("'text'"));
    }

    #[test]
    fn test_storage_error_from_json() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: StorageError = json_err.into();
        assert!(err.to_string().starts_with("序列化失败"));
    }
}
