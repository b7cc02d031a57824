use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::LoadError;

/// 分段服务地址的环境变量
pub const ENV_SPLIT_API: &str = "SUKIMA_SPLIT_API";
/// 数据库路径的环境变量
pub const ENV_DB_PATH: &str = "SUKIMA_DB_PATH";
/// 解锁延迟上限（一年）
pub const MAX_UNLOCK_DELAY_SECS: u64 = 365 * 24 * 60 * 60;

/// 阅读器配置
///
/// 所有字段都有默认值，配置文件里只需写要覆盖的项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// 分段服务根地址（请求发往 `{split_api_base}/api/split`）
    #[serde(default = "default_split_api_base")]
    pub split_api_base: String,
    /// 分段请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 锁定后自动解锁所需时间（秒）
    #[serde(default = "default_unlock_delay_secs")]
    pub unlock_delay_secs: u64,
    /// 解锁检查周期（秒）
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// 锁定章节仍可见的前缀字符数
    #[serde(default = "default_visible_prefix_chars")]
    pub visible_prefix_chars: usize,
    /// 分页时在中点附近寻找换行的窗口（字符数）
    #[serde(default = "default_split_window")]
    pub split_window: usize,
    /// 遮挡用占位字符
    #[serde(default = "default_placeholder_glyph")]
    pub placeholder_glyph: char,
    /// 本地数据库路径
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// 书目 JSON 文件；不设置时使用内置书目
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

fn default_split_api_base() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120 // AI 分段较慢
}

fn default_unlock_delay_secs() -> u64 {
    60 * 60
}

fn default_check_interval_secs() -> u64 {
    30
}

fn default_visible_prefix_chars() -> usize {
    50
}

fn default_split_window() -> usize {
    120
}

fn default_placeholder_glyph() -> char {
    '■'
}

fn default_db_path() -> PathBuf {
    PathBuf::from("sukima-reader.db")
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            split_api_base: default_split_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            unlock_delay_secs: default_unlock_delay_secs(),
            check_interval_secs: default_check_interval_secs(),
            visible_prefix_chars: default_visible_prefix_chars(),
            split_window: default_split_window(),
            placeholder_glyph: default_placeholder_glyph(),
            db_path: default_db_path(),
            catalog_path: None,
        }
    }
}

impl ReaderConfig {
    /// 从 JSON 文件加载配置，再应用环境变量覆盖
    ///
    /// # 参数
    /// - `path`: 配置文件路径
    ///
    /// # 返回
    /// 合并后的配置；文件不存在时使用默认值
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            log::info!("配置文件 {:?} 不存在，使用默认配置", path);
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// 检查取值范围
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.unlock_delay_secs > MAX_UNLOCK_DELAY_SECS {
            return Err(LoadError::Config(format!(
                "unlock_delay_secs 为 {}，超过上限 {}",
                self.unlock_delay_secs, MAX_UNLOCK_DELAY_SECS
            )));
        }
        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env(&mut self) {
        if let Ok(base) = std::env::var(ENV_SPLIT_API) {
            if !base.trim().is_empty() {
                self.split_api_base = base.trim().to_string();
            }
        }
        if let Ok(db) = std::env::var(ENV_DB_PATH) {
            if !db.trim().is_empty() {
                self.db_path = PathBuf::from(db.trim());
            }
        }
    }

    /// 分段接口完整地址
    pub fn split_endpoint(&self) -> String {
        format!("{}/api/split", self.split_api_base.trim_end_matches('/'))
    }

    /// 解锁延迟；超出上限的值按上限处理
    pub fn unlock_delay(&self) -> chrono::Duration {
        let secs = self.unlock_delay_secs.min(MAX_UNLOCK_DELAY_SECS);
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::days(365))
    }

    pub fn check_interval(&self) -> Duration {
        // interval 不接受 0
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
