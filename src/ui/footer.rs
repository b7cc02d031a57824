use chrono::{Datelike, Utc};
use serde::Serialize;

/// 页脚
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Footer {
    pub credit: String,
    pub copyright: String,
}

impl Footer {
    pub fn new(team: &str, year: i32) -> Self {
        Self {
            credit: format!("Created by {}", team),
            copyright: format!("© {} All rights reserved.", year),
        }
    }

    /// 以当前年份生成
    pub fn current() -> Self {
        Self::new("馬車馬boys", Utc::now().year())
    }
}
