use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use regex::Regex;
use std::fs;
use std::path::Path;

use crate::error::LoadError;

/// 青空文库格式清理器
///
/// 去掉注音（《…》、｜）、入力者注（［＃…］）、开头的凡例块和结尾的底本信息
pub struct AozoraCleaner {
    ruby: Regex,
    annotation: Regex,
    notes_block: Regex,
}

impl AozoraCleaner {
    pub fn new() -> Self {
        Self {
            ruby: Regex::new(r"《[^》]*》").expect("ruby pattern"),
            annotation: Regex::new(r"［＃[^］]*］").expect("annotation pattern"),
            notes_block: Regex::new(r"(?ms)^-{10,}$.*?^-{10,}$\n?").expect("notes pattern"),
        }
    }

    /// 清理文本
    ///
    /// # 参数
    /// - `content`: 已解码的全文
    ///
    /// # 返回
    /// 只含正文的文本（换行统一为 `\n`）
    pub fn clean(&self, content: &str) -> String {
        let text = content.replace("\r\n", "\n");

        // 底本信息之后全部丢弃
        let body = match text.find("\n底本：") {
            Some(pos) => &text[..pos],
            None => text.as_str(),
        };

        let body = self.notes_block.replace(body, "");
        let body = self.annotation.replace_all(&body, "");
        let body = self.ruby.replace_all(&body, "");
        let body = body.replace('｜', "");

        body.trim_matches('\n').to_string()
    }
}

impl Default for AozoraCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// 去掉青空文库标记
pub fn strip_aozora_markup(content: &str) -> String {
    AozoraCleaner::new().clean(content)
}

/// 读取书籍正文文件
///
/// 自动检测编码（BOM、UTF-8、Shift_JIS），解码后清理青空文库标记
pub fn load_text_file<P: AsRef<Path>>(path: P) -> Result<String, LoadError> {
    let bytes = fs::read(path.as_ref())?;

    let encoding = detect_encoding(&bytes);
    let (content, _encoding_used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        log::warn!("{:?} 解码时出现错误，可能存在乱码", path.as_ref());
    }

    Ok(strip_aozora_markup(&content))
}

/// 检测字符编码
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _bom_length)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    if looks_like_shift_jis(bytes) {
        return SHIFT_JIS;
    }

    UTF_8
}

/// 检测字节序列是否像 Shift_JIS
///
/// - 第一字节：0x81-0x9F 或 0xE0-0xFC
/// - 第二字节：0x40-0x7E 或 0x80-0xFC
/// - 0xA1-0xDF 为半角片假名单字节
fn looks_like_shift_jis(bytes: &[u8]) -> bool {
    let mut valid = 0;
    let mut total = 0;

    let mut i = 0;
    while i < bytes.len() {
        let b1 = bytes[i];
        if b1 < 0x80 {
            i += 1;
            continue;
        }

        total += 1;
        if (0xA1..=0xDF).contains(&b1) {
            valid += 1;
            i += 1;
            continue;
        }

        let lead = (0x81..=0x9F).contains(&b1) || (0xE0..=0xFC).contains(&b1);
        match bytes.get(i + 1) {
            Some(&b2) if lead && ((0x40..=0x7E).contains(&b2) || (0x80..=0xFC).contains(&b2)) => {
                valid += 1;
                i += 2;
            }
            _ => i += 1,
        }
    }

    total > 0 && (valid as f32 / total as f32) > 0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_strip_ruby_and_annotations() {
        let text = "｜邪智暴虐《じゃちぼうぎゃく》の王を除かなければならぬ［＃「ならぬ」に傍点］。";
        assert_eq!(strip_aozora_markup(text), "邪智暴虐の王を除かなければならぬ。");
    }

    #[test]
    fn test_strip_header_notes_and_footer() {
        let text = "走れメロス\r\n太宰治\r\n\r\n-------------------------------------------------------\r\n【テキスト中に現れる記号について】\r\n《》：ルビ\r\n-------------------------------------------------------\r\n\r\nメロスは激怒《げきど》した。\r\n\r\n底本：「太宰治全集3」筑摩書房\r\n入力：金川一之\r\n";
        let cleaned = strip_aozora_markup(text);

        assert!(cleaned.starts_with("走れメロス\n太宰治"));
        assert!(cleaned.ends_with("メロスは激怒した。"));
        assert!(!cleaned.contains("記号"));
        assert!(!cleaned.contains("底本"));
        assert!(!cleaned.contains('\r'));
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(strip_aozora_markup("ただの本文。\n二行目。"), "ただの本文。\n二行目。");
    }

    #[test]
    fn test_detect_utf8() {
        assert_eq!(detect_encoding("吾輩は猫である".as_bytes()), UTF_8);
        assert_eq!(detect_encoding(b"Hello"), UTF_8);
    }

    #[test]
    fn test_detect_shift_jis() {
        let (bytes, _, _) = SHIFT_JIS.encode("吾輩は猫である。名前はまだ無い。");
        assert_eq!(detect_encoding(&bytes), SHIFT_JIS);
    }

    #[test]
    fn test_load_shift_jis_file() {
        let (bytes, _, _) = SHIFT_JIS.encode("メロスは激怒《げきど》した。\r\n必ず王を除かなければならぬ。");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let text = load_text_file(file.path()).unwrap();
        assert_eq!(text, "メロスは激怒した。\n必ず王を除かなければならぬ。");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_text_file("/nonexistent/book.txt");
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
