use serde::{Deserialize, Serialize};

/// 默认换行搜索窗口（字符数）
pub const DEFAULT_SPLIT_WINDOW: usize = 120;

/// 双页
///
/// 右→左阅读，右页先显示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePair {
    pub right: String,
    pub left: String,
}

/// 把一章文本分成左右两页
pub fn split_into_two_pages(text: &str) -> PagePair {
    split_into_two_pages_with_window(text, DEFAULT_SPLIT_WINDOW)
}

/// 把一章文本分成左右两页
///
/// 理想分割点为字符数的一半（向下取整）。优先在理想点 ±`window` 字符内寻找
/// 换行：理想点及之前的最后一个换行、理想点之后的第一个换行，取离理想点更近者，
/// 距离相同时取前者；没有合适的换行则直接在理想点切开。换行符归入左页。
///
/// # 参数
/// - `text`: 章节文本
/// - `window`: 换行搜索窗口
pub fn split_into_two_pages_with_window(text: &str, window: usize) -> PagePair {
    let offsets: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
    let len = offsets.len();

    if len <= 1 {
        return PagePair {
            right: text.to_string(),
            left: String::new(),
        };
    }

    let ideal = len / 2;
    let is_newline = |i: usize| text[offsets[i]..].starts_with('\n');

    let before = (0..=ideal).rev().find(|&i| is_newline(i));
    let after = ((ideal + 1).min(len - 1)..len).find(|&i| is_newline(i));

    let within = |pos: usize| pos.abs_diff(ideal) <= window;
    let cut = match (before.filter(|&p| within(p)), after.filter(|&p| within(p))) {
        (Some(b), Some(a)) => {
            if a - ideal < ideal - b {
                a
            } else {
                b
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => ideal,
    };

    let byte_cut = offsets[cut];
    PagePair {
        right: text[..byte_cut].to_string(),
        left: text[byte_cut..].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_lengths() {
        assert_eq!(
            split_into_two_pages(""),
            PagePair { right: String::new(), left: String::new() }
        );
        assert_eq!(
            split_into_two_pages("あ"),
            PagePair { right: "あ".to_string(), left: String::new() }
        );
    }

    #[test]
    fn test_no_newline_splits_at_midpoint() {
        let pages = split_into_two_pages("ABCDEFG");
        assert_eq!(pages.right, "ABC");
        assert_eq!(pages.left, "DEFG");
    }

    #[test]
    fn test_newline_before_midpoint() {
        // len 10, ideal 5, newline at 3
        let pages = split_into_two_pages("ABC\nEFGHIJ");
        assert_eq!(pages.right, "ABC");
        assert_eq!(pages.left, "\nEFGHIJ");
    }

    #[test]
    fn test_newline_after_midpoint() {
        // len 10, ideal 5, newline at 7
        let pages = split_into_two_pages("ABCDEFG\nIJ");
        assert_eq!(pages.right, "ABCDEFG");
        assert_eq!(pages.left, "\nIJ");
    }

    #[test]
    fn test_closer_newline_wins() {
        // len 20, ideal 10, newlines at 4 and 12
        let text = "ABCD\nFGHIJKL\nNOPQRST";
        let pages = split_into_two_pages(text);
        assert_eq!(pages.right.chars().count(), 12);
        assert!(pages.left.starts_with('\n'));
    }

    #[test]
    fn test_tie_prefers_preceding_newline() {
        // len 20, ideal 10, newlines at 8 and 12
        let text = "ABCDEFGH\nJKL\nNOPQRST";
        let pages = split_into_two_pages(text);
        assert_eq!(pages.right, "ABCDEFGH");
    }

    #[test]
    fn test_newline_outside_window_ignored() {
        let mut text = String::from("\n");
        text.push_str(&"あ".repeat(399));
        // len 400, ideal 200, only newline at 0
        let pages = split_into_two_pages(&text);
        assert_eq!(pages.right.chars().count(), 200);
        assert_eq!(pages.left.chars().count(), 200);
    }

    #[test]
    fn test_newline_at_window_edge() {
        let mut text = "い".repeat(80);
        text.push('\n');
        text.push_str(&"う".repeat(319));
        // len 400, ideal 200, newline at 80 (distance 120)
        let pages = split_into_two_pages(&text);
        assert_eq!(pages.right.chars().count(), 80);
    }

    #[test]
    fn test_custom_window() {
        let text = "ABC\nEFGHIJ";
        let pages = split_into_two_pages_with_window(text, 1);
        assert_eq!(pages.right, "ABC\nE");
    }

    #[test]
    fn test_pages_reassemble() {
        let text = "メロスは激怒した。\n必ず、かの邪智暴虐の王を除かなければならぬと決意した。\nメロスには政治がわからぬ。";
        let pages = split_into_two_pages(text);
        assert_eq!(format!("{}{}", pages.right, pages.left), text);
    }
}
