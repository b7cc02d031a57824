/// 遮挡锁定章节
///
/// 保留前 `visible` 个字符，其余每个字符都替换为 `glyph`，
/// 字符数不变，版面网格不受影响。
pub fn mask_locked(text: &str, visible: usize, glyph: char) -> String {
    text.chars()
        .enumerate()
        .map(|(i, c)| if i < visible { c } else { glyph })
        .collect()
}
