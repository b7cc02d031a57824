/// 按边界切章
///
/// 边界是字符（Unicode 标量）偏移，与分段服务 `len()` 的计数方式一致。
/// 第 i 章为 `text[boundaries[i-1]..boundaries[i]]`（起点隐含为 0），
/// 最后一个边界之后若还有剩余文本，作为最后一章。
///
/// # 参数
/// - `text`: 全文
/// - `boundaries`: 单调不减的边界列表
///
/// # 返回
/// 章节列表；文本或边界为空时返回空列表
pub fn split_by_boundaries(text: &str, boundaries: &[usize]) -> Vec<String> {
    if text.is_empty() || boundaries.is_empty() {
        return Vec::new();
    }

    // 字符序号 -> 字节偏移，末尾补上文本长度
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = offsets.len() - 1;

    let mut chunks = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;

    for &boundary in boundaries {
        // 越界截断；倒退的边界视为与上一个重合
        let end = boundary.min(char_len).max(start);
        if end > start {
            chunks.push(text[offsets[start]..offsets[end]].to_string());
        }
        start = end;
    }

    if start < char_len {
        chunks.push(text[offsets[start]..].to_string());
    }

    chunks
}

/// 把分段文本列表转换为累计边界
///
/// 分段服务拿到 AI 返回的片段后按此规则生成 `boundaries`
pub fn boundaries_from_packets<S: AsRef<str>>(packets: &[S]) -> Vec<usize> {
    packets
        .iter()
        .scan(0usize, |total, packet| {
            *total += packet.as_ref().chars().count();
            Some(*total)
        })
        .collect()
}
