/// 查看章节与双页分割结果
///
/// 用法: explore_pages <文本文件> [边界,边界,...]
/// 不给边界时整篇作为一章

use std::env;
use std::process;

use sukima_reader_lib::text::{
    load_text_file, mask_locked, split_by_boundaries, split_into_two_pages,
};

fn parse_boundaries(raw: &str) -> Result<Vec<usize>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|e| format!("无效的边界 {:?}: {}", s, e)))
        .collect()
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(40).collect();
    head.replace('\n', "⏎")
}

fn main() {
    sukima_reader_lib::init_logging();

    let args: Vec<String> = env::args().collect();
    let path = match args.get(1) {
        Some(path) => path,
        None => {
            eprintln!("用法: {} <文本文件> [边界,边界,...]", args[0]);
            process::exit(2);
        }
    };

    let text = match load_text_file(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("错误: 无法读取 {}: {}", path, e);
            process::exit(1);
        }
    };

    let chunks = match args.get(2) {
        Some(raw) => match parse_boundaries(raw) {
            Ok(boundaries) => split_by_boundaries(&text, &boundaries),
            Err(e) => {
                eprintln!("错误: {}", e);
                process::exit(2);
            }
        },
        None => vec![text.clone()],
    };

    println!("正文字数: {}", text.chars().count());
    println!("章节数: {}\n", chunks.len());

    for (i, chunk) in chunks.iter().enumerate() {
        let pages = split_into_two_pages(chunk);
        println!("=== 章节 {} ({} 字) ===", i, chunk.chars().count());
        println!(
            "  右页 {:>4} 字: {}",
            pages.right.chars().count(),
            preview(&pages.right)
        );
        println!(
            "  左页 {:>4} 字: {}",
            pages.left.chars().count(),
            preview(&pages.left)
        );
        if i > 0 {
            println!("  锁定时: {}", preview(&mask_locked(chunk, 50, '■')));
        }
        println!();
    }
}
