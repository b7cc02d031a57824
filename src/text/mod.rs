// 文本处理：按边界切章、双页分割、遮挡、正文加载

pub mod chunker;
pub mod pager;
pub mod mask;
pub mod aozora;

pub use chunker::{boundaries_from_packets, split_by_boundaries};
pub use pager::{split_into_two_pages, split_into_two_pages_with_window, PagePair};
pub use mask::mask_locked;
pub use aozora::{load_text_file, strip_aozora_markup};
