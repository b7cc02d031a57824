// 展示用模型：FAQ、页脚、封面、倒计时徽章

pub mod badge;
pub mod cover;
pub mod faq;
pub mod footer;

pub use badge::time_left_label;
pub use cover::CoverArt;
pub use faq::FaqAccordion;
pub use footer::Footer;
