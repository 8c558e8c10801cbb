//! 提取模块：从页面markup中提取检测信号
pub mod html_extractor;

pub use self::html_extractor::{HtmlExtractor, MarkupSignals};
