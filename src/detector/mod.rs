//! 检测模块：DetectionEngine 的模式匹配参考实现
pub mod analyzer;
pub mod detector;

// 导出核心接口
pub use self::detector::PatternEngine;
