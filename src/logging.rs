//! 日志协作方：记录消息、来源与级别

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// 日志级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// 记录一条来自驱动或内容脚本的日志
pub fn record(message: &str, source: &str, severity: Severity) {
    match severity {
        Severity::Debug => debug!(source, "{}", message),
        Severity::Info => info!(source, "{}", message),
        Severity::Warn => warn!(source, "{}", message),
        Severity::Error => error!(source, "{}", message),
    }
}

/// 初始化 tracing 订阅者（CLI 与调试使用）
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
