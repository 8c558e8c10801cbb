//! 工具模块：提供通用工具函数
pub mod header_converter;
pub mod detection_updater;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use self::header_converter::{HeaderConverter, HttpHeader};
pub use self::detection_updater::{DetectedMap, DetectionUpdater};

/// 获取互斥锁；持锁方panic不影响后续访问（临界区内只有简单的表操作）
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
