//! 标签页状态表
//! 每个标签页的请求URL与最近一次检测结果，随标签页生命周期存在，不持久化

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use crate::browser::TabId;
use crate::rule::Technology;
use crate::utils::lock;

/// 单个标签页的状态
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabState {
    pub detected_technologies: Vec<Technology>,
    pub request_urls: Vec<String>,
}

#[derive(Debug, Default)]
struct TabTable {
    tabs: HashMap<TabId, TabState>,
    // 已关闭的标签页（浏览器会话内ID不复用），迟到的写入直接丢弃
    closed: HashSet<TabId>,
}

/// 标签页状态表
#[derive(Debug, Default)]
pub struct TabStateTable {
    inner: Mutex<TabTable>,
}

impl TabStateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加请求URL（首次出现时创建条目），标签页已关闭时返回 false
    pub fn record_request(&self, tab_id: TabId, url: &str) -> bool {
        let mut table = lock(&self.inner);
        if table.closed.contains(&tab_id) {
            return false;
        }
        table
            .tabs
            .entry(tab_id)
            .or_default()
            .request_urls
            .push(url.to_string());
        true
    }

    /// 整体覆盖检测结果（不合并），标签页已关闭时返回 false
    pub fn set_detected(&self, tab_id: TabId, detected: Vec<Technology>) -> bool {
        let mut table = lock(&self.inner);
        if table.closed.contains(&tab_id) {
            return false;
        }
        table.tabs.entry(tab_id).or_default().detected_technologies = detected;
        true
    }

    /// 标签页关闭：丢弃整个条目；重复移除或移除未知标签页都不是错误
    pub fn remove(&self, tab_id: TabId) {
        let mut table = lock(&self.inner);
        let existed = table.tabs.remove(&tab_id).is_some();
        table.closed.insert(tab_id);
        debug!("标签页 {} 已移除（存在状态：{}）", tab_id, existed);
    }

    pub fn get(&self, tab_id: TabId) -> Option<TabState> {
        lock(&self.inner).tabs.get(&tab_id).cloned()
    }

    /// 标签页的请求URL（未知标签页为空）
    pub fn request_urls(&self, tab_id: TabId) -> Vec<String> {
        self.get(tab_id).map(|state| state.request_urls).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_created_lazily() {
        let table = TabStateTable::new();
        assert!(table.get(7).is_none());

        assert!(table.record_request(7, "https://a.test/app.js"));
        assert!(table.record_request(7, "https://a.test/style.css"));
        assert_eq!(
            table.request_urls(7),
            vec!["https://a.test/app.js", "https://a.test/style.css"]
        );
        assert!(table.get(7).unwrap().detected_technologies.is_empty());
    }

    #[test]
    fn test_detected_overwritten_wholesale() {
        let table = TabStateTable::new();
        table.set_detected(1, vec![Technology::from_name("A".into()), Technology::from_name("B".into())]);
        table.set_detected(1, vec![Technology::from_name("C".into())]);

        let names: Vec<String> = table
            .get(1)
            .unwrap()
            .detected_technologies
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["C"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let table = TabStateTable::new();
        table.remove(99);
        table.remove(99);
        assert!(table.get(99).is_none());
        assert!(table.request_urls(99).is_empty());

        table.record_request(3, "https://a.test/");
        table.remove(3);
        table.remove(3);
        assert!(table.is_empty());
    }

    #[test]
    fn test_late_writes_to_closed_tab_are_dropped() {
        let table = TabStateTable::new();
        table.record_request(5, "https://a.test/");
        table.remove(5);

        assert!(!table.set_detected(5, vec![Technology::from_name("Late".into())]));
        assert!(!table.record_request(5, "https://a.test/late.js"));
        assert!(table.get(5).is_none());
    }
}
