//! 主机名检测结果缓存与广告记录缓存
//! 主机名缓存跨会话累积，整体读写；进程内多次记录合并到同一条目

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::rule::Technology;
use crate::storage::{keys, OptionStore};
use crate::utils::lock;

/// 主机名缓存：hostname -> { applications: {name: {confidence, version}}, hits }
#[derive(Debug, Default)]
pub struct HostnameCache {
    entries: Mutex<Map<String, Value>>,
    // 载入前不写回，避免部分数据覆盖已存储的缓存
    loaded: AtomicBool,
}

impl HostnameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从选项存储载入（启动时执行一次）
    pub async fn load(&self, options: &OptionStore) {
        let stored = options.get(keys::HOSTNAME_CACHE, json!({})).await;
        self.loaded.store(true, Ordering::Release);
        let Value::Object(stored) = stored else {
            debug!("hostnameCache 不是对象，忽略");
            return;
        };

        // 与启动期间已经产生的记录合并
        let mut entries = lock(&self.entries);
        for (hostname, entry) in stored {
            entries.entry(hostname).or_insert(entry);
        }
    }

    /// 记录一次检测结果
    pub fn record(&self, hostname: &str, detected: &[Technology]) {
        let mut entries = lock(&self.entries);
        let entry = entries
            .entry(hostname.to_string())
            .or_insert_with(|| json!({ "applications": {}, "hits": 0 }));
        merge_entry(entry, detected);
    }

    /// 将当前缓存写入选项存储（载入完成之前跳过）
    pub fn persist(&self, options: &OptionStore) {
        if !self.loaded.load(Ordering::Acquire) {
            debug!("hostnameCache 尚未载入，跳过写回");
            return;
        }
        options.set(keys::HOSTNAME_CACHE, Value::Object(self.snapshot()));
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        lock(&self.entries).clone()
    }

    /// 取出全部条目并清空
    pub fn take(&self) -> Map<String, Value> {
        std::mem::take(&mut *lock(&self.entries))
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn merge_entry(entry: &mut Value, detected: &[Technology]) {
    if !entry.is_object() {
        *entry = json!({ "applications": {}, "hits": 0 });
    }

    let hits = entry["hits"].as_u64().unwrap_or(0);
    entry["hits"] = json!(hits + 1);

    if !entry["applications"].is_object() {
        entry["applications"] = json!({});
    }
    let applications = &mut entry["applications"];
    for tech in detected {
        let app = &mut applications[tech.name.as_str()];
        let previous_version = app["version"].as_str().map(str::to_string);
        *app = json!({
            "confidence": tech.confidence,
            "version": tech.version.clone().or(previous_version),
        });
    }
}

/// 广告检测记录缓存
#[derive(Debug, Default)]
pub struct AdCache {
    records: Mutex<Vec<Value>>,
}

impl AdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: Value) {
        lock(&self.records).push(record);
    }

    pub fn take(&self) -> Vec<Value> {
        std::mem::take(&mut *lock(&self.records))
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
