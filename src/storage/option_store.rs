//! 用户选项存储
//! 读：内存镜像优先，未命中时异步读取后端；失败或缺失返回默认值并记录日志
//! 写：同步更新内存镜像，后台任务异步写入后端（fire and forget）

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use super::backend::KeyValueStore;
use crate::utils::lock;

/// 后台写入任务
enum WriteTask {
    Set { key: String, value: Value },
    Flush(oneshot::Sender<()>),
}

struct OptionStoreInner {
    backend: Arc<dyn KeyValueStore>,
    mirror: Mutex<HashMap<String, Value>>,
    writer: mpsc::UnboundedSender<WriteTask>,
}

/// 选项存储（可廉价克隆，所有克隆共享同一镜像与写入队列）
#[derive(Clone)]
pub struct OptionStore {
    inner: Arc<OptionStoreInner>,
}

impl OptionStore {
    /// 创建选项存储并启动后台写入任务（需在tokio运行时内调用）
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (writer, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&backend), queue));

        Self {
            inner: Arc::new(OptionStoreInner {
                backend,
                mirror: Mutex::new(HashMap::new()),
                writer,
            }),
        }
    }

    /// 读取选项，缺失或读取失败时返回默认值
    pub async fn get(&self, name: &str, default: Value) -> Value {
        self.load(name).await.unwrap_or(default)
    }

    /// 读取并反序列化选项，类型不符时同样回退默认值
    pub async fn get_as<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        let Some(value) = self.load(name).await else {
            return default;
        };

        match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("选项 {} 类型不匹配，使用默认值：{}", name, e);
                default
            }
        }
    }

    /// 仅查看内存镜像（不访问后端）
    pub fn cached(&self, name: &str) -> Option<Value> {
        lock(&self.inner.mirror).get(name).cloned()
    }

    /// 写入选项：镜像立即生效，后端写入在后台完成
    pub fn set(&self, name: &str, value: Value) {
        lock(&self.inner.mirror).insert(name.to_string(), value.clone());
        self.submit(name, value);
    }

    /// 序列化后写入
    pub fn set_as<T: Serialize>(&self, name: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(name, value),
            Err(e) => error!("选项 {} 序列化失败：{}", name, e),
        }
    }

    /// 读-改-写：在镜像锁内完成修改，保证进程内并发写入互相合并而不是覆盖
    pub async fn update<F>(&self, name: &str, default: Value, modify: F) -> Value
    where
        F: FnOnce(&mut Value),
    {
        // 确保镜像中已有后端的最新值
        self.load(name).await;

        let updated = {
            let mut mirror = lock(&self.inner.mirror);
            let entry = mirror.entry(name.to_string()).or_insert(default);
            modify(entry);
            entry.clone()
        };

        self.submit(name, updated.clone());
        updated
    }

    /// 等待此前提交的所有写入落盘
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.inner.writer.send(WriteTask::Flush(done)).is_err() {
            warn!("选项写入任务已退出，无法等待落盘");
            return;
        }
        let _ = wait.await;
    }

    async fn load(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.cached(name) {
            return Some(value);
        }

        match self.inner.backend.get(name).await {
            Ok(Some(Value::Null)) | Ok(None) => None,
            Ok(Some(value)) => {
                // 等待期间若已有新写入，以镜像为准
                let mut mirror = lock(&self.inner.mirror);
                Some(mirror.entry(name.to_string()).or_insert(value).clone())
            }
            Err(e) => {
                error!("[driver] 读取选项 {} 失败：{}", name, e);
                None
            }
        }
    }

    fn submit(&self, name: &str, value: Value) {
        let task = WriteTask::Set {
            key: name.to_string(),
            value,
        };
        if self.inner.writer.send(task).is_err() {
            error!("选项写入任务已退出，{} 未能持久化", name);
        }
    }
}

async fn run_writer(backend: Arc<dyn KeyValueStore>, mut queue: mpsc::UnboundedReceiver<WriteTask>) {
    while let Some(task) = queue.recv().await {
        match task {
            WriteTask::Set { key, value } => match backend.set(&key, value).await {
                Ok(()) => debug!("选项 {} 已持久化", key),
                Err(e) => error!("[driver] 写入选项 {} 失败：{}", key, e),
            },
            WriteTask::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DriverError, DriverResult};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> DriverResult<Option<Value>> {
            Err(DriverError::StorageReadError("disk gone".into()))
        }

        async fn set(&self, _key: &str, _value: Value) -> DriverResult<()> {
            Err(DriverError::StorageWriteError("disk gone".into()))
        }
    }

    #[tokio::test]
    async fn test_missing_key_resolves_default() {
        let store = OptionStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.get("dynamicIcon", json!(false)).await, json!(false));
        assert!(store.get_as("tracking", true).await);
    }

    #[tokio::test]
    async fn test_stored_false_is_not_replaced_by_default() {
        let backend = Arc::new(MemoryStore::with_items([("tracking", json!(false))]));
        let store = OptionStore::new(backend);
        assert!(!store.get_as("tracking", true).await);
    }

    #[tokio::test]
    async fn test_storage_error_resolves_default() {
        let store = OptionStore::new(Arc::new(BrokenStore));
        assert_eq!(store.get("hostnameCache", json!({})).await, json!({}));

        // 写入失败只记录日志，镜像依然可读
        store.set("pinnedCategory", json!(12));
        store.flush().await;
        assert_eq!(store.get("pinnedCategory", Value::Null).await, json!(12));
    }

    #[tokio::test]
    async fn test_set_writes_through_after_flush() {
        let backend = Arc::new(MemoryStore::new());
        let store = OptionStore::new(backend.clone());

        store.set("version", json!("4.2.0"));
        assert_eq!(store.cached("version"), Some(json!("4.2.0")));

        store.flush().await;
        assert_eq!(backend.snapshot().get("version"), Some(&json!("4.2.0")));
    }

    #[tokio::test]
    async fn test_update_merges_concurrent_writers() {
        let backend = Arc::new(MemoryStore::with_items([("robotsTxtCache", json!({"a.com": []}))]));
        let store = OptionStore::new(backend.clone());

        let first = store.update("robotsTxtCache", json!({}), |cache| {
            cache["b.com"] = json!([]);
        });
        let second = store.update("robotsTxtCache", json!({}), |cache| {
            cache["c.com"] = json!([]);
        });
        futures::future::join(first, second).await;
        store.flush().await;

        let persisted = backend.snapshot().get("robotsTxtCache").cloned().unwrap();
        assert_eq!(persisted, json!({"a.com": [], "b.com": [], "c.com": []}));
    }
}
