//! 持久化键值存储后端
//! 仅负责整值读写，不关心键的语义；默认值与内存镜像由 OptionStore 处理

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::utils::lock;

/// 异步键值存储（对应浏览器 storage.local）
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 读取单个键，不存在时返回 None
    async fn get(&self, key: &str) -> DriverResult<Option<Value>>;

    /// 写入单个键（整值覆盖）
    async fn set(&self, key: &str, value: Value) -> DriverResult<()>;
}

/// 内存存储（测试与临时运行使用）
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置若干键值
    pub fn with_items<I, K>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let items = items.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            items: Mutex::new(items),
        }
    }

    /// 直接查看底层数据（不经过镜像）
    pub fn snapshot(&self) -> HashMap<String, Value> {
        lock(&self.items).clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> DriverResult<Option<Value>> {
        Ok(lock(&self.items).get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> DriverResult<()> {
        lock(&self.items).insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON文件存储：整个存储为一个JSON对象
pub struct JsonFileStore {
    path: PathBuf,
    // 串行化文件的读-改-写
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> DriverResult<Map<String, Value>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(DriverError::StorageReadError(format!(
                    "{}：{}",
                    self.path.display(),
                    e
                )))
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&data)? {
            Value::Object(map) => Ok(map),
            other => Err(DriverError::StorageReadError(format!(
                "{} 不是JSON对象：{}",
                self.path.display(),
                other
            ))),
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> DriverResult<Option<Value>> {
        let items = self.read_all().await?;
        Ok(items.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> DriverResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_all().await?;
        items.insert(key.to_string(), value);

        let data = serde_json::to_vec_pretty(&Value::Object(items))?;
        // 先写临时文件再改名，避免写一半时崩溃留下损坏文件
        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &data)
            .await
            .map_err(|e| DriverError::StorageWriteError(format!("{}：{}", tmp_path.display(), e)))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| DriverError::StorageWriteError(format!("{}：{}", self.path.display(), e)))?;

        debug!("存储文件已更新：{}，键={}，大小={}字节", self.path.display(), key, data.len());
        Ok(())
    }
}
