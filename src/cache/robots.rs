//! robots.txt 缓存与单飞（single-flight）拉取
//!
//! 同一主机同一时刻最多只有一个出站请求：并发调用者共享同一个
//! `Shared` 句柄并得到完全相同的结果。队列条目由 [`QueueGuard`] 在任务
//! 结束（成功、命中缓存、追踪关闭、超时、失败乃至panic）时统一移除。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use super::robots_rules::{parse_robots_txt, RobotsRule};
use crate::net::HttpClient;
use crate::storage::{keys, OptionStore};
use crate::utils::lock;

/// 进行中的拉取：可克隆、可被多个调用者等待
pub type PendingRobots = Shared<BoxFuture<'static, Vec<RobotsRule>>>;

struct RobotsInner {
    options: OptionStore,
    http: Arc<dyn HttpClient>,
    timeout: Duration,
    queue: Mutex<HashMap<String, PendingRobots>>,
}

/// robots.txt 规则缓存（持久化在 `robotsTxtCache` 选项中）
#[derive(Clone)]
pub struct RobotsTxtCache {
    inner: Arc<RobotsInner>,
}

/// 队列清理守卫：随任务结束而析构，析构时移除主机的队列条目
struct QueueGuard {
    inner: Arc<RobotsInner>,
    host: String,
}

impl Drop for QueueGuard {
    fn drop(&mut self) {
        lock(&self.inner.queue).remove(&self.host);
        debug!("robots.txt 队列已释放：{}", self.host);
    }
}

impl RobotsTxtCache {
    pub fn new(options: OptionStore, http: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RobotsInner {
                options,
                http,
                timeout,
                queue: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// 获取主机的 robots 规则
    ///
    /// 同步登记：两次调用只要发生在第一次结算之前，就共享同一次操作，
    /// 与调用者何时开始 await 无关。返回值永远不会失败，异常一律降级为空规则。
    pub fn get_robots_txt(&self, host: &str, secure: bool) -> PendingRobots {
        let mut queue = lock(&self.inner.queue);
        if let Some(pending) = queue.get(host) {
            debug!("robots.txt 拉取进行中，加入等待：{}", host);
            return pending.clone();
        }

        let guard = QueueGuard {
            inner: Arc::clone(&self.inner),
            host: host.to_string(),
        };
        let inner = Arc::clone(&self.inner);
        let owned_host = host.to_string();

        // 独立任务保证即使所有调用者都放弃等待，清理也会执行；
        // 持有队列锁期间登记，守卫析构必然发生在登记之后
        let task = tokio::spawn(async move {
            let _guard = guard;
            inner.resolve(&owned_host, secure).await
        });

        let log_host = host.to_string();
        let pending = async move {
            task.await.unwrap_or_else(|e| {
                error!("robots.txt 任务异常终止：{}，{}", log_host, e);
                Vec::new()
            })
        }
        .boxed()
        .shared();

        queue.insert(host.to_string(), pending.clone());
        pending
    }

    /// 主机是否有进行中的拉取
    pub fn is_pending(&self, host: &str) -> bool {
        lock(&self.inner.queue).contains_key(host)
    }

    /// 进行中的拉取数量
    pub fn pending_count(&self) -> usize {
        lock(&self.inner.queue).len()
    }

    /// 读取已缓存的规则（不触发网络）
    pub async fn cached(&self, host: &str) -> Option<Vec<RobotsRule>> {
        let cache: HashMap<String, Vec<RobotsRule>> = self
            .inner
            .options
            .get_as(keys::ROBOTS_TXT_CACHE, HashMap::new())
            .await;
        cache.get(host).cloned()
    }

    /// 清空缓存（上报后执行）
    pub fn clear(&self) {
        self.inner.options.set(keys::ROBOTS_TXT_CACHE, json!({}));
    }
}

impl RobotsInner {
    async fn resolve(&self, host: &str, secure: bool) -> Vec<RobotsRule> {
        if !self.options.get_as(keys::TRACKING, true).await {
            debug!("追踪已关闭，跳过 robots.txt：{}", host);
            return Vec::new();
        }

        let cache: HashMap<String, Vec<RobotsRule>> = self
            .options
            .get_as(keys::ROBOTS_TXT_CACHE, HashMap::new())
            .await;
        if let Some(rules) = cache.get(host) {
            debug!("robots.txt 命中缓存：{}，规则数：{}", host, rules.len());
            return rules.clone();
        }

        let url = format!("http{}://{}/robots.txt", if secure { "s" } else { "" }, host);

        // 超时后丢弃拉取 future，迟到的响应不可能再写入缓存
        let response = match tokio::time::timeout(self.timeout, self.http.get(&url)).await {
            Err(_) => {
                warn!("GET {} 超时（{:?}），按空规则处理", url, self.timeout);
                return Vec::new();
            }
            Ok(Err(e)) => {
                warn!("GET {} 失败：{}", url, e);
                return Vec::new();
            }
            Ok(Ok(response)) => response,
        };

        let rules = if response.is_success() {
            parse_robots_txt(&response.text())
        } else {
            debug!("GET {} 返回状态码 {}，按空规则缓存", url, response.status);
            Vec::new()
        };

        let entry = match serde_json::to_value(&rules) {
            Ok(entry) => entry,
            Err(e) => {
                error!("robots 规则序列化失败：{}，{}", host, e);
                return rules;
            }
        };
        self.options
            .update(keys::ROBOTS_TXT_CACHE, json!({}), |cache| {
                if !cache.is_object() {
                    *cache = Value::Object(Default::default());
                }
                cache[host] = entry;
            })
            .await;

        debug!("robots.txt 已缓存：{}，规则数：{}", host, rules.len());
        rules
    }
}
