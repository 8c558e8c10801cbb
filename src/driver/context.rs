//! 驱动上下文：所有组件共享的显式状态
//! 选项存储是唯一的持久化入口；缓存、标签页状态、定义集都由上下文持有

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::{Browser, Tab};
use crate::cache::{is_path_allowed, HostCacheSet};
use crate::config::DriverConfig;
use crate::engine::{AnalysisContext, DetectionEngine, Evidence};
use crate::net::HttpClient;
use crate::rule::{DefinitionsHandle, Technology};
use crate::storage::{keys, KeyValueStore, OptionStore};
use crate::tabs::TabStateTable;
use crate::utils::lock;

/// 驱动上下文
pub struct DriverContext {
    pub config: DriverConfig,
    pub options: OptionStore,
    pub hosts: HostCacheSet,
    pub tabs: TabStateTable,
    pub definitions: DefinitionsHandle,
    pub engine: Arc<dyn DetectionEngine>,
    pub browser: Arc<dyn Browser>,
    pub http: Arc<dyn HttpClient>,
    page_html: Mutex<Option<String>>,
}

impl DriverContext {
    /// 构建上下文（需在tokio运行时内调用）
    pub fn new(
        config: DriverConfig,
        store: Arc<dyn KeyValueStore>,
        browser: Arc<dyn Browser>,
        engine: Arc<dyn DetectionEngine>,
        http: Arc<dyn HttpClient>,
    ) -> Arc<Self> {
        let options = OptionStore::new(store);
        let hosts = HostCacheSet::new(&config, options.clone(), Arc::clone(&http));

        Arc::new(Self {
            config,
            options,
            hosts,
            tabs: TabStateTable::new(),
            definitions: DefinitionsHandle::new(),
            engine,
            browser,
            http,
            page_html: Mutex::new(None),
        })
    }

    /// 最近一次分析得到的页面markup
    pub fn page_html(&self) -> Option<String> {
        lock(&self.page_html).clone()
    }

    pub async fn tracking_enabled(&self) -> bool {
        self.options.get_as(keys::TRACKING, true).await
    }

    /// 调用检测引擎并分发结果
    ///
    /// 等待定义就绪后执行；结果整体覆盖标签页的检测列表（已关闭的标签页忽略），
    /// 追踪开启且 robots 允许时记入主机名缓存。
    pub async fn analyze(&self, url: &Url, evidence: Evidence, tab: Option<&Tab>) {
        self.definitions.wait_ready().await;

        if let Some(html) = &evidence.html {
            *lock(&self.page_html) = Some(html.clone());
        }

        let context = AnalysisContext { tab: tab.cloned() };
        let detected = self.engine.analyze(url, &evidence, &context);
        debug!("分析完成：{}，识别技术数：{}", url, detected.len());

        if let Some(tab) = tab {
            self.display(tab, detected.clone()).await;
        }

        self.track(url, &detected).await;
    }

    async fn display(&self, tab: &Tab, detected: Vec<Technology>) {
        if !self.tabs.set_detected(tab.id, detected) {
            debug!("标签页 {} 已关闭，丢弃分析结果", tab.id);
            return;
        }

        if let Err(e) = self.browser.show_page_action(tab.id).await {
            warn!("显示页面按钮失败：标签页 {}，{}", tab.id, e);
        }
    }

    /// 记入主机名缓存（遵守 robots 规则）
    async fn track(&self, url: &Url, detected: &[Technology]) {
        if detected.is_empty() || !self.tracking_enabled().await {
            return;
        }
        let Some(hostname) = url.host_str() else {
            return;
        };

        let host = match url.port() {
            Some(port) => format!("{}:{}", hostname, port),
            None => hostname.to_string(),
        };
        let rules = self
            .hosts
            .robots
            .get_robots_txt(&host, url.scheme() == "https")
            .await;
        if !is_path_allowed(&rules, url.path()) {
            debug!("robots.txt 禁止记录：{}", url);
            return;
        }

        self.hosts.hostnames.record(hostname, detected);

        let threshold = self.config.ping_threshold;
        if self.hosts.hostnames.len() >= threshold || self.hosts.ads.len() >= threshold {
            self.ping().await;
        }
    }

    /// 匿名上报检测结果与广告记录
    ///
    /// 内存中的两个缓存无论是否上报都会清空；追踪关闭时只跳过 POST 与 robots 缓存重置。
    pub async fn ping(&self) {
        let hostname_cache = self.hosts.hostnames.take();
        let ads = self.hosts.ads.take();

        if self.tracking_enabled().await {
            if !hostname_cache.is_empty() {
                self.post(&self.config.ping_url, Value::Object(hostname_cache));
            }
            if !ads.is_empty() {
                self.post(&self.config.ad_log_url, Value::Array(ads));
            }
            self.hosts.robots.clear();
        } else {
            debug!(
                "追踪已关闭，丢弃 {} 条主机名记录与 {} 条广告记录",
                hostname_cache.len(),
                ads.len()
            );
        }

        self.hosts.hostnames.persist(&self.options);
    }

    /// 发送 POST（fire and forget，只记录结果）
    fn post(&self, url: &str, body: Value) {
        let http = Arc::clone(&self.http);
        let url = url.to_string();
        tokio::spawn(async move {
            match http.post_json(&url, &body).await {
                Ok(status) => info!("POST {}: {}", url, status),
                Err(e) => error!("POST {}: {}", url, e),
            }
        });
    }
}
