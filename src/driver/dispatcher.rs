//! 消息分发器：单一入口处理内容脚本与弹窗发来的消息

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::context::DriverContext;
use super::protocol::{AppsSnapshot, Message, MessageSender, Response, TabCache};
use crate::browser::{Tab, TabId};
use crate::engine::Evidence;
use crate::logging;
use crate::storage::keys;

/// 消息分发器
pub struct MessageDispatcher {
    ctx: Arc<DriverContext>,
}

impl MessageDispatcher {
    pub fn new(ctx: Arc<DriverContext>) -> Self {
        Self { ctx }
    }

    /// 传输层入口：异步处理并通过 `respond` 回复，始终返回 true（响应待定）
    pub fn on_message<F>(self: &Arc<Self>, message: Value, sender: MessageSender, respond: F) -> bool
    where
        F: FnOnce(Option<Response>) + Send + 'static,
    {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            let response = dispatcher.handle(message, &sender).await;
            respond(response);
        });
        true
    }

    /// 处理单条消息；无法识别的操作静默忽略
    pub async fn handle(&self, message: Value, sender: &MessageSender) -> Option<Response> {
        let id = message.get("id")?.as_str()?.to_string();
        let source = message
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let message: Message = match serde_json::from_value(message) {
            Ok(message) => message,
            Err(e) => {
                debug!("忽略无法识别的消息：{}，{}", id, e);
                return None;
            }
        };

        if !matches!(message, Message::Log { .. }) {
            info!("Message from {}: {}", source, id);
        }

        match message {
            Message::Log { subject, source, severity } => {
                let text = match subject {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                logging::record(&text, &source, severity);
                None
            }
            Message::Init {} => {
                if let Some(tab) = &sender.tab {
                    self.init(tab).await;
                }
                None
            }
            Message::Analyze { subject } => {
                self.analyze(subject, sender.tab.as_ref()).await;
                None
            }
            Message::AdLog { subject } => {
                self.ctx.hosts.ads.push(subject);
                if self.ctx.hosts.ads.len() >= self.ctx.config.ping_threshold {
                    self.ctx.ping().await;
                }
                None
            }
            Message::GetApps { tab } => Some(Response::Apps(Box::new(self.apps_snapshot(tab.id).await))),
            Message::SetOption { key, value } => {
                self.ctx.options.set(&key, value);
                None
            }
            Message::GetJsPatterns {} => {
                self.ctx.definitions.wait_ready().await;
                Some(Response::JsPatterns {
                    patterns: self.ctx.engine.js_patterns(),
                })
            }
        }
    }

    /// 读取标签页主机的Cookie并分析
    async fn init(&self, tab: &Tab) {
        let Some(url) = parse_tab_url(&tab.url) else {
            return;
        };
        let Some(hostname) = url.host_str() else {
            return;
        };

        let cookies = match self.ctx.browser.cookies(&format!(".{}", hostname)).await {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!("读取Cookie失败：{}，{}", hostname, e);
                return;
            }
        };
        self.ctx
            .analyze(&url, Evidence::from_cookies(&cookies), Some(tab))
            .await;
    }

    /// 分析内容脚本提交的证据，随后持久化主机名缓存
    async fn analyze(&self, evidence: Evidence, tab: Option<&Tab>) {
        let Some(url) = tab.and_then(|tab| parse_tab_url(&tab.url)) else {
            debug!("analyze 消息缺少有效的发送方标签页");
            return;
        };
        self.ctx.analyze(&url, evidence, tab).await;
        self.ctx.hosts.hostnames.persist(&self.ctx.options);
    }

    async fn apps_snapshot(&self, tab_id: TabId) -> AppsSnapshot {
        let definitions = self.ctx.definitions.wait_ready().await;
        let tab_state = self.ctx.tabs.get(tab_id);
        let pinned_category = self.ctx.options.get(keys::PINNED_CATEGORY, Value::Null).await;

        AppsSnapshot {
            tracked_urls: tab_state
                .as_ref()
                .map(|state| state.request_urls.clone())
                .unwrap_or_default(),
            tab_cache: tab_state.map(TabCache::from),
            apps: Value::Object(definitions.apps.clone()),
            categories: serde_json::to_value(&definitions.categories).unwrap_or_else(|_| json!({})),
            category_order: definitions.category_order.clone(),
            pinned_category,
            supported_apps: definitions.supported_apps.clone(),
            incompatible_apps: definitions.incompatible_apps.clone(),
            cat_tooltips: definitions.cat_tooltips.clone(),
            tech_tooltips: definitions.tech_tooltips.clone(),
            convertable_apps: definitions.convertable_apps.clone(),
            html: self.ctx.page_html(),
        }
    }
}

fn parse_tab_url(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!("无法解析标签页URL：{}，{}", raw, e);
            None
        }
    }
}
