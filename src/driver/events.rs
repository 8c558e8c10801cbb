//! 浏览器事件关联：请求URL累积、响应头触发分析、标签页关闭

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::context::DriverContext;
use crate::browser::TabId;
use crate::engine::Evidence;
use crate::utils::{HeaderConverter, HttpHeader};

// HTML 家族的 MIME（含 xhtml）
static HTML_CONTENT_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/x?html").expect("静态正则"));

/// 请求开始事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub tab_id: TabId,
    pub url: String,
}

/// 请求完成事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRequest {
    pub url: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub response_headers: Option<Vec<HttpHeader>>,
}

impl CompletedRequest {
    /// 是否为 http/https 的顶层文档请求
    fn is_main_frame(&self) -> bool {
        self.resource_type == "main_frame"
            && (self.url.starts_with("http://") || self.url.starts_with("https://"))
    }
}

/// 事件关联器
pub struct EventCorrelator {
    ctx: Arc<DriverContext>,
}

impl EventCorrelator {
    pub fn new(ctx: Arc<DriverContext>) -> Self {
        Self { ctx }
    }

    /// 记录请求URL；没有归属标签页的请求（tabId < 0）不记录
    pub fn on_before_request(&self, details: &RequestDetails) {
        if details.tab_id < 0 {
            return;
        }
        self.ctx.tabs.record_request(details.tab_id, &details.url);
    }

    /// 顶层文档响应完成：content-type 属于 HTML 家族时用响应头触发分析
    pub async fn on_completed(&self, request: &CompletedRequest) {
        if !request.is_main_frame() {
            return;
        }
        let Some(raw_headers) = &request.response_headers else {
            return;
        };

        let tabs = match self.ctx.browser.query_tabs(&[request.url.clone()]).await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("查询标签页失败：{}，{}", request.url, e);
                return;
            }
        };
        let Some(tab) = tabs.into_iter().next() else {
            debug!("未找到请求所属标签页：{}", request.url);
            return;
        };

        let headers = HeaderConverter::to_hashmap(raw_headers);
        let is_html = headers
            .get("content-type")
            .is_some_and(|values| values.iter().any(|v| HTML_CONTENT_TYPE.is_match(v)));
        if !is_html {
            return;
        }

        let url = match Url::parse(&request.url) {
            Ok(url) => url,
            Err(e) => {
                warn!("无法解析请求URL：{}，{}", request.url, e);
                return;
            }
        };

        self.ctx
            .analyze(&url, Evidence::from_headers(headers), Some(&tab))
            .await;
    }

    /// 标签页关闭
    pub fn on_tab_removed(&self, tab_id: TabId) {
        self.ctx.tabs.remove(tab_id);
    }
}
