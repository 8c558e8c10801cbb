#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use rswappalyzer_driver::browser::{Browser, Cookie, Tab, TabId};
use rswappalyzer_driver::engine::{AnalysisContext, DetectionEngine, Evidence};
use rswappalyzer_driver::error::{DriverError, DriverResult};
use rswappalyzer_driver::net::{HttpClient, HttpResponse};
use rswappalyzer_driver::rule::{DefinitionSet, Technology};

#[derive(Clone)]
struct Route {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

/// 按URL配置响应的HTTP客户端；未配置的URL返回网络错误
#[derive(Default)]
pub struct MockHttp {
    routes: Mutex<HashMap<String, Route>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, Value)>>,
}

impl MockHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, url: &str, status: u16, body: &str) {
        self.route_delayed(url, status, body, None);
    }

    pub fn route_delayed(&self, url: &str, status: u16, body: &str, delay: Option<Duration>) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route {
                status,
                body: body.to_string(),
                delay,
            },
        );
    }

    pub fn get_count(&self, url: &str) -> usize {
        self.gets.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_gets(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn get(&self, url: &str) -> DriverResult<HttpResponse> {
        self.gets.lock().unwrap().push(url.to_string());
        let route = self.routes.lock().unwrap().get(url).cloned();
        let Some(route) = route else {
            return Err(DriverError::InvalidInput(format!("connection refused: {}", url)));
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(HttpResponse::new(route.status, route.body.into_bytes()))
    }

    async fn post_json(&self, url: &str, body: &Value) -> DriverResult<u16> {
        self.posts.lock().unwrap().push((url.to_string(), body.clone()));
        Ok(200)
    }
}

/// 记录调用的浏览器
#[derive(Default)]
pub struct MockBrowser {
    pub tabs: Mutex<Vec<Tab>>,
    pub cookie_jar: Mutex<HashMap<String, Vec<Cookie>>>,
    pub opened: Mutex<Vec<String>>,
    pub page_actions: Mutex<Vec<TabId>>,
    pub injected: Mutex<Vec<TabId>>,
    pub cookie_queries: Mutex<Vec<String>>,
}

impl MockBrowser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_tabs(tabs: Vec<Tab>) -> Arc<Self> {
        let browser = Self::default();
        *browser.tabs.lock().unwrap() = tabs;
        Arc::new(browser)
    }

    pub fn add_cookie(&self, domain: &str, name: &str, value: &str) {
        self.cookie_jar
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_default()
            .push(Cookie {
                name: name.to_string(),
                value: value.to_string(),
                domain: domain.to_string(),
            });
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn query_tabs(&self, url_patterns: &[String]) -> DriverResult<Vec<Tab>> {
        let tabs = self.tabs.lock().unwrap().clone();
        Ok(tabs
            .into_iter()
            .filter(|tab| {
                url_patterns.iter().any(|pattern| match pattern.strip_suffix("*/*") {
                    Some(scheme) => tab.url.starts_with(scheme),
                    None => &tab.url == pattern,
                })
            })
            .collect())
    }

    async fn cookies(&self, domain: &str) -> DriverResult<Vec<Cookie>> {
        self.cookie_queries.lock().unwrap().push(domain.to_string());
        Ok(self.cookie_jar.lock().unwrap().get(domain).cloned().unwrap_or_default())
    }

    async fn open_tab(&self, url: &str, _active: bool) -> DriverResult<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn show_page_action(&self, tab_id: TabId) -> DriverResult<()> {
        self.page_actions.lock().unwrap().push(tab_id);
        Ok(())
    }

    async fn inject_content_script(&self, tab_id: TabId) -> DriverResult<()> {
        self.injected.lock().unwrap().push(tab_id);
        Ok(())
    }
}

/// 一次 analyze 调用的记录
#[derive(Debug, Clone)]
pub struct AnalyzeCall {
    pub url: String,
    pub evidence: Evidence,
    pub tab_id: Option<TabId>,
}

/// 记录调用、返回固定结果的检测引擎
pub struct RecordingEngine {
    pub result: Mutex<Vec<Technology>>,
    pub calls: Mutex<Vec<AnalyzeCall>>,
    pub prepared_apps: Mutex<Option<usize>>,
}

impl RecordingEngine {
    pub fn returning(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(names.iter().map(|n| Technology::from_name(n.to_string())).collect()),
            calls: Mutex::new(Vec::new()),
            prepared_apps: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> Vec<AnalyzeCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl DetectionEngine for RecordingEngine {
    fn prepare(&self, definitions: &DefinitionSet) {
        *self.prepared_apps.lock().unwrap() = Some(definitions.apps.len());
    }

    fn analyze(&self, url: &Url, evidence: &Evidence, context: &AnalysisContext) -> Vec<Technology> {
        self.calls.lock().unwrap().push(AnalyzeCall {
            url: url.to_string(),
            evidence: evidence.clone(),
            tab_id: context.tab.as_ref().map(|tab| tab.id),
        });
        self.result.lock().unwrap().clone()
    }

    fn js_patterns(&self) -> Value {
        json!({"jQuery": {"jQuery.fn.jquery": "([\\d.]+)\\;version:\\1"}})
    }
}

pub fn tab(id: TabId, url: &str) -> Tab {
    Tab {
        id,
        url: url.to_string(),
    }
}

pub const PRIMARY_URL: &str = "https://definitions.test/apps.json";

pub fn primary_document() -> Value {
    json!({
        "apps": {
            "A": {"v": 1, "cats": [1]},
            "Nginx": {"cats": [2], "headers": {"Server": "nginx"}}
        },
        "categories": {
            "1": {"name": "CMS", "priority": 5},
            "2": {"name": "Web servers", "priority": 1}
        }
    })
}

pub fn extended_document() -> Value {
    json!({
        "apps": {"A": {"v": 2}, "B": {"v": 3}},
        "supported": ["A"],
        "incompatible": [],
        "conversionCategoryTooltips": {"1": "CMS tooltip"},
        "technologyTooltips": {"A": "A tooltip"},
        "conversionPatterns": {"B": {}}
    })
}
