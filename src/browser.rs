//! 浏览器接口边界
//! 标签页查询、Cookie 读取、打开标签页、页面按钮与内容脚本注入

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DriverResult;

/// 浏览器标签页ID（浏览器会话内不复用）
pub type TabId = i64;

/// 标签页
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub url: String,
}

/// Cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub domain: String,
}

/// 浏览器扩展API
#[async_trait]
pub trait Browser: Send + Sync {
    /// 按URL模式查询已打开的标签页
    async fn query_tabs(&self, url_patterns: &[String]) -> DriverResult<Vec<Tab>>;

    /// 读取某个域的全部Cookie（形如 `.example.com`）
    async fn cookies(&self, domain: &str) -> DriverResult<Vec<Cookie>>;

    /// 打开新标签页
    async fn open_tab(&self, url: &str, active: bool) -> DriverResult<()>;

    /// 显示标签页的页面按钮
    async fn show_page_action(&self, tab_id: TabId) -> DriverResult<()>;

    /// 向标签页注入内容脚本
    async fn inject_content_script(&self, tab_id: TabId) -> DriverResult<()>;
}
