//! 内部消息协议：按 `id` 区分的操作及其响应

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::{Tab, TabId};
use crate::engine::Evidence;
use crate::logging::Severity;
use crate::rule::Technology;
use crate::tabs::TabState;

/// 入站消息
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "id", rename_all = "snake_case")]
pub enum Message {
    Log {
        #[serde(default)]
        subject: Value,
        #[serde(default)]
        source: String,
        #[serde(default)]
        severity: Severity,
    },
    Init {},
    Analyze {
        #[serde(default)]
        subject: Evidence,
    },
    AdLog {
        #[serde(default)]
        subject: Value,
    },
    GetApps {
        tab: TabRef,
    },
    SetOption {
        key: String,
        #[serde(default)]
        value: Value,
    },
    GetJsPatterns {},
}

/// `get_apps` 的目标标签页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TabRef {
    pub id: TabId,
}

/// 发送方（内容脚本所在标签页；弹窗等无标签页）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSender {
    #[serde(default)]
    pub tab: Option<Tab>,
}

impl MessageSender {
    pub fn from_tab(tab: Tab) -> Self {
        Self { tab: Some(tab) }
    }
}

/// `get_apps` 的界面快照
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppsSnapshot {
    pub tab_cache: Option<TabCache>,
    pub apps: Value,
    pub categories: Value,
    pub category_order: Option<Vec<u32>>,
    pub pinned_category: Value,
    #[serde(rename = "supported_apps")]
    pub supported_apps: Option<Value>,
    #[serde(rename = "incompatible_apps")]
    pub incompatible_apps: Option<Value>,
    #[serde(rename = "cat_tooltips")]
    pub cat_tooltips: Option<Value>,
    #[serde(rename = "tech_tooltips")]
    pub tech_tooltips: Option<Value>,
    #[serde(rename = "convertable_apps")]
    pub convertable_apps: Option<Value>,
    #[serde(rename = "tracked_urls")]
    pub tracked_urls: Vec<String>,
    pub html: Option<String>,
}

/// 标签页的检测缓存
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabCache {
    pub detected: Vec<Technology>,
}

impl From<TabState> for TabCache {
    fn from(state: TabState) -> Self {
        Self {
            detected: state.detected_technologies,
        }
    }
}

/// 出站响应（每条消息至多一个）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Apps(Box<AppsSnapshot>),
    JsPatterns { patterns: Value },
}

impl Response {
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
