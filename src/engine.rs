//! 检测引擎边界
//! 驱动层把引擎当作黑盒：`analyze(url, evidence, context) -> detected[]`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::browser::{Cookie, Tab};
use crate::rule::{DefinitionSet, Technology};

/// 一次分析的证据包（headers / cookies / markup / URL 等）
///
/// 内容脚本发送的字段并不固定，未知字段保存在 `extra` 中原样交给引擎。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub cookies: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Evidence {
    pub fn from_headers(headers: HashMap<String, Vec<String>>) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    pub fn from_cookies(cookies: &[Cookie]) -> Self {
        Self {
            cookies: cookies
                .iter()
                .map(|cookie| (cookie.name.clone(), cookie.value.clone()))
                .collect(),
            ..Self::default()
        }
    }
}

/// 分析上下文
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub tab: Option<Tab>,
}

/// 检测引擎（无状态的同步变换）
pub trait DetectionEngine: Send + Sync {
    /// 定义合并完成后调用一次，编译引擎内部的派生模式
    fn prepare(&self, definitions: &DefinitionSet);

    /// 根据证据识别技术
    fn analyze(&self, url: &Url, evidence: &Evidence, context: &AnalysisContext) -> Vec<Technology>;

    /// 注入页面用的 JS 检测模式
    fn js_patterns(&self) -> Value;
}
