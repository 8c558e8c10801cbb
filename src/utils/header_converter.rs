//! Header格式转换工具
//! 浏览器 webRequest 给出的是 {name, value | binaryValue} 列表，这里归一化为
//! 小写Header名 -> 按出现顺序排列的值列表

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 浏览器事件中的单个响应Header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpHeader {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub binary_value: Option<Vec<u8>>,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            binary_value: None,
        }
    }

    /// 文本值优先，其次是二进制值，都没有时为空串
    pub fn text_value(&self) -> String {
        match (&self.value, &self.binary_value) {
            (Some(value), _) => value.clone(),
            (None, Some(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
            (None, None) => String::new(),
        }
    }
}

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 归一化Header列表：名称转小写，同名Header的值按顺序累积
    pub fn to_hashmap(headers: &[HttpHeader]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();

        for (index, header) in headers.iter().enumerate() {
            if index >= 1000 {
                warn!("Header迭代超过1000次，强制终止");
                break;
            }

            map.entry(header.name.to_lowercase())
                .or_default()
                .push(header.text_value());
        }

        debug!("Header转换完成，生成{}条记录", map.len());
        map
    }
}
