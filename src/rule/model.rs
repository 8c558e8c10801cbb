//! 技术定义数据模型
//! 主定义（apps.json）与扩展定义（extended_apps.json）的结构，以及合并后的定义集

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 技术检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub confidence: u8,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub categories: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Technology {
    /// 从名称快速创建（默认值）
    pub fn from_name(name: String) -> Self {
        Self {
            name,
            confidence: 50,
            version: None,
            categories: Vec::new(),
            website: None,
            icon: None,
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) if !v.is_empty() => write!(f, "{} {}", self.name, v),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// 分类定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub priority: i64,
    // 其余字段原样保留，交给界面使用
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 主定义文档（apps.json）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefinitionDocument {
    #[serde(default)]
    pub apps: Map<String, Value>,
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
}

/// 扩展定义文档（extended_apps.json）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtendedDocument {
    #[serde(default)]
    pub apps: Map<String, Value>,
    #[serde(default)]
    pub supported: Option<Value>,
    #[serde(default)]
    pub incompatible: Option<Value>,
    #[serde(default, rename = "conversionCategoryTooltips")]
    pub conversion_category_tooltips: Option<Value>,
    #[serde(default, rename = "technologyTooltips")]
    pub technology_tooltips: Option<Value>,
    #[serde(default, rename = "conversionPatterns")]
    pub conversion_patterns: Option<Value>,
}

/// 合并后的定义集（进程级，只构建一次）
///
/// 扩展定义加载失败时，`apps`/`categories` 仍来自主定义，
/// 而 `category_order` 及所有扩展专属字段保持 `None`，使用方按"无数据"处理。
#[derive(Debug, Clone, Default, Serialize)]
pub struct DefinitionSet {
    pub apps: Map<String, Value>,
    pub categories: BTreeMap<String, Category>,
    pub category_order: Option<Vec<u32>>,
    pub supported_apps: Option<Value>,
    pub incompatible_apps: Option<Value>,
    pub cat_tooltips: Option<Value>,
    pub tech_tooltips: Option<Value>,
    pub convertable_apps: Option<Value>,
}

impl DefinitionSet {
    pub fn from_primary(document: DefinitionDocument) -> Self {
        Self {
            apps: document.apps,
            categories: document.categories,
            ..Self::default()
        }
    }

    /// 合并扩展定义：键冲突时扩展条目覆盖主定义，随后计算分类顺序
    pub fn merge_extended(&mut self, extended: ExtendedDocument) {
        self.apps.extend(extended.apps);
        self.category_order = Some(Self::compute_category_order(&self.categories));
        self.supported_apps = extended.supported;
        self.incompatible_apps = extended.incompatible;
        self.cat_tooltips = extended.conversion_category_tooltips;
        self.tech_tooltips = extended.technology_tooltips;
        self.convertable_apps = extended.conversion_patterns;
    }

    /// 分类ID按优先级升序排列（优先级相同时按ID）；非数字ID忽略
    pub fn compute_category_order(categories: &BTreeMap<String, Category>) -> Vec<u32> {
        let mut order: Vec<(i64, u32)> = categories
            .iter()
            .filter_map(|(id, category)| id.parse::<u32>().ok().map(|id| (category.priority, id)))
            .collect();
        order.sort_unstable();
        order.into_iter().map(|(_, id)| id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn category(priority: i64) -> Category {
        Category {
            name: format!("cat-{}", priority),
            priority,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_extended_apps_override_primary() {
        let primary: DefinitionDocument =
            serde_json::from_value(json!({"apps": {"A": {"v": 1}}, "categories": {}})).unwrap();
        let extended: ExtendedDocument =
            serde_json::from_value(json!({"apps": {"A": {"v": 2}, "B": {"v": 3}}})).unwrap();

        let mut set = DefinitionSet::from_primary(primary);
        set.merge_extended(extended);

        assert_eq!(set.apps["A"]["v"], json!(2));
        assert!(set.apps.contains_key("B"));
        assert!(set.category_order.is_some());
    }

    #[test]
    fn test_category_order_by_priority() {
        let mut categories = BTreeMap::new();
        categories.insert("1".to_string(), category(5));
        categories.insert("2".to_string(), category(1));
        assert_eq!(DefinitionSet::compute_category_order(&categories), vec![2, 1]);
    }

    #[test]
    fn test_category_order_ties_and_bad_ids() {
        let mut categories = BTreeMap::new();
        categories.insert("10".to_string(), category(3));
        categories.insert("4".to_string(), category(3));
        categories.insert("oops".to_string(), category(0));
        assert_eq!(DefinitionSet::compute_category_order(&categories), vec![4, 10]);
    }

    #[test]
    fn test_primary_only_leaves_extended_fields_unset() {
        let set = DefinitionSet::from_primary(DefinitionDocument::default());
        assert!(set.category_order.is_none());
        assert!(set.convertable_apps.is_none());
    }

    #[test]
    fn test_category_keeps_unknown_fields() {
        let cat: Category =
            serde_json::from_value(json!({"name": "CMS", "priority": 1, "icon": "cms.svg"})).unwrap();
        assert_eq!(cat.extra["icon"], json!("cms.svg"));
    }
}
