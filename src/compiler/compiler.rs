//! 规则编译器核心
//! 把合并后的 `apps` 定义编译为可执行的正则模式；单条模式编译失败只跳过该模式

use std::collections::HashMap;
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::debug;

use super::pattern::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule, ImpliedTech};
use crate::rule::DefinitionSet;

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译定义集
    pub fn compile(definitions: &DefinitionSet) -> CompiledRuleLibrary {
        let start = Instant::now();
        let mut stats = CompileStats::default();

        let tech_patterns: HashMap<String, CompiledTechRule> = definitions
            .apps
            .iter()
            .map(|(name, app)| (name.clone(), Self::compile_tech_rule(name, app, &mut stats)))
            .collect();

        debug!("规则编译完成，总耗时{:?}，技术数：{}", start.elapsed(), tech_patterns.len());
        debug!(
            "编译统计：URL模式{}条、HTML模式{}条、Script模式{}条、Header模式{}条、Cookie模式{}条、Meta模式{}条、跳过{}条",
            stats.url_count,
            stats.html_count,
            stats.script_count,
            stats.header_count,
            stats.cookie_count,
            stats.meta_count,
            stats.skipped
        );

        CompiledRuleLibrary { tech_patterns }
    }

    /// 提取 JS 检测模式（app -> js 定义），原样交给内容脚本
    pub fn extract_js_patterns(definitions: &DefinitionSet) -> Value {
        let patterns: Map<String, Value> = definitions
            .apps
            .iter()
            .filter_map(|(name, app)| app.get("js").map(|js| (name.clone(), js.clone())))
            .collect();
        Value::Object(patterns)
    }

    /// 编译单个技术规则
    fn compile_tech_rule(name: &str, app: &Value, stats: &mut CompileStats) -> CompiledTechRule {
        let url_patterns = Self::compile_pattern_list(app.get("url"), stats);
        stats.url_count += url_patterns.len();
        let html_patterns = Self::compile_pattern_list(app.get("html"), stats);
        stats.html_count += html_patterns.len();
        let script_patterns = Self::compile_pattern_list(app.get("script"), stats);
        stats.script_count += script_patterns.len();

        let header_patterns = Self::compile_keyed_patterns(app.get("headers"), stats);
        stats.header_count += header_patterns.values().map(Vec::len).sum::<usize>();
        let cookie_patterns = Self::compile_keyed_patterns(app.get("cookies"), stats);
        stats.cookie_count += cookie_patterns.values().map(Vec::len).sum::<usize>();
        let meta_patterns = Self::compile_keyed_patterns(app.get("meta"), stats);
        stats.meta_count += meta_patterns.values().map(Vec::len).sum::<usize>();

        let category_ids = app
            .get("cats")
            .and_then(Value::as_array)
            .map(|cats| {
                cats.iter()
                    .filter_map(|cat| match cat {
                        Value::Number(n) => n.as_u64().map(|n| n as u32),
                        Value::String(s) => s.parse().ok(),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        CompiledTechRule {
            name: name.to_string(),
            url_patterns,
            html_patterns,
            script_patterns,
            header_patterns,
            cookie_patterns,
            meta_patterns,
            implies: Self::parse_implies(app.get("implies")),
            category_ids,
            website: app.get("website").and_then(Value::as_str).map(str::to_string),
            icon: app.get("icon").and_then(Value::as_str).map(str::to_string),
        }
    }

    /// 编译列表型模式（字符串或字符串数组）
    fn compile_pattern_list(value: Option<&Value>, stats: &mut CompileStats) -> Vec<CompiledPattern> {
        string_list(value)
            .into_iter()
            .filter_map(|raw| match CompiledPattern::parse(raw) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    stats.skipped += 1;
                    debug!("模式编译失败，已跳过：{}，{}", raw, e);
                    None
                }
            })
            .collect()
    }

    /// 编译键值对型模式（headers/cookies/meta），键统一小写
    fn compile_keyed_patterns(
        value: Option<&Value>,
        stats: &mut CompileStats,
    ) -> HashMap<String, Vec<CompiledPattern>> {
        let Some(Value::Object(map)) = value else {
            return HashMap::new();
        };

        map.iter()
            .filter_map(|(key, val)| {
                let patterns = Self::compile_pattern_list(Some(val), stats);
                (!patterns.is_empty()).then(|| (key.to_lowercase(), patterns))
            })
            .collect()
    }

    /// 解析 implies（支持 `Name\;confidence:50`）
    fn parse_implies(value: Option<&Value>) -> Vec<ImpliedTech> {
        string_list(value)
            .into_iter()
            .filter_map(|raw| {
                let mut parts = raw.split("\\;");
                let name = parts.next()?.trim();
                if name.is_empty() {
                    return None;
                }
                let confidence = parts
                    .filter_map(|tag| tag.strip_prefix("confidence:"))
                    .find_map(|value| value.trim().parse::<u8>().ok())
                    .unwrap_or(100);
                Some(ImpliedTech {
                    name: name.to_string(),
                    confidence,
                })
            })
            .collect()
    }
}

/// 字符串或字符串数组 -> 字符串列表
fn string_list(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
struct CompileStats {
    url_count: usize,
    html_count: usize,
    script_count: usize,
    header_count: usize,
    cookie_count: usize,
    meta_count: usize,
    skipped: usize,
}
