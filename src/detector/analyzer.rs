//! 检测分析器：负责URL/Header/Cookie/HTML等证据的匹配
use std::collections::HashMap;

use tracing::debug;

use crate::compiler::{CompiledPattern, CompiledRuleLibrary};
use crate::utils::{DetectedMap, DetectionUpdater};

/// 用一组模式匹配输入，命中即记录
fn match_patterns(tech_name: &str, patterns: &[CompiledPattern], input: &str, detected: &mut DetectedMap) -> bool {
    let mut matched = false;
    for pattern in patterns {
        if let Some(captures) = pattern.regex.captures(input) {
            let version = pattern.version(&captures);
            DetectionUpdater::update(detected, tech_name, pattern.confidence, version);
            matched = true;
        }
    }
    matched
}

/// URL分析器
pub struct UrlAnalyzer;

impl UrlAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, url: &str, detected: &mut DetectedMap) {
        for (name, tech) in &compiled_lib.tech_patterns {
            if match_patterns(name, &tech.url_patterns, url, detected) {
                debug!("URL匹配成功：技术={}，URL={}", name, url);
            }
        }
    }
}

/// Header分析器（同名Header的每个值都参与匹配）
pub struct HeaderAnalyzer;

impl HeaderAnalyzer {
    pub fn analyze(
        compiled_lib: &CompiledRuleLibrary,
        headers: &HashMap<String, Vec<String>>,
        detected: &mut DetectedMap,
    ) {
        KeyedAnalyzer::analyze(compiled_lib, headers, detected, |tech| &tech.header_patterns, "Header");
    }
}

/// Cookie分析器
pub struct CookieAnalyzer;

impl CookieAnalyzer {
    pub fn analyze(
        compiled_lib: &CompiledRuleLibrary,
        cookies: &HashMap<String, String>,
        detected: &mut DetectedMap,
    ) {
        let cookies: HashMap<String, Vec<String>> = cookies
            .iter()
            .map(|(name, value)| (name.to_lowercase(), vec![value.clone()]))
            .collect();
        KeyedAnalyzer::analyze(compiled_lib, &cookies, detected, |tech| &tech.cookie_patterns, "Cookie");
    }
}

/// Meta分析器
pub struct MetaAnalyzer;

impl MetaAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, meta_tags: &[(String, String)], detected: &mut DetectedMap) {
        let mut metas: HashMap<String, Vec<String>> = HashMap::new();
        for (name, content) in meta_tags {
            metas.entry(name.to_lowercase()).or_default().push(content.clone());
        }
        KeyedAnalyzer::analyze(compiled_lib, &metas, detected, |tech| &tech.meta_patterns, "Meta");
    }
}

/// HTML分析器
pub struct HtmlAnalyzer;

impl HtmlAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, html: &str, detected: &mut DetectedMap) {
        for (name, tech) in &compiled_lib.tech_patterns {
            match_patterns(name, &tech.html_patterns, html, detected);
        }
    }
}

/// Script分析器（script-src）
pub struct ScriptAnalyzer;

impl ScriptAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, script_srcs: &[String], detected: &mut DetectedMap) {
        for src in script_srcs {
            for (name, tech) in &compiled_lib.tech_patterns {
                match_patterns(name, &tech.script_patterns, src, detected);
            }
        }
    }
}

/// 键值型证据的通用匹配
struct KeyedAnalyzer;

impl KeyedAnalyzer {
    fn analyze<F>(
        compiled_lib: &CompiledRuleLibrary,
        values: &HashMap<String, Vec<String>>,
        detected: &mut DetectedMap,
        select: F,
        kind: &str,
    ) where
        F: Fn(&crate::compiler::CompiledTechRule) -> &HashMap<String, Vec<CompiledPattern>>,
    {
        if values.is_empty() {
            return;
        }

        for (name, tech) in &compiled_lib.tech_patterns {
            for (key, patterns) in select(tech) {
                let Some(inputs) = values.get(key) else {
                    continue;
                };
                for input in inputs {
                    if match_patterns(name, patterns, input, detected) {
                        debug!("{}匹配成功：技术={}，键={}", kind, name, key);
                    }
                }
            }
        }
    }
}
