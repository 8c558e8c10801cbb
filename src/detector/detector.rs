//! 模式检测引擎：DetectionEngine 的参考实现
//! 整合各类分析器，从证据包输出检测结果
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;
use url::Url;

use super::analyzer::{
    CookieAnalyzer, HeaderAnalyzer, HtmlAnalyzer, MetaAnalyzer, ScriptAnalyzer, UrlAnalyzer,
};
use crate::compiler::{CompiledRuleLibrary, RuleCompiler};
use crate::engine::{AnalysisContext, DetectionEngine, Evidence};
use crate::extractor::HtmlExtractor;
use crate::rule::{DefinitionSet, Technology};
use crate::utils::{DetectedMap, DetectionUpdater};

#[derive(Default)]
struct Prepared {
    compiled_lib: Arc<CompiledRuleLibrary>,
    js_patterns: Value,
}

/// 模式检测引擎
#[derive(Default)]
pub struct PatternEngine {
    prepared: RwLock<Prepared>,
}

impl PatternEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接由定义集构建（已完成 prepare）
    pub fn with_definitions(definitions: &DefinitionSet) -> Self {
        let engine = Self::new();
        engine.prepare(definitions);
        engine
    }

    fn compiled_lib(&self) -> Arc<CompiledRuleLibrary> {
        match self.prepared.read() {
            Ok(prepared) => Arc::clone(&prepared.compiled_lib),
            Err(poisoned) => Arc::clone(&poisoned.into_inner().compiled_lib),
        }
    }
}

impl DetectionEngine for PatternEngine {
    fn prepare(&self, definitions: &DefinitionSet) {
        let prepared = Prepared {
            compiled_lib: Arc::new(RuleCompiler::compile(definitions)),
            js_patterns: RuleCompiler::extract_js_patterns(definitions),
        };
        match self.prepared.write() {
            Ok(mut slot) => *slot = prepared,
            Err(poisoned) => *poisoned.into_inner() = prepared,
        }
    }

    fn analyze(&self, url: &Url, evidence: &Evidence, _context: &AnalysisContext) -> Vec<Technology> {
        let compiled_lib = self.compiled_lib();
        let mut detected = DetectedMap::new();

        UrlAnalyzer::analyze(&compiled_lib, url.as_str(), &mut detected);
        HeaderAnalyzer::analyze(&compiled_lib, &evidence.headers, &mut detected);
        CookieAnalyzer::analyze(&compiled_lib, &evidence.cookies, &mut detected);
        ScriptAnalyzer::analyze(&compiled_lib, &evidence.scripts, &mut detected);

        if let Some(html) = &evidence.html {
            HtmlAnalyzer::analyze(&compiled_lib, html, &mut detected);
            let signals = HtmlExtractor::extract(html);
            ScriptAnalyzer::analyze(&compiled_lib, &signals.script_srcs, &mut detected);
            MetaAnalyzer::analyze(&compiled_lib, &signals.meta_tags, &mut detected);
        }

        // 应用关联推导规则
        DetectionUpdater::apply_implies(&compiled_lib, &mut detected);

        let mut technologies: Vec<Technology> = detected
            .into_iter()
            .map(|(name, (confidence, version))| {
                let tech = compiled_lib.tech_patterns.get(&name);
                Technology {
                    categories: tech.map(|t| t.category_ids.clone()).unwrap_or_default(),
                    website: tech.and_then(|t| t.website.clone()),
                    icon: tech.and_then(|t| t.icon.clone()),
                    name,
                    confidence,
                    version,
                }
            })
            .collect();
        technologies.sort_by(|a, b| a.name.cmp(&b.name));

        debug!("检测完成：{}，识别技术数：{}", url, technologies.len());
        technologies
    }

    fn js_patterns(&self) -> Value {
        match self.prepared.read() {
            Ok(prepared) => prepared.js_patterns.clone(),
            Err(poisoned) => poisoned.into_inner().js_patterns.clone(),
        }
    }
}
