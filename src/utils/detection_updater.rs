//! 检测结果更新工具
//! 负责更新检测结果（叠加置信度、保留版本）

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::compiler::CompiledRuleLibrary;

/// 检测中间结果：技术名 -> (置信度, 版本)
pub type DetectedMap = HashMap<String, (u8, Option<String>)>;

/// 检测结果更新工具
pub struct DetectionUpdater;

impl DetectionUpdater {
    /// 更新检测结果
    pub fn update(
        detected: &mut DetectedMap,
        tech_name: &str,
        confidence: u8,
        version: Option<String>,
    ) {
        match detected.entry(tech_name.to_string()) {
            Entry::Occupied(mut entry) => {
                let (existing_conf, existing_version) = entry.get_mut();
                *existing_conf = existing_conf.saturating_add(confidence).min(100);

                if existing_version.is_none() {
                    *existing_version = version;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert((confidence.min(100), version));
            }
        }
    }

    /// 应用关联推导规则（implies），直到不再产生新技术
    pub fn apply_implies(compiled_lib: &CompiledRuleLibrary, detected: &mut DetectedMap) {
        loop {
            let mut implied_techs = Vec::new();

            for tech_name in detected.keys() {
                let Some(tech) = compiled_lib.tech_patterns.get(tech_name) else {
                    continue;
                };
                for implied in &tech.implies {
                    if !detected.contains_key(&implied.name) {
                        implied_techs.push((implied.name.clone(), implied.confidence));
                    }
                }
            }

            if implied_techs.is_empty() {
                break;
            }

            // 添加隐含技术
            for (implied, confidence) in implied_techs {
                detected.entry(implied).or_insert((confidence, None));
            }
        }
    }
}
