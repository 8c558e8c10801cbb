//! 编译后模式模型
//! Wappalyzer 模式串形如 `regex\;version:\1\;confidence:50`

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexBuilder};

use crate::error::DriverResult;

/// 版本模板中的三元表达式：`\1?present:absent`
static TERNARY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(\d+)\?([^:]*):(.*)$").expect("静态正则")
});

/// 环视语法（regex crate 不支持，编译前移除）
static LOOK_AROUND_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\?<?[=!][^)]*\)").expect("静态正则")
});

/// 编译后的单个模式
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub confidence: u8,
    pub version_template: Option<String>,
}

impl CompiledPattern {
    /// 解析并编译模式串（忽略大小写）
    pub fn parse(raw: &str) -> DriverResult<Self> {
        let mut parts = raw.split("\\;");
        let expression = parts.next().unwrap_or_default();

        let mut confidence = 100u8;
        let mut version_template = None;
        for tag in parts {
            match tag.split_once(':') {
                Some(("confidence", value)) => {
                    confidence = value.trim().parse::<u8>().unwrap_or(100).min(100);
                }
                Some(("version", value)) => version_template = Some(value.to_string()),
                _ => {}
            }
        }

        let expression = LOOK_AROUND_REGEX.replace_all(expression, "");
        let regex = RegexBuilder::new(&expression)
            .case_insensitive(true)
            .size_limit(1 << 20)
            .build()?;

        Ok(Self {
            regex,
            confidence,
            version_template,
        })
    }

    /// 根据版本模板从捕获组中解析版本号
    pub fn version(&self, captures: &Captures) -> Option<String> {
        let template = self.version_template.as_deref()?.trim();
        if template.is_empty() {
            return None;
        }

        let group = |index: usize| captures.get(index).map(|m| m.as_str()).filter(|s| !s.is_empty());

        // 先求值三元表达式
        let mut version = match TERNARY_REGEX.captures(template) {
            Some(ternary) => {
                let index = ternary[1].parse::<usize>().unwrap_or(0);
                let prefix = &template[..ternary.get(0).map_or(0, |m| m.start())];
                let branch = if group(index).is_some() { &ternary[2] } else { &ternary[3] };
                format!("{}{}", prefix, branch)
            }
            None => template.to_string(),
        };

        for index in (1..captures.len()).rev() {
            version = version.replace(&format!("\\{}", index), group(index).unwrap_or(""));
        }

        let version = version.trim().to_string();
        if version.is_empty() || version.contains('\\') {
            None
        } else {
            Some(version)
        }
    }
}

/// 关联推导（implies）条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpliedTech {
    pub name: String,
    pub confidence: u8,
}

/// 单个技术编译后的规则
#[derive(Debug, Clone, Default)]
pub struct CompiledTechRule {
    pub name: String,
    pub url_patterns: Vec<CompiledPattern>,
    pub html_patterns: Vec<CompiledPattern>,
    pub script_patterns: Vec<CompiledPattern>,
    pub header_patterns: HashMap<String, Vec<CompiledPattern>>,
    pub cookie_patterns: HashMap<String, Vec<CompiledPattern>>,
    pub meta_patterns: HashMap<String, Vec<CompiledPattern>>,
    pub implies: Vec<ImpliedTech>,
    pub category_ids: Vec<u32>,
    pub website: Option<String>,
    pub icon: Option<String>,
}

/// 编译后的规则库
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleLibrary {
    pub tech_patterns: HashMap<String, CompiledTechRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let pattern = CompiledPattern::parse(r"nginx(?:/([\d.]+))?\;version:\1\;confidence:50").unwrap();
        assert_eq!(pattern.confidence, 50);
        assert_eq!(pattern.version_template.as_deref(), Some(r"\1"));

        let captures = pattern.regex.captures("NGINX/1.25.3").unwrap();
        assert_eq!(pattern.version(&captures), Some("1.25.3".to_string()));
    }

    #[test]
    fn test_missing_group_yields_no_version() {
        let pattern = CompiledPattern::parse(r"nginx(?:/([\d.]+))?\;version:\1").unwrap();
        let captures = pattern.regex.captures("nginx").unwrap();
        assert_eq!(pattern.version(&captures), None);
    }

    #[test]
    fn test_ternary_template() {
        let pattern = CompiledPattern::parse(r"shop(pro)?\;version:\1?Pro:Basic").unwrap();
        let with_group = pattern.regex.captures("shoppro").unwrap();
        let without_group = pattern.regex.captures("shop").unwrap();
        assert_eq!(pattern.version(&with_group), Some("Pro".to_string()));
        assert_eq!(pattern.version(&without_group), Some("Basic".to_string()));
    }

    #[test]
    fn test_lookaround_removed() {
        let pattern = CompiledPattern::parse(r"jquery(?!-ui)\.js").unwrap();
        assert!(pattern.regex.is_match("/static/jquery.js"));
    }

    #[test]
    fn test_invalid_regex_is_error() {
        assert!(CompiledPattern::parse(r"([unclosed").is_err());
    }
}
