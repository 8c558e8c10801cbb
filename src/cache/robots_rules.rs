//! robots.txt 规则解析
//! 只保留适用于 `*` 与 `wappalyzer` 两个 User-Agent 分组的 Allow/Disallow 指令

use serde::{Deserialize, Serialize};

/// 单条 robots 指令
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "directive", content = "path", rename_all = "lowercase")]
pub enum RobotsRule {
    Allow(String),
    Disallow(String),
}

impl RobotsRule {
    fn path(&self) -> &str {
        match self {
            RobotsRule::Allow(path) | RobotsRule::Disallow(path) => path,
        }
    }
}

const OWN_AGENTS: [&str; 2] = ["*", "wappalyzer"];

/// 解析 robots.txt 正文
pub fn parse_robots_txt(body: &str) -> Vec<RobotsRule> {
    let mut rules = Vec::new();
    // 当前分组的 User-Agent 列表；遇到指令行后分组闭合
    let mut group_agents: Vec<String> = Vec::new();
    let mut group_closed = false;

    for raw_line in body.lines() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "user-agent" => {
                if group_closed {
                    group_agents.clear();
                    group_closed = false;
                }
                group_agents.push(value.to_ascii_lowercase());
            }
            directive @ ("allow" | "disallow") => {
                group_closed = true;
                let applies = group_agents
                    .iter()
                    .any(|agent| OWN_AGENTS.contains(&agent.as_str()));
                // 空 Disallow 表示不限制
                if !applies || value.is_empty() {
                    continue;
                }
                rules.push(if directive == "allow" {
                    RobotsRule::Allow(value.to_string())
                } else {
                    RobotsRule::Disallow(value.to_string())
                });
            }
            _ => {}
        }
    }

    rules
}

/// 判断路径是否允许访问：最长前缀匹配，长度相同时 Allow 优先
pub fn is_path_allowed(rules: &[RobotsRule], path: &str) -> bool {
    let mut best: Option<&RobotsRule> = None;

    for rule in rules.iter().filter(|rule| path.starts_with(rule.path())) {
        best = match best {
            None => Some(rule),
            Some(current) if rule.path().len() > current.path().len() => Some(rule),
            Some(current)
                if rule.path().len() == current.path().len()
                    && matches!(rule, RobotsRule::Allow(_)) =>
            {
                Some(rule)
            }
            keep => keep,
        };
    }

    !matches!(best, Some(RobotsRule::Disallow(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROBOTS: &str = "\
# comment line
User-agent: Googlebot
Disallow: /google-only

User-agent: *
User-Agent: Wappalyzer
Disallow: /private   # trailing comment
Allow: /private/public
Disallow:

User-agent: bingbot
Disallow: /bing-only
";

    #[test]
    fn test_parse_keeps_only_own_groups() {
        assert_eq!(
            parse_robots_txt(ROBOTS),
            vec![
                RobotsRule::Disallow("/private".into()),
                RobotsRule::Allow("/private/public".into()),
            ]
        );
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_robots_txt("").is_empty());
        assert!(parse_robots_txt("<html>not robots</html>").is_empty());
    }

    #[test]
    fn test_path_allowed_longest_match() {
        let rules = parse_robots_txt(ROBOTS);
        assert!(is_path_allowed(&rules, "/"));
        assert!(!is_path_allowed(&rules, "/private/keys"));
        assert!(is_path_allowed(&rules, "/private/public/index.html"));
        assert!(is_path_allowed(&rules, "/google-only"));
        assert!(is_path_allowed(&[], "/anything"));
    }

    #[test]
    fn test_allow_wins_tie() {
        let rules = vec![
            RobotsRule::Disallow("/shop".into()),
            RobotsRule::Allow("/shop".into()),
        ];
        assert!(is_path_allowed(&rules, "/shop/cart"));
    }

    #[test]
    fn test_rule_serialization_shape() {
        let json = serde_json::to_value(RobotsRule::Disallow("/admin".into())).unwrap();
        assert_eq!(json, serde_json::json!({"directive": "disallow", "path": "/admin"}));
    }
}
