//! 启动流程：版本检查、选项预加载、内容脚本注入

use std::cmp::Ordering;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::context::DriverContext;
use crate::storage::keys;

/// 已打开的网页标签页
const WEB_TAB_PATTERNS: [&str; 2] = ["http://*/*", "https://*/*"];

/// 数字段逐段比较（缺失段视为0，非数字段视为0）
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|part| {
                let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let ordering = a.get(i).unwrap_or(&0).cmp(b.get(i).unwrap_or(&0));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// 存储的版本缺失或低于阈值时打开引导页，然后记录当前版本
pub async fn check_version(ctx: &DriverContext, current_version: &str) {
    let stored = ctx.options.get(keys::VERSION, Value::Null).await;
    let needs_onboarding = match stored.as_str() {
        Some(version) => compare_versions(version, &ctx.config.onboarding_below_version) == Ordering::Less,
        None => true,
    };

    if needs_onboarding {
        info!("打开引导页：{}（已存储版本：{}）", ctx.config.onboarding_url, stored);
        if let Err(e) = ctx.browser.open_tab(&ctx.config.onboarding_url, true).await {
            error!("打开引导页失败：{}", e);
        }
    }

    ctx.options.set(keys::VERSION, json!(current_version));
}

/// 预加载启动时需要的选项
pub async fn preload_options(ctx: &DriverContext) {
    let dynamic_icon = ctx.options.get(keys::DYNAMIC_ICON, json!(false)).await;
    ctx.hosts.hostnames.load(&ctx.options).await;
    debug!(
        "选项预加载完成：dynamicIcon={}，hostnameCache 条目数={}",
        dynamic_icon,
        ctx.hosts.hostnames.len()
    );
}

/// 向所有已打开的网页标签页注入内容脚本
pub async fn inject_content_scripts(ctx: &DriverContext) {
    let patterns: Vec<String> = WEB_TAB_PATTERNS.iter().map(|p| p.to_string()).collect();
    let tabs = match ctx.browser.query_tabs(&patterns).await {
        Ok(tabs) => tabs,
        Err(e) => {
            warn!("查询标签页失败：{}", e);
            return;
        }
    };

    for tab in tabs {
        if let Err(e) = ctx.browser.inject_content_script(tab.id).await {
            error!("注入内容脚本失败：标签页 {}，{}", tab.id, e);
        }
    }
}
