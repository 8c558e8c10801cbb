//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;
use std::time::Duration;

/// 资源位置：远程URL或扩展包内的本地文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    Remote(String),
    Local(PathBuf),
}

impl ResourceLocation {
    /// 用于日志输出的描述
    pub fn describe(&self) -> String {
        match self {
            ResourceLocation::Remote(url) => url.clone(),
            ResourceLocation::Local(path) => path.display().to_string(),
        }
    }
}

/// 驱动配置
#[derive(Debug, Clone)]
pub struct DriverConfig {
    // 主定义源（始终拉取最新）
    pub primary_definitions_url: String,
    // 主定义源失败时的内置副本
    pub fallback_definitions: ResourceLocation,
    // 扩展元数据（extended_apps.json）
    pub extended_definitions: ResourceLocation,
    // robots.txt 拉取超时
    pub robots_timeout: Duration,
    // 通用HTTP超时（单位：秒）
    pub http_timeout: u64,
    // 遥测上报地址
    pub ping_url: String,
    pub ad_log_url: String,
    // 主机名缓存/广告缓存达到该数量时触发上报
    pub ping_threshold: usize,
    // 新用户/旧版本升级时打开的引导页
    pub onboarding_url: String,
    pub onboarding_below_version: String,
    pub user_agent: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            primary_definitions_url:
                "https://raw.githubusercontent.com/AliasIO/Wappalyzer/master/src/apps.json".to_string(),
            fallback_definitions: ResourceLocation::Local(PathBuf::from("apps.json")),
            extended_definitions: ResourceLocation::Local(PathBuf::from("extended_apps.json")),
            robots_timeout: Duration::from_millis(3000),
            http_timeout: 30,
            ping_url: "https://api.wappalyzer.com/ping/v1/".to_string(),
            ad_log_url: "https://ad.wappalyzer.com/log/wp/".to_string(),
            ping_threshold: 50,
            onboarding_url: "https://github.com/ampproject/amp-readiness/wiki/AMP-Readiness-4.0".to_string(),
            onboarding_below_version: "4.0".to_string(),
            user_agent: "Rswappalyzer-Driver/0.1.0".to_string(),
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> DriverConfig {
        DriverConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: DriverConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary_definitions_url(mut self, url: impl Into<String>) -> Self {
        self.config.primary_definitions_url = url.into();
        self
    }

    pub fn fallback_definitions(mut self, location: ResourceLocation) -> Self {
        self.config.fallback_definitions = location;
        self
    }

    pub fn extended_definitions(mut self, location: ResourceLocation) -> Self {
        self.config.extended_definitions = location;
        self
    }

    pub fn robots_timeout(mut self, timeout: Duration) -> Self {
        self.config.robots_timeout = timeout;
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn ping_url(mut self, url: impl Into<String>) -> Self {
        self.config.ping_url = url.into();
        self
    }

    pub fn ad_log_url(mut self, url: impl Into<String>) -> Self {
        self.config.ad_log_url = url.into();
        self
    }

    pub fn ping_threshold(mut self, threshold: usize) -> Self {
        self.config.ping_threshold = threshold;
        self
    }

    pub fn onboarding_url(mut self, url: impl Into<String>) -> Self {
        self.config.onboarding_url = url.into();
        self
    }

    pub fn onboarding_below_version(mut self, version: impl Into<String>) -> Self {
        self.config.onboarding_below_version = version.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> DriverConfig {
        self.config
    }
}
