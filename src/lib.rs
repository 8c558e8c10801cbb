//! rswappalyzer-driver - Wappalyzer 浏览器扩展的后台协调层
//! 选项存储、主机缓存（robots.txt 单飞拉取）、标签页状态、定义加载、事件关联与消息分发

// 导出全局错误类型
pub use self::error::{DriverError, DriverResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, DriverConfig, ResourceLocation};

// 导出存储与缓存
pub use self::storage::{JsonFileStore, KeyValueStore, MemoryStore, OptionStore};
pub use self::cache::{HostCacheSet, RobotsRule, RobotsTxtCache};
pub use self::tabs::{TabState, TabStateTable};

// 导出规则模块核心接口
pub use self::rule::{DefinitionLoader, DefinitionSet, DefinitionsHandle, Technology};

// 导出协作方接口
pub use self::browser::{Browser, Cookie, Tab, TabId};
pub use self::engine::{AnalysisContext, DetectionEngine, Evidence};
pub use self::net::{HttpClient, HttpResponse, ReqwestClient};
pub use self::detector::PatternEngine;

// 导出驱动
pub use self::driver::{Driver, DriverContext, EventCorrelator, MessageDispatcher, MessageSender, Response};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod net;
pub mod cache;
pub mod tabs;
pub mod rule;
pub mod browser;
pub mod engine;
pub mod extractor;
pub mod utils;
pub mod compiler;
pub mod detector;
pub mod driver;
