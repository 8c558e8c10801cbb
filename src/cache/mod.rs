//! 主机缓存集合：主机名检测结果、robots.txt 规则（含单飞队列）、广告记录
pub mod hostname;
pub mod robots;
pub mod robots_rules;

use std::sync::Arc;

use crate::config::DriverConfig;
use crate::net::HttpClient;
use crate::storage::OptionStore;

pub use self::hostname::{AdCache, HostnameCache};
pub use self::robots::{PendingRobots, RobotsTxtCache};
pub use self::robots_rules::{is_path_allowed, parse_robots_txt, RobotsRule};

/// 三个相互独立的主机级缓存
pub struct HostCacheSet {
    pub hostnames: HostnameCache,
    pub robots: RobotsTxtCache,
    pub ads: AdCache,
}

impl HostCacheSet {
    pub fn new(config: &DriverConfig, options: OptionStore, http: Arc<dyn HttpClient>) -> Self {
        Self {
            hostnames: HostnameCache::new(),
            robots: RobotsTxtCache::new(options, http, config.robots_timeout),
            ads: AdCache::new(),
        }
    }
}
