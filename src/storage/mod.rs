//! 存储模块：持久化后端与带默认值语义的选项存储
pub mod backend;
pub mod option_store;

pub use self::backend::{JsonFileStore, KeyValueStore, MemoryStore};
pub use self::option_store::OptionStore;

/// 持久化键名
pub mod keys {
    pub const VERSION: &str = "version";
    pub const DYNAMIC_ICON: &str = "dynamicIcon";
    pub const HOSTNAME_CACHE: &str = "hostnameCache";
    pub const TRACKING: &str = "tracking";
    pub const ROBOTS_TXT_CACHE: &str = "robotsTxtCache";
    pub const PINNED_CATEGORY: &str = "pinnedCategory";
}
