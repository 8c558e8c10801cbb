//! 规则模块：技术定义的数据模型、加载合并与就绪信号
pub mod model;
pub mod loader;
pub mod ready;

// 导出核心接口
pub use self::model::{
    Category, DefinitionDocument, DefinitionSet, ExtendedDocument, Technology,
};
pub use self::loader::DefinitionLoader;
pub use self::ready::DefinitionsHandle;
