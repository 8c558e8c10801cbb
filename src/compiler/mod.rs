//! 编译模块：将技术定义编译为可执行的正则模式
pub mod pattern;
pub mod compiler;

pub use self::pattern::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule, ImpliedTech};
pub use self::compiler::RuleCompiler;
