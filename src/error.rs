//! 全局错误类型定义
//! 组件内部用 `?` 传播，组件边界处统一降级为空结果并记录日志

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum DriverError {
    // 存储相关错误
    #[error("存储读取失败：{0}")]
    StorageReadError(String),
    #[error("存储写入失败：{0}")]
    StorageWriteError(String),

    // 定义加载相关错误
    #[error("技术定义加载失败：{0}")]
    DefinitionLoadError(String),
    #[error("正则编译失败：{0}")]
    RegexCompileError(#[from] RegexError),

    // 网络相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),
    #[error("URL {url} 返回状态码 {status}")]
    HttpStatusError { url: String, status: u16 },

    // 浏览器接口错误
    #[error("浏览器接口调用失败：{0}")]
    BrowserError(String),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type DriverResult<T> = Result<T, DriverError>;
