//! 网络模块：出站HTTP请求
pub mod client;

pub use self::client::{HttpClient, HttpResponse, ReqwestClient};
