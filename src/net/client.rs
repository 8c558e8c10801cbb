//! 出站HTTP客户端
//! 驱动层只依赖 HttpClient trait，生产环境使用 reqwest 实现

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};

/// 已读取完响应体的HTTP响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx 视为成功（对应 fetch 的 response.ok）
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> DriverResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// 出站HTTP请求接口
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET 请求（跟随重定向），返回状态码与完整响应体
    async fn get(&self, url: &str) -> DriverResult<HttpResponse>;

    /// POST JSON 请求，返回状态码
    async fn post_json(&self, url: &str, body: &Value) -> DriverResult<u16>;
}

/// 基于 reqwest 的HTTP客户端
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(config: &DriverConfig) -> DriverResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .redirect(Policy::limited(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> DriverResult<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header("Accept-Encoding", "gzip, deflate")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }

    async fn post_json(&self, url: &str, body: &Value) -> DriverResult<u16> {
        let response = self.client.post(url).json(body).send().await?;
        Ok(response.status().as_u16())
    }
}

/// 非2xx状态转换为错误
pub(crate) fn ensure_success(url: &str, response: HttpResponse) -> DriverResult<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(DriverError::HttpStatusError {
            url: url.to_string(),
            status: response.status,
        })
    }
}
