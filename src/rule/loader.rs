//! 技术定义加载器
//! 主定义优先拉取远程最新版本，失败（网络错误或非2xx）时回退到内置副本；
//! 随后无条件加载扩展定义并合并

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::model::{DefinitionDocument, DefinitionSet, ExtendedDocument};
use crate::config::{DriverConfig, ResourceLocation};
use crate::error::{DriverError, DriverResult};
use crate::net::client::ensure_success;
use crate::net::HttpClient;

/// 定义加载器
pub struct DefinitionLoader {
    http: Arc<dyn HttpClient>,
    config: DriverConfig,
}

impl DefinitionLoader {
    pub fn new(http: Arc<dyn HttpClient>, config: DriverConfig) -> Self {
        Self { http, config }
    }

    /// 加载并合并定义
    ///
    /// 仅当主定义与内置副本都不可用时返回错误；扩展定义失败只记录日志，
    /// 返回的定义集处于部分就绪状态（见 [`DefinitionSet`]）。
    pub async fn load(&self) -> DriverResult<DefinitionSet> {
        let primary = match self.fetch_primary().await {
            Ok(document) => document,
            Err(e) => {
                warn!("GET apps.json 失败：{}，回退到本地副本", e);
                self.fetch_document::<DefinitionDocument>(&self.config.fallback_definitions)
                    .await
                    .map_err(|fallback_e| {
                        DriverError::DefinitionLoadError(format!(
                            "主定义与本地副本均不可用：{}；{}",
                            e, fallback_e
                        ))
                    })?
            }
        };
        debug!(
            "主定义加载完成，技术数：{}，分类数：{}",
            primary.apps.len(),
            primary.categories.len()
        );

        let mut definitions = DefinitionSet::from_primary(primary);

        match self
            .fetch_document::<ExtendedDocument>(&self.config.extended_definitions)
            .await
        {
            Ok(extended) => {
                debug!("扩展定义加载完成，技术数：{}", extended.apps.len());
                definitions.merge_extended(extended);
            }
            Err(e) => error!(
                "GET {} 失败：{}",
                self.config.extended_definitions.describe(),
                e
            ),
        }

        Ok(definitions)
    }

    async fn fetch_primary(&self) -> DriverResult<DefinitionDocument> {
        let location = ResourceLocation::Remote(self.config.primary_definitions_url.clone());
        self.fetch_document(&location).await
    }

    async fn fetch_document<T: DeserializeOwned>(&self, location: &ResourceLocation) -> DriverResult<T> {
        let bytes = match location {
            ResourceLocation::Remote(url) => ensure_success(url, self.http.get(url).await?)?.body,
            ResourceLocation::Local(path) => tokio::fs::read(path).await?,
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}
