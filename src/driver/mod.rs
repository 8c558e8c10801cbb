//! 驱动层：把选项存储、主机缓存、标签页状态、定义加载、事件关联与消息分发
//! 组装到同一个显式上下文中
pub mod context;
pub mod dispatcher;
pub mod events;
pub mod protocol;
pub mod startup;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::browser::Browser;
use crate::config::DriverConfig;
use crate::engine::DetectionEngine;
use crate::net::HttpClient;
use crate::rule::{DefinitionLoader, DefinitionSet};
use crate::storage::KeyValueStore;

pub use self::context::DriverContext;
pub use self::dispatcher::MessageDispatcher;
pub use self::events::{CompletedRequest, EventCorrelator, RequestDetails};
pub use self::protocol::{AppsSnapshot, Message, MessageSender, Response, TabCache, TabRef};

/// 后台驱动
pub struct Driver {
    ctx: Arc<DriverContext>,
    events: EventCorrelator,
    messages: Arc<MessageDispatcher>,
}

impl Driver {
    /// 组装驱动（需在tokio运行时内调用）
    pub fn new(
        config: DriverConfig,
        store: Arc<dyn KeyValueStore>,
        browser: Arc<dyn Browser>,
        engine: Arc<dyn DetectionEngine>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let ctx = DriverContext::new(config, store, browser, engine, http);
        Self {
            events: EventCorrelator::new(Arc::clone(&ctx)),
            messages: Arc::new(MessageDispatcher::new(Arc::clone(&ctx))),
            ctx,
        }
    }

    /// 启动：预加载选项，后台加载定义，随后执行版本检查与内容脚本注入
    ///
    /// 主机名缓存在定义发布之前载入。返回定义加载任务的句柄；
    /// 无论加载成败，任务结束时定义都已发布。
    pub async fn start(&self, current_version: &str) -> JoinHandle<()> {
        startup::preload_options(&self.ctx).await;
        let loader = self.spawn_definition_loader();

        startup::check_version(&self.ctx, current_version).await;
        startup::inject_content_scripts(&self.ctx).await;

        loader
    }

    fn spawn_definition_loader(&self) -> JoinHandle<()> {
        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move {
            let loader = DefinitionLoader::new(Arc::clone(&ctx.http), ctx.config.clone());
            let definitions = match loader.load().await {
                Ok(definitions) => definitions,
                Err(e) => {
                    error!("定义加载失败：{}，以空定义集继续", e);
                    DefinitionSet::default()
                }
            };

            ctx.engine.prepare(&definitions);
            let definitions = ctx.definitions.publish(definitions);
            info!(
                "定义已就绪，技术数：{}，分类数：{}",
                definitions.apps.len(),
                definitions.categories.len()
            );
        })
    }

    pub fn context(&self) -> &Arc<DriverContext> {
        &self.ctx
    }

    pub fn events(&self) -> &EventCorrelator {
        &self.events
    }

    pub fn messages(&self) -> &Arc<MessageDispatcher> {
        &self.messages
    }
}
