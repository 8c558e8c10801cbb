//! 定义就绪信号
//! 事件关联器与消息分发器通过它等待定义合并完成，而不是依赖拉取顺序

use std::sync::Arc;

use tokio::sync::watch;

use super::model::DefinitionSet;

/// 定义集句柄：发布一次，任意多方等待
#[derive(Clone)]
pub struct DefinitionsHandle {
    sender: Arc<watch::Sender<Option<Arc<DefinitionSet>>>>,
}

impl Default for DefinitionsHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionsHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// 发布定义集，唤醒所有等待者
    pub fn publish(&self, definitions: DefinitionSet) -> Arc<DefinitionSet> {
        let definitions = Arc::new(definitions);
        self.sender.send_replace(Some(Arc::clone(&definitions)));
        definitions
    }

    /// 当前定义集（未就绪时为 None）
    pub fn current(&self) -> Option<Arc<DefinitionSet>> {
        self.sender.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// 等待定义就绪
    pub async fn wait_ready(&self) -> Arc<DefinitionSet> {
        let mut receiver = self.sender.subscribe();
        let ready = match receiver.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            // 发送端与本句柄同生命周期，不会提前关闭
            Err(_) => None,
        };
        ready.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_waiters_released_on_publish() {
        let handle = DefinitionsHandle::new();
        assert!(!handle.is_ready());

        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_ready().await.apps.len() })
        };

        tokio::task::yield_now().await;
        let mut definitions = DefinitionSet::default();
        definitions.apps.insert("A".into(), json!({}));
        handle.publish(definitions);

        assert_eq!(waiter.await.unwrap(), 1);
        assert!(handle.is_ready());
        assert_eq!(handle.current().unwrap().apps.len(), 1);
    }

    #[tokio::test]
    async fn test_wait_after_publish_returns_immediately() {
        let handle = DefinitionsHandle::new();
        handle.publish(DefinitionSet::default());
        assert!(handle.wait_ready().await.is_empty());
    }
}
