//! 会话工厂的 CDP 实现
//!
//! 会话重启 = 重新连接调试端口、回到列表页。
//! 重新认证依赖浏览器配置档中的登录态（凭据管理不属于本引擎）。

use crate::browser::connection::connect_to_browser_and_page;
use crate::config::Config;
use crate::error::AutoError;
use crate::infrastructure::{CdpPageReader, JsExecutor, PageReader, SessionFactory};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

pub struct CdpSessionFactory {
    config: Config,
}

impl CdpSessionFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionFactory for CdpSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageReader>> {
        let (browser, page) =
            connect_to_browser_and_page(self.config.browser_debug_port, &self.config.target_url)
                .await?;

        let reader = CdpPageReader::new(
            browser,
            JsExecutor::new(page),
            self.config.target_url.clone(),
        );

        // 等待列表渲染完成再交出会话
        for _ in 0..self.config.poll_attempts {
            if reader.list_present().await.unwrap_or(false) {
                info!("✓ 会话就绪，案件列表已渲染");
                return Ok(Box::new(reader));
            }
            sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }

        Err(AutoError::timeout(
            "案件列表渲染",
            self.config.poll_attempts as u64 * self.config.poll_interval_ms,
        )
        .into())
    }
}
