//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：启动日志、准备保存目录、连接或启动浏览器
//! 2. **登录**：恢复或建立登录态，失败即终止
//! 3. **组装**：把 services 组装成 `OrderFlow`，交给 `ListingWalker`
//! 4. **全局统计**：输出运行结果
//!
//! 唯一持有 Browser（经由 `ChromePortal`）的模块

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::browser::{self, LaunchOptions};
use crate::config::Config;
use crate::models::PageCursor;
use crate::orchestrator::listing_walker::{ListingWalker, RunStats};
use crate::portal::ChromePortal;
use crate::services::{
    DownloadOrchestrator, HttpTransfer, InvoiceStore, Pacer, ReissueResolver, SessionManager,
};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workflow::OrderFlow;

/// 应用主结构
pub struct App {
    config: Config,
    portal: ChromePortal,
    store: InvoiceStore,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let store = InvoiceStore::new(config.output_path());
        let saved_to = store
            .ensure_dir()
            .await
            .with_context(|| format!("无法创建发票保存目录 {}", config.output_dir))?;
        info!("💾 发票保存路径: {}", saved_to.display());

        let (browser, page) = match config.browser_debug_port {
            Some(port) => browser::connect_to_browser(port).await?,
            None => browser::launch_browser(&LaunchOptions::from_config(&config)).await?,
        };

        let portal = ChromePortal::new(browser, page, &config, pacer_for(&config));

        Ok(Self {
            config,
            portal,
            store,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        let session = SessionManager::new(&self.config)
            .establish(&self.portal)
            .await
            .context("登录失败")?;
        if session.restored_from_cache {
            info!("🍪 已从 {} 恢复登录状态", self.config.cookie_path);
        }

        let resolver = ReissueResolver::new(self.config.company());
        if resolver.company().is_none() {
            info!("ℹ️ 未配置换开抬头，只下载不换开");
        }

        let transfer = Arc::new(HttpTransfer::new()?);
        let downloader = DownloadOrchestrator::new(self.store.clone(), transfer);
        let flow = OrderFlow::new(
            self.store.clone(),
            resolver,
            downloader,
            pacer_for(&self.config),
        );

        let cursor = PageCursor::new(self.config.page_num, self.config.page_limit());
        let mut walker = ListingWalker::new(cursor, pacer_for(&self.config));
        let stats = walker.walk(&self.portal, &flow).await;

        print_final_stats(&stats, &self.config);
        Ok(stats)
    }
}

fn pacer_for(config: &Config) -> Pacer {
    Pacer::from_millis(config.pacing_min_ms, config.pacing_max_ms)
}
