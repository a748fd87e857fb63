//! 辅助页面守卫
//!
//! chromiumoxide 的 Page 没有 Drop 实现，需要显式 `close()`。
//! 正常路径调用 [`PageGuard::close`]；错误路径由 Drop 在后台关闭

use std::ops::Deref;

use chromiumoxide::Page;
use tracing::{debug, warn};

use crate::error::AppResult;

pub struct PageGuard {
    page: Option<Page>,
    label: String,
    runtime_handle: tokio::runtime::Handle,
}

impl PageGuard {
    /// 包装一个刚打开的页面，`label` 仅用于日志
    pub fn new(page: Page, label: impl Into<String>) -> Self {
        Self {
            page: Some(page),
            label: label.into(),
            runtime_handle: tokio::runtime::Handle::current(),
        }
    }

    /// 显式关闭
    pub async fn close(mut self) -> AppResult<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("关闭页面失败 {}: {}", self.label, e);
                return Err(e.into());
            }
            debug!("页面已关闭: {}", self.label);
        }
        Ok(())
    }

    /// 关闭并只记录错误
    pub async fn close_quietly(self) {
        let _ = self.close().await;
    }
}

impl Deref for PageGuard {
    type Target = Page;

    fn deref(&self) -> &Self::Target {
        // page 只在 close() 中取走，而 close() 会消耗 self
        match &self.page {
            Some(page) => page,
            None => unreachable!("PageGuard used after close"),
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let label = std::mem::take(&mut self.label);
            self.runtime_handle.spawn(async move {
                if let Err(e) = page.close().await {
                    warn!("后台关闭页面失败 {}: {}", label, e);
                } else {
                    debug!("后台关闭页面: {}", label);
                }
            });
        }
    }
}
