//! 发票下载 - 业务能力层
//!
//! 详情页 → 发票抬头 + 下载地址 → 写入 `{抬头}-{订单号}.pdf`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{AppResult, InvoiceError};
use crate::portal::InvoicePortal;
use crate::services::InvoiceStore;

/// 文件传输
#[async_trait]
pub trait InvoiceTransfer: Send + Sync {
    /// 把 `href` 的内容完整写入 `dest`，返回字节数
    async fn fetch_to(&self, href: &str, dest: &Path) -> AppResult<u64>;
}

/// 基于 reqwest 的文件传输
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new() -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("jd_invoice_fetcher/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl InvoiceTransfer for HttpTransfer {
    async fn fetch_to(&self, href: &str, dest: &Path) -> AppResult<u64> {
        let mut response = self.client.get(href).send().await?.error_for_status()?;
        let mut file = tokio::fs::File::create(dest).await?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        debug!("已写入 {} 字节: {}", written, dest.display());
        Ok(written)
    }
}

/// 下载结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    Saved { path: PathBuf, bytes: u64 },
    /// 链接中没有 orderId，跳过
    NoOrderId,
}

/// 下载编排
#[derive(Clone)]
pub struct DownloadOrchestrator {
    store: InvoiceStore,
    transfer: Arc<dyn InvoiceTransfer>,
}

impl DownloadOrchestrator {
    pub fn new(store: InvoiceStore, transfer: Arc<dyn InvoiceTransfer>) -> Self {
        Self { store, transfer }
    }

    /// 下载一个订单的发票，传输完成后才返回
    pub async fn download(
        &self,
        portal: &dyn InvoicePortal,
        detail_url: &str,
    ) -> AppResult<DownloadResult> {
        let Some(order_id) = order_id_from_url(detail_url) else {
            debug!("链接中没有 orderId，跳过: {}", detail_url);
            return Ok(DownloadResult::NoOrderId);
        };

        let link = portal
            .locate_invoice(detail_url)
            .await
            .map_err(|e| InvoiceError::download_unavailable(&order_id, e.to_string()))?;
        if link.payee_title.trim().is_empty() {
            return Err(InvoiceError::download_unavailable(&order_id, "发票抬头为空"));
        }

        let target = self.store.path_for(&link.payee_title, &order_id);
        let staging = InvoiceStore::staging_path(&target);
        info!(" ⬇️ 开始下载 {} 发票", order_id);

        let bytes = match self.transfer.fetch_to(&link.href, &staging).await {
            Ok(bytes) => bytes,
            Err(e) => {
                InvoiceStore::discard(&staging).await;
                return Err(InvoiceError::download_unavailable(&order_id, e.to_string()));
            }
        };
        if let Err(e) = InvoiceStore::commit(&staging, &target).await {
            InvoiceStore::discard(&staging).await;
            return Err(InvoiceError::download_unavailable(&order_id, e.to_string()));
        }

        info!(" ✅ 发票 {} 下载完成", target.display());
        Ok(DownloadResult::Saved {
            path: target,
            bytes,
        })
    }
}

/// 取链接中的 orderId 参数
pub fn order_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "orderId")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_order_id_param() {
        assert_eq!(
            order_id_from_url("https://myivc.jd.com/fpzz/ivcLoad.action?orderId=12345&t=1")
                .as_deref(),
            Some("12345")
        );
        assert_eq!(
            order_id_from_url("https://myivc.jd.com/fpzz/ivcLoad.action?id=12345"),
            None
        );
        assert_eq!(order_id_from_url("https://myivc.jd.com/x?orderId="), None);
        assert_eq!(order_id_from_url("javascript:void(0)"), None);
    }
}
