//! 订单处理流程 - 流程层
//!
//! 核心职责：定义"一个订单"的完整处理流程
//!
//! 流程顺序：
//! 1. 本地已有发票 → 跳过（不再触碰浏览器）
//! 2. 已开票 → 详情页判断 → 换开 / 下载
//! 3. 未开票 → 只记录（申请开票不在本工具范围内）

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{Disposition, OrderRow, ReissueDecision, ReissueOutcome};
use crate::portal::InvoicePortal;
use crate::services::{
    classify, DownloadOrchestrator, DownloadResult, InvoiceStore, Pacer, ReissueResolver,
};
use crate::workflow::order_ctx::OrderCtx;

/// 订单处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// 本地已存在
    AlreadyDownloaded,
    /// 本次下载完成
    Downloaded(PathBuf),
    /// 没有可用的详情/下载链接
    NoDownloadLink,
    /// 换开申请已提交，下次运行时再下载
    ReissueSubmitted,
    /// 站点拒绝换开
    ReissueRejected(String),
    /// 换开表单无法填写，需要手动处理
    ReissueFormUnavailable(String),
    /// 未开票，可申请（未实现自动申请）
    RequestPending,
    /// 未开票，无法申请
    NotIssuable,
    /// 未知状态
    UnknownStatus(String),
}

/// 订单处理流程
///
/// 不持有浏览器资源，只依赖业务能力（services）
pub struct OrderFlow {
    store: InvoiceStore,
    resolver: ReissueResolver,
    downloader: DownloadOrchestrator,
    pacer: Pacer,
}

impl OrderFlow {
    pub fn new(
        store: InvoiceStore,
        resolver: ReissueResolver,
        downloader: DownloadOrchestrator,
        pacer: Pacer,
    ) -> Self {
        Self {
            store,
            resolver,
            downloader,
            pacer,
        }
    }

    pub async fn run(
        &self,
        portal: &dyn InvoicePortal,
        row: &OrderRow,
        ctx: &OrderCtx,
    ) -> AppResult<OrderOutcome> {
        let on_disk = self.store.contains(&row.order_id).await?;

        match classify(row, on_disk) {
            Disposition::AlreadyDownloaded => {
                info!("{} ✅ 发票已经存在，跳过下载", ctx);
                Ok(OrderOutcome::AlreadyDownloaded)
            }
            Disposition::Issued => self.handle_issued(portal, row, ctx).await,
            Disposition::IssuableNotYetRequested => {
                info!("{} ⭕️ 可进行发票申请（需手动申请）", ctx);
                Ok(OrderOutcome::RequestPending)
            }
            Disposition::NotIssuable => {
                info!("{} ❌ 无法开具发票", ctx);
                Ok(OrderOutcome::NotIssuable)
            }
            Disposition::UnknownStatus(status) => {
                warn!("{} ⚠️ 未识别的开票状态: {:?}", ctx, status);
                Ok(OrderOutcome::UnknownStatus(status))
            }
        }
    }

    /// 已开票：先判断换开，再下载
    async fn handle_issued(
        &self,
        portal: &dyn InvoicePortal,
        row: &OrderRow,
        ctx: &OrderCtx,
    ) -> AppResult<OrderOutcome> {
        self.pacer.rest().await;

        let Some(detail_url) = row.detail_url.as_deref() else {
            warn!("{} ⚠️ 没有发票详情链接，跳过", ctx);
            return Ok(OrderOutcome::NoDownloadLink);
        };

        let decision = self.resolver.resolve(portal, row).await?;
        if decision == ReissueDecision::EligibleAndNeedsChange {
            let outcome = self.resolver.reissue(portal, row).await?;
            return Ok(match outcome {
                ReissueOutcome::Submitted => OrderOutcome::ReissueSubmitted,
                ReissueOutcome::Rejected(message) => OrderOutcome::ReissueRejected(message),
                ReissueOutcome::FormUnavailable(reason) => {
                    OrderOutcome::ReissueFormUnavailable(reason)
                }
            });
        }

        let result = self.downloader.download(portal, detail_url).await?;
        self.pacer.rest().await;

        Ok(match result {
            DownloadResult::Saved { path, .. } => OrderOutcome::Downloaded(path),
            DownloadResult::NoOrderId => {
                warn!("{} ⚠️ 详情链接中没有订单号，跳过", ctx);
                OrderOutcome::NoDownloadLink
            }
        })
    }
}
