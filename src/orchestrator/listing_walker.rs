//! 列表分页处理器 - 编排层
//!
//! ## 职责
//!
//! 逐页遍历发票列表，对每一页的订单依次调用 `OrderFlow`。
//!
//! ## 规则
//!
//! 1. 起始页总会被处理，之后页码严格递增
//! 2. 没有"下一页"或页码超过上限时停止
//! 3. 单个订单失败只跳过该订单；单页读取失败只跳过该页

use tracing::{error, info};

use crate::models::{OrderRow, PageCursor};
use crate::portal::InvoicePortal;
use crate::services::Pacer;
use crate::utils::logging::log_rows_table;
use crate::workflow::{OrderCtx, OrderFlow, OrderOutcome};

/// 运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// 按访问顺序记录的页码
    pub visited_pages: Vec<u32>,
    pub failed_pages: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub reissue_submitted: usize,
    pub reissue_skipped: usize,
    pub request_pending: usize,
    pub not_issuable: usize,
    pub unknown_status: usize,
    pub no_link: usize,
    /// 处理过程中出错（需手动处理）的订单
    pub failed_orders: Vec<String>,
}

impl RunStats {
    pub fn record(&mut self, outcome: &OrderOutcome) {
        match outcome {
            OrderOutcome::AlreadyDownloaded => self.already_present += 1,
            OrderOutcome::Downloaded(_) => self.downloaded += 1,
            OrderOutcome::NoDownloadLink => self.no_link += 1,
            OrderOutcome::ReissueSubmitted => self.reissue_submitted += 1,
            OrderOutcome::ReissueRejected(_) | OrderOutcome::ReissueFormUnavailable(_) => {
                self.reissue_skipped += 1
            }
            OrderOutcome::RequestPending => self.request_pending += 1,
            OrderOutcome::NotIssuable => self.not_issuable += 1,
            OrderOutcome::UnknownStatus(_) => self.unknown_status += 1,
        }
    }

    pub fn orders_seen(&self) -> usize {
        self.downloaded
            + self.already_present
            + self.reissue_submitted
            + self.reissue_skipped
            + self.request_pending
            + self.not_issuable
            + self.unknown_status
            + self.no_link
            + self.failed_orders.len()
    }
}

/// 列表分页处理器
pub struct ListingWalker {
    cursor: PageCursor,
    pacer: Pacer,
}

impl ListingWalker {
    pub fn new(cursor: PageCursor, pacer: Pacer) -> Self {
        Self { cursor, pacer }
    }

    /// 从起始页开始逐页处理
    pub async fn walk(&mut self, portal: &dyn InvoicePortal, flow: &OrderFlow) -> RunStats {
        let mut stats = RunStats::default();

        let start = self.cursor.current();
        if start > 1 {
            info!("⏩ 跳转到起始页 {}", start);
            if let Err(e) = portal.jump_to_page(start).await {
                error!("跳转到第 {} 页失败: {}", start, e);
                return stats;
            }
        }

        loop {
            let page_no = self.cursor.current();
            stats.visited_pages.push(page_no);
            self.process_page(portal, flow, page_no, &mut stats).await;

            self.pacer.rest().await;

            match portal.has_next_page().await {
                Ok(true) => {}
                Ok(false) => {
                    info!("⏹ 已到最后一页 (第 {} 页)", page_no);
                    break;
                }
                Err(e) => {
                    error!("检查下一页失败，停止翻页: {}", e);
                    break;
                }
            }

            let Some(next) = self.cursor.advance() else {
                info!(" ⏹ 达到最大页码 {}，停止下载", page_no);
                break;
            };
            if let Err(e) = portal.jump_to_page(next).await {
                error!("跳转到第 {} 页失败，停止翻页: {}", next, e);
                break;
            }
        }

        stats
    }

    /// 处理一页
    async fn process_page(
        &self,
        portal: &dyn InvoicePortal,
        flow: &OrderFlow,
        page_no: u32,
        stats: &mut RunStats,
    ) {
        let rows = match portal.read_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("第 {} 页读取失败，跳过本页: {}", page_no, e);
                stats.failed_pages += 1;
                return;
            }
        };

        let label = portal
            .current_page_label()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| page_no.to_string());
        info!(" 📗 当前页码 {}，共 {} 个订单", label, rows.len());
        log_rows_table(&rows);

        for (index, row) in rows.iter().enumerate() {
            let ctx = OrderCtx::new(page_no, index + 1, &row.order_id);
            self.process_row(portal, flow, row, &ctx, stats).await;
        }
    }

    async fn process_row(
        &self,
        portal: &dyn InvoicePortal,
        flow: &OrderFlow,
        row: &OrderRow,
        ctx: &OrderCtx,
        stats: &mut RunStats,
    ) {
        match flow.run(portal, row, ctx).await {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                error!("{} ❌ 处理失败，或许是退货订单，请手动处理: {}", ctx, e);
                stats.failed_orders.push(row.order_id.clone());
            }
        }
    }
}
