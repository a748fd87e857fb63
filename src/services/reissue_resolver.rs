//! 换开判断 - 业务能力层
//!
//! 只处理单个"已开票"订单：读取详情页 → 判断是否需要/能否换开 → 提交换开

use tracing::{debug, info, warn};

use crate::error::{AppResult, InvoiceError};
use crate::models::{CompanyProfile, DetailSnapshot, OrderRow, ReissueDecision, ReissueOutcome};
use crate::portal::InvoicePortal;

/// 详情页中表示"不支持换开"的文本
pub const NOT_SUPPORTED_MARKERS: &[&str] = &["暂不支持换开", "不支持换开", "不支持发票换开"];

/// 换开按钮文本中的关键字
pub const REISSUE_KEYWORD: &str = "换开";

/// 根据详情页快照判断
///
/// 1. 页面提示不支持换开 → 不可换开
/// 2. 没有换开按钮 → 不可换开
/// 3. 抬头已是目标单位，或未配置目标单位 → 无需换开
/// 4. 否则需要换开
pub fn decide(snapshot: &DetailSnapshot, company: Option<&CompanyProfile>) -> ReissueDecision {
    if NOT_SUPPORTED_MARKERS
        .iter()
        .any(|marker| snapshot.body_text.contains(marker))
    {
        return ReissueDecision::NotEligible;
    }

    let has_reissue_control = snapshot
        .action_labels
        .iter()
        .any(|label| label.contains(REISSUE_KEYWORD));
    if !has_reissue_control {
        return ReissueDecision::NotEligible;
    }

    let Some(company) = company else {
        return ReissueDecision::EligibleAndMatchesPayee;
    };

    let current = snapshot.payee.as_deref().map(str::trim).unwrap_or_default();
    if current == company.name.trim() {
        ReissueDecision::EligibleAndMatchesPayee
    } else {
        ReissueDecision::EligibleAndNeedsChange
    }
}

/// 换开服务
#[derive(Debug, Clone)]
pub struct ReissueResolver {
    company: Option<CompanyProfile>,
}

impl ReissueResolver {
    pub fn new(company: Option<CompanyProfile>) -> Self {
        Self { company }
    }

    pub fn company(&self) -> Option<&CompanyProfile> {
        self.company.as_ref()
    }

    /// 打开详情页并判断
    ///
    /// 详情页加载不出来时按"不可换开"处理，不中断整个运行
    pub async fn resolve(
        &self,
        portal: &dyn InvoicePortal,
        row: &OrderRow,
    ) -> AppResult<ReissueDecision> {
        let Some(detail_url) = row.detail_url.as_deref() else {
            return Err(InvoiceError::detail_unavailable(
                format!("订单 {}", row.order_id),
                "缺少发票详情链接",
            ));
        };

        let snapshot = match portal.inspect_detail(detail_url).await {
            Ok(snapshot) => snapshot,
            Err(e @ InvoiceError::DetailPageUnavailable { .. })
            | Err(e @ InvoiceError::Timeout { .. })
            | Err(e @ InvoiceError::Browser(_)) => {
                warn!("订单 {} 详情页异常，按不可换开处理: {}", row.order_id, e);
                return Ok(ReissueDecision::NotEligible);
            }
            Err(e) => return Err(e),
        };

        let decision = decide(&snapshot, self.company.as_ref());
        debug!(
            "订单 {} 当前抬头 {:?} → {:?}",
            row.order_id, snapshot.payee, decision
        );
        Ok(decision)
    }

    /// 提交换开；被站点拒绝或表单异常时只记录，不重试
    pub async fn reissue(
        &self,
        portal: &dyn InvoicePortal,
        row: &OrderRow,
    ) -> AppResult<ReissueOutcome> {
        let company = self.company.as_ref().ok_or_else(|| InvoiceError::ReissueIneligible {
            order_id: row.order_id.clone(),
            reason: "未配置换开抬头".into(),
        })?;

        info!(" 🔄 开始[换开] {} 发票 → {}", row.order_id, company.name);
        let outcome = portal.request_reissue(row, company).await?;

        match &outcome {
            ReissueOutcome::Submitted => {
                info!(" ✅ 订单 {} 换开申请已提交", row.order_id)
            }
            ReissueOutcome::Rejected(message) => {
                warn!(" ⏭ 订单 {} 不能换开，跳过: {}", row.order_id, message)
            }
            ReissueOutcome::FormUnavailable(reason) => {
                warn!(" ❌ 订单 {} 无法直接换开，请手动处理: {}", row.order_id, reason)
            }
        }
        Ok(outcome)
    }
}
