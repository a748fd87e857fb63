//! 订单分类 - 业务能力层
//!
//! 纯函数：根据状态文本、操作文本和本地文件是否存在给出分类

use crate::models::order::{LABEL_REQUEST, STATUS_ISSUED, STATUS_NOT_ISSUED};
use crate::models::{Disposition, OrderRow};

/// 对一个订单行分类
///
/// 优先级：本地已有文件 > 已开票 > 未开票（可申请 / 不可申请）> 未知状态
pub fn classify(row: &OrderRow, already_downloaded: bool) -> Disposition {
    if already_downloaded {
        return Disposition::AlreadyDownloaded;
    }

    match row.status_text.trim() {
        STATUS_ISSUED => Disposition::Issued,
        STATUS_NOT_ISSUED => {
            if row.action_label.as_deref().map(str::trim) == Some(LABEL_REQUEST) {
                Disposition::IssuableNotYetRequested
            } else {
                Disposition::NotIssuable
            }
        }
        other => Disposition::UnknownStatus(other.to_string()),
    }
}
