//! 订单列表行

use regex::Regex;
use serde::Deserialize;

/// 操作区链接文本：发票详情
pub const LABEL_DETAIL: &str = "发票详情";
/// 操作区链接文本：发票申请
pub const LABEL_REQUEST: &str = "发票申请";
/// 状态文本：已开票
pub const STATUS_ISSUED: &str = "已开票";
/// 状态文本：未开票
pub const STATUS_NOT_ISSUED: &str = "未开票";

/// 页面脚本返回的原始行数据
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderRow {
    /// 订单号标签，例如 "订单号：12345"
    pub number_label: String,
    pub status_text: String,
    #[serde(default)]
    pub links: Vec<RowLink>,
}

/// 操作区的一个链接
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RowLink {
    pub text: String,
    pub href: Option<String>,
}

/// 列表中的一个订单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub order_id: String,
    pub status_text: String,
    /// 操作区第一个链接的文本
    pub action_label: Option<String>,
    /// "发票详情" 链接
    pub detail_url: Option<String>,
    /// 在当前页中的位置（从 0 开始，文档顺序）
    pub position: usize,
}

impl OrderRow {
    /// 从原始行数据构建，订单号标签中没有数字时返回 None
    pub fn from_raw(raw: RawOrderRow, position: usize) -> Option<Self> {
        let order_id = extract_order_id(&raw.number_label)?;
        let action_label = raw.links.first().map(|l| l.text.trim().to_string());
        let detail_url = raw
            .links
            .iter()
            .find(|l| l.text.trim() == LABEL_DETAIL)
            .and_then(|l| l.href.clone());

        Some(Self {
            order_id,
            status_text: raw.status_text.trim().to_string(),
            action_label,
            detail_url,
            position,
        })
    }
}

/// 取标签中的第一段连续数字
pub fn extract_order_id(label: &str) -> Option<String> {
    let re = Regex::new(r"[0-9]+").ok()?;
    re.find(label).map(|m| m.as_str().to_string())
}

/// 订单分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// 本地已存在发票文件
    AlreadyDownloaded,
    /// 已开票
    Issued,
    /// 未开票且无法申请
    NotIssuable,
    /// 未开票，可以申请
    IssuableNotYetRequested,
    /// 未识别的状态文本
    UnknownStatus(String),
}
