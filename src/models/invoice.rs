use serde::Deserialize;

/// 换开目标抬头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyProfile {
    pub name: String,
    pub tax_no: String,
}

impl CompanyProfile {
    pub fn new(name: impl Into<String>, tax_no: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_no: tax_no.into(),
        }
    }
}

/// 发票详情页快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailSnapshot {
    /// 当前发票抬头
    pub payee: Option<String>,
    /// 页面全文
    #[serde(default)]
    pub body_text: String,
    /// 操作区链接/按钮文本
    #[serde(default)]
    pub action_labels: Vec<String>,
}

/// 发票下载信息
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLink {
    pub payee_title: String,
    pub href: String,
}

/// 换开判断结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReissueDecision {
    NotEligible,
    EligibleAndMatchesPayee,
    EligibleAndNeedsChange,
}

/// 提交换开的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReissueOutcome {
    /// 表单已提交
    Submitted,
    /// 点击换开后弹出错误对话框
    Rejected(String),
    /// 表单无法填写
    FormUnavailable(String),
}
