use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
///
/// 分为两类：
/// - 致命错误（登录失败/超时、浏览器启动、配置）：终止整个运行
/// - 单个订单错误：记录日志后跳过该订单，继续处理下一个
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// 无法获得有效登录态
    #[error("登录失败: {0}")]
    AuthenticationFailure(String),

    /// 扫码登录等待超时
    #[error("等待扫码登录超时 (已等待 {0:?})")]
    AuthenticationTimeout(Duration),

    /// 订单详情页无法加载
    #[error("详情页不可用 ({url}): {reason}")]
    DetailPageUnavailable { url: String, reason: String },

    /// 订单不支持换开
    #[error("订单 {order_id} 不支持换开: {reason}")]
    ReissueIneligible { order_id: String, reason: String },

    /// 换开表单结构变化或缺失字段
    #[error("订单 {order_id} 无法直接换开: {reason}")]
    ReissueFormChanged { order_id: String, reason: String },

    /// 找不到发票抬头或下载链接，或下载失败
    #[error("订单 {order_id} 发票下载失败: {reason}")]
    DownloadUnavailable { order_id: String, reason: String },

    /// 有界等待超时
    #[error("等待 {what} 超时 ({after:?})")]
    Timeout { what: String, after: Duration },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 浏览器（CDP）错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// HTTP 请求错误
    #[error("网络错误: {0}")]
    Http(#[from] reqwest::Error),

    /// 文件读写错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析错误
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

impl InvoiceError {
    /// 是否应当终止整个运行
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            InvoiceError::AuthenticationFailure(_)
                | InvoiceError::AuthenticationTimeout(_)
                | InvoiceError::Config(_)
        )
    }

    /// 创建超时错误
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        InvoiceError::Timeout {
            what: what.into(),
            after,
        }
    }

    /// 创建下载失败错误
    pub fn download_unavailable(order_id: impl Into<String>, reason: impl Into<String>) -> Self {
        InvoiceError::DownloadUnavailable {
            order_id: order_id.into(),
            reason: reason.into(),
        }
    }

    /// 创建详情页不可用错误
    pub fn detail_unavailable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        InvoiceError::DetailPageUnavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, InvoiceError>;
