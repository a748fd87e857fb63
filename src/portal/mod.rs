//! 发票站点能力
//!
//! 核心流程只通过 [`InvoicePortal`] 与站点交互：
//! - `ChromePortal`：基于 chromiumoxide 驱动真实浏览器
//! - 测试中使用脚本化的假实现

pub mod chrome;
pub mod site;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    CompanyProfile, DetailSnapshot, InvoiceLink, OrderRow, ReissueOutcome, StoredCookie,
};

pub use chrome::ChromePortal;

/// 站点操作
///
/// 所有"辅助页面"（详情、换开弹窗、下载页）都必须在方法返回前关闭，
/// 主列表页在整个运行期间保持不变
#[async_trait]
pub trait InvoicePortal: Send + Sync {
    // ========== 登录 ==========

    /// 把已保存的 cookie 写入浏览器
    async fn apply_cookies(&self, cookies: &[StoredCookie]) -> AppResult<()>;

    /// 导出当前页面的 cookie
    async fn export_cookies(&self) -> AppResult<Vec<StoredCookie>>;

    /// 打开发票列表页，返回最终地址（未登录时会被重定向）
    async fn open_listing(&self) -> AppResult<String>;

    /// 主页面当前地址
    async fn current_url(&self) -> AppResult<String>;

    /// 重新加载登录页并截获二维码图片
    async fn capture_login_challenge(&self) -> AppResult<Option<Vec<u8>>>;

    // ========== 列表 ==========

    /// 等待列表加载完成并读取当前页所有订单（文档顺序）
    async fn read_rows(&self) -> AppResult<Vec<OrderRow>>;

    /// 当前页码文本
    async fn current_page_label(&self) -> AppResult<Option<String>>;

    /// 是否存在"下一页"
    async fn has_next_page(&self) -> AppResult<bool>;

    /// 跳转到指定页
    async fn jump_to_page(&self, page_no: u32) -> AppResult<()>;

    // ========== 详情 / 换开 / 下载 ==========

    /// 在新页面中读取发票详情
    async fn inspect_detail(&self, detail_url: &str) -> AppResult<DetailSnapshot>;

    /// 点击列表行上的换开按钮并提交换开表单
    async fn request_reissue(
        &self,
        row: &OrderRow,
        company: &CompanyProfile,
    ) -> AppResult<ReissueOutcome>;

    /// 在新页面中读取发票抬头与下载地址
    async fn locate_invoice(&self, detail_url: &str) -> AppResult<InvoiceLink>;
}
