//! 基于 chromiumoxide 的站点实现
//!
//! 主页面（列表页）在整个运行期间保持不变；详情、换开弹窗、下载页都在
//! 新页面中打开，并通过 [`PageGuard`] 保证关闭

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use super::site::*;
use super::InvoicePortal;
use crate::config::Config;
use crate::error::{AppResult, InvoiceError};
use crate::infrastructure::{JsExecutor, PageGuard};
use crate::models::{
    CompanyProfile, DetailSnapshot, InvoiceLink, OrderRow, RawOrderRow, ReissueOutcome,
    StoredCookie,
};
use crate::services::Pacer;

/// 等待二维码响应的上限
const QR_CAPTURE_TIMEOUT: Duration = Duration::from_secs(20);
/// 详情页打开后的渲染等待
const RENDER_WAIT: Duration = Duration::from_secs(1);
/// 等待下载按钮的上限
const DOWNLOAD_TRIGGER_TIMEOUT: Duration = Duration::from_secs(2);
/// 等待错误对话框关闭的上限
const DIALOG_CLEAR_TIMEOUT: Duration = Duration::from_secs(5);
const POPUP_POLL: Duration = Duration::from_millis(200);

/// 站点时间参数
#[derive(Debug, Clone)]
pub struct PortalTimings {
    pub listing: Duration,
    pub detail: Duration,
    pub popup: Duration,
}

impl PortalTimings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            listing: config.listing_timeout(),
            detail: config.detail_timeout(),
            popup: config.popup_timeout(),
        }
    }
}

/// 真实浏览器上的发票站点
pub struct ChromePortal {
    browser: Browser,
    executor: JsExecutor,
    listing_url: String,
    timings: PortalTimings,
    pacer: Pacer,
}

impl ChromePortal {
    pub fn new(browser: Browser, page: Page, config: &Config, pacer: Pacer) -> Self {
        Self {
            browser,
            executor: JsExecutor::new(page),
            listing_url: config.listing_url.clone(),
            timings: PortalTimings::from_config(config),
            pacer,
        }
    }

    fn page(&self) -> &Page {
        self.executor.page()
    }

    /// 在新页面中打开地址
    async fn open_secondary(&self, url: &str) -> AppResult<PageGuard> {
        debug!("打开辅助页面: {}", url);
        let page = self.browser.new_page(url).await?;
        Ok(PageGuard::new(page, url))
    }

    async fn target_ids(&self) -> AppResult<HashSet<String>> {
        let pages = self.browser.pages().await?;
        Ok(pages.iter().map(|p| p.target_id().inner().clone()).collect())
    }

    /// 等待点击后打开的新页面
    async fn wait_for_popup(&self, known: &HashSet<String>) -> AppResult<Page> {
        let deadline = Instant::now() + self.timings.popup;
        loop {
            let pages = self.browser.pages().await?;
            if let Some(page) = pages
                .into_iter()
                .find(|p| !known.contains(p.target_id().inner()))
            {
                return Ok(page);
            }
            if Instant::now() >= deadline {
                return Err(InvoiceError::timeout("换开弹窗", self.timings.popup));
            }
            sleep(POPUP_POLL).await;
        }
    }

    /// 关闭点击后新打开的页面
    async fn close_new_pages(&self, known: &HashSet<String>) {
        let pages = match self.browser.pages().await {
            Ok(pages) => pages,
            Err(e) => {
                warn!("获取页面列表失败: {}", e);
                return;
            }
        };
        for page in pages {
            if !known.contains(page.target_id().inner()) {
                if let Err(e) = page.close().await {
                    warn!("关闭弹窗失败: {}", e);
                }
            }
        }
    }

    /// 点击换开后检查阻断对话框；存在则点确认并返回对话框文本
    async fn dismiss_blocking_dialog(&self) -> AppResult<Option<String>> {
        let text: Option<String> = self.executor.eval_as(DIALOG_TEXT_SCRIPT).await?;
        let Some(text) = text else {
            return Ok(None);
        };

        debug!("检测到对话框: {}", text);
        match self.page().find_element(SEL_DIALOG_CONFIRM).await {
            Ok(button) => {
                button.click().await?;
            }
            Err(e) => warn!("对话框中找不到确认按钮: {}", e),
        }
        if !self
            .executor
            .wait_until_gone(SEL_DIALOG, DIALOG_CLEAR_TIMEOUT)
            .await?
        {
            warn!("对话框未在 {:?} 内关闭", DIALOG_CLEAR_TIMEOUT);
        }
        Ok(Some(text))
    }

    /// 在换开弹窗中填写单位抬头并提交
    async fn fill_reissue_form(
        &self,
        popup: &PageGuard,
        order_id: &str,
        company: &CompanyProfile,
    ) -> AppResult<()> {
        let form = JsExecutor::new(Page::clone(popup));
        let form_changed = |reason: &str| InvoiceError::ReissueFormChanged {
            order_id: order_id.to_string(),
            reason: reason.to_string(),
        };

        if !form.wait_for(SEL_TITLE_TYPE, self.timings.popup).await? {
            return Err(form_changed("缺少抬头类型选择框"));
        }
        if !form.wait_for(SEL_CONTENT_TYPE, self.timings.popup).await? {
            return Err(form_changed("缺少发票内容选项"));
        }

        popup.find_element(SEL_CONTENT_TYPE).await?.click().await?;

        let selected: bool = form
            .eval_as(select_value_script(SEL_TITLE_TYPE, TITLE_TYPE_ENTERPRISE))
            .await?;
        if !selected {
            return Err(form_changed("无法选择单位抬头"));
        }
        sleep(Duration::from_millis(100)).await;

        let company_input = popup.find_element(SEL_COMPANY_INPUT).await?;
        company_input.click().await?;
        company_input.type_str(&company.name).await?;
        self.pacer.rest().await;

        let tax_input = popup.find_element(SEL_TAX_NO_INPUT).await?;
        tax_input.click().await?;
        tax_input.type_str(&company.tax_no).await?;
        self.pacer.rest().await;

        popup.find_element(SEL_REISSUE_SUBMIT).await?.click().await?;
        Ok(())
    }

    async fn read_response_body(&self, request_id: RequestId) -> AppResult<Option<Vec<u8>>> {
        // 响应头到达时正文可能还没下载完
        for attempt in 1..=3 {
            match self
                .page()
                .execute(GetResponseBodyParams::new(request_id.clone()))
                .await
            {
                Ok(resp) => {
                    let body = &resp.result;
                    let bytes = if body.base64_encoded {
                        match base64::engine::general_purpose::STANDARD.decode(&body.body) {
                            Ok(bytes) => bytes,
                            Err(e) => {
                                warn!("二维码图片解码失败: {}", e);
                                return Ok(None);
                            }
                        }
                    } else {
                        body.body.clone().into_bytes()
                    };
                    return Ok(Some(bytes));
                }
                Err(e) => {
                    debug!("读取二维码响应失败 (尝试 {}/3): {}", attempt, e);
                    sleep(Duration::from_millis(300)).await;
                }
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl InvoicePortal for ChromePortal {
    async fn apply_cookies(&self, cookies: &[StoredCookie]) -> AppResult<()> {
        let params: Vec<_> = cookies
            .iter()
            .filter_map(|c| match c.to_param() {
                Ok(param) => Some(param),
                Err(e) => {
                    warn!("忽略无效 Cookie {}: {}", c.name, e);
                    None
                }
            })
            .collect();
        self.page().set_cookies(params).await?;
        info!("✅ Cookie 已成功加载");
        Ok(())
    }

    async fn export_cookies(&self) -> AppResult<Vec<StoredCookie>> {
        let cookies = self.page().get_cookies().await?;
        Ok(cookies.iter().map(StoredCookie::from).collect())
    }

    async fn open_listing(&self) -> AppResult<String> {
        self.page().goto(self.listing_url.as_str()).await?;
        self.current_url().await
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.page().url().await?.unwrap_or_default())
    }

    async fn capture_login_challenge(&self) -> AppResult<Option<Vec<u8>>> {
        self.page().execute(EnableParams::default()).await?;
        let mut responses = self.page().event_listener::<EventResponseReceived>().await?;

        self.page().reload().await?;

        let request_id = timeout(QR_CAPTURE_TIMEOUT, async {
            while let Some(event) = responses.next().await {
                if is_qr_challenge_url(&event.response.url) {
                    debug!("截获二维码响应: {}", event.response.url);
                    return Some(event.request_id.clone());
                }
            }
            None
        })
        .await
        .ok()
        .flatten();

        match request_id {
            Some(id) => self.read_response_body(id).await,
            None => Ok(None),
        }
    }

    async fn read_rows(&self) -> AppResult<Vec<OrderRow>> {
        if !self
            .executor
            .wait_for(SEL_ROW_ACTIONS, self.timings.listing)
            .await?
        {
            return Err(InvoiceError::timeout("订单列表", self.timings.listing));
        }

        let raw_rows: Vec<RawOrderRow> = self.executor.eval_as(ROWS_SCRIPT).await?;
        let rows = raw_rows
            .into_iter()
            .enumerate()
            .filter_map(|(position, raw)| {
                let label = raw.number_label.clone();
                let row = OrderRow::from_raw(raw, position);
                if row.is_none() {
                    warn!("第 {} 行无法识别订单号: {:?}", position + 1, label);
                }
                row
            })
            .collect();
        Ok(rows)
    }

    async fn current_page_label(&self) -> AppResult<Option<String>> {
        self.executor.eval_as(PAGE_LABEL_SCRIPT).await
    }

    async fn has_next_page(&self) -> AppResult<bool> {
        self.executor.exists(SEL_NEXT_PAGE).await
    }

    async fn jump_to_page(&self, page_no: u32) -> AppResult<()> {
        if !self
            .executor
            .wait_for(SEL_PAGE_INPUT, self.timings.listing)
            .await?
        {
            return Err(InvoiceError::timeout("分页输入框", self.timings.listing));
        }
        let submitted: bool = self.executor.eval_as(jump_page_script(page_no)).await?;
        if !submitted {
            return Err(InvoiceError::detail_unavailable(
                self.listing_url.clone(),
                "找不到分页表单",
            ));
        }
        self.page().wait_for_navigation().await?;
        debug!("已跳转到第 {} 页", page_no);
        Ok(())
    }

    async fn inspect_detail(&self, detail_url: &str) -> AppResult<DetailSnapshot> {
        let guard = self.open_secondary(detail_url).await?;
        let detail = JsExecutor::new(Page::clone(&guard));

        let result: AppResult<DetailSnapshot> = async {
            if !detail.wait_for(SEL_DETAIL_CORE, self.timings.detail).await? {
                return Err(InvoiceError::detail_unavailable(
                    detail_url,
                    format!("{:?} 内未加载详情内容", self.timings.detail),
                ));
            }
            detail.eval_as::<DetailSnapshot>(DETAIL_SNAPSHOT_SCRIPT).await
        }
        .await;

        guard.close_quietly().await;
        result
    }

    async fn request_reissue(
        &self,
        row: &OrderRow,
        company: &CompanyProfile,
    ) -> AppResult<ReissueOutcome> {
        let known = self.target_ids().await?;

        let clicked: bool = self
            .executor
            .eval_as(click_reissue_script(row.position))
            .await?;
        if !clicked {
            return Ok(ReissueOutcome::FormUnavailable("列表中找不到换开按钮".into()));
        }
        self.pacer.rest().await;

        if let Some(message) = self.dismiss_blocking_dialog().await? {
            self.close_new_pages(&known).await;
            return Ok(ReissueOutcome::Rejected(message));
        }

        let popup = PageGuard::new(self.wait_for_popup(&known).await?, "换开申请");
        let outcome = match self.fill_reissue_form(&popup, &row.order_id, company).await {
            Ok(()) => ReissueOutcome::Submitted,
            Err(e) => {
                warn!("无法直接换开 {}: {}", row.order_id, e);
                ReissueOutcome::FormUnavailable(e.to_string())
            }
        };
        self.pacer.rest().await;
        popup.close_quietly().await;
        Ok(outcome)
    }

    async fn locate_invoice(&self, detail_url: &str) -> AppResult<InvoiceLink> {
        let guard = self.open_secondary(detail_url).await?;
        let detail = JsExecutor::new(Page::clone(&guard));

        let result: AppResult<InvoiceLink> = async {
            sleep(RENDER_WAIT).await;

            let payee_title: Option<String> = detail.eval_as(PAYEE_TITLE_SCRIPT).await?;
            let payee_title = payee_title
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| InvoiceError::detail_unavailable(detail_url, "未找到发票抬头"))?;

            if !detail
                .wait_for(SEL_DOWNLOAD_TRIGGER, DOWNLOAD_TRIGGER_TIMEOUT)
                .await?
            {
                return Err(InvoiceError::detail_unavailable(detail_url, "未找到下载按钮"));
            }
            let href: Option<String> = detail.eval_as(DOWNLOAD_HREF_SCRIPT).await?;
            let href =
                href.ok_or_else(|| InvoiceError::detail_unavailable(detail_url, "下载链接为空"))?;

            Ok(InvoiceLink { payee_title, href })
        }
        .await;

        guard.close_quietly().await;
        result
    }
}
