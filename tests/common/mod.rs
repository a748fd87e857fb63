//! 测试用的脚本化站点与文件传输

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use jd_invoice_fetcher::error::{AppResult, InvoiceError};
use jd_invoice_fetcher::models::{
    CompanyProfile, DetailSnapshot, InvoiceLink, OrderRow, ReissueOutcome, StoredCookie,
};
use jd_invoice_fetcher::portal::InvoicePortal;
use jd_invoice_fetcher::services::{
    DownloadOrchestrator, InvoiceStore, InvoiceTransfer, Pacer, ReissueResolver,
};
use jd_invoice_fetcher::workflow::OrderFlow;

pub const LISTING_URL: &str = "https://myivc.jd.com/fpzz/index.action";
pub const LOGIN_URL: &str = "https://passport.jd.com/new/login.aspx";
pub const PDF_BYTES: &[u8] = b"%PDF-1.4 fake invoice";

pub fn detail_url(order_id: &str) -> String {
    format!("https://myivc.jd.com/fpzz/ivcLoad.action?orderId={}", order_id)
}

pub fn pdf_url(order_id: &str) -> String {
    format!("https://storage.jd.com/invoice/{}.pdf", order_id)
}

/// 已开票行（操作：发票详情）
pub fn issued_row(order_id: &str, position: usize) -> OrderRow {
    OrderRow {
        order_id: order_id.to_string(),
        status_text: "已开票".to_string(),
        action_label: Some("发票详情".to_string()),
        detail_url: Some(detail_url(order_id)),
        position,
    }
}

/// 未开票行；`requestable` 为 true 时操作为"发票申请"
pub fn not_issued_row(order_id: &str, position: usize, requestable: bool) -> OrderRow {
    OrderRow {
        order_id: order_id.to_string(),
        status_text: "未开票".to_string(),
        action_label: requestable.then(|| "发票申请".to_string()),
        detail_url: None,
        position,
    }
}

pub fn snapshot(payee: &str, body_text: &str, actions: &[&str]) -> DetailSnapshot {
    DetailSnapshot {
        payee: Some(payee.to_string()),
        body_text: body_text.to_string(),
        action_labels: actions.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn cookie(name: &str, value: &str) -> StoredCookie {
    StoredCookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: ".jd.com".to_string(),
        path: "/".to_string(),
        expires: -1.0,
        http_only: true,
        secure: true,
        session: true,
        same_site: None,
    }
}

pub fn acme() -> CompanyProfile {
    CompanyProfile::new("ACME Corp", "91110000000000000X")
}

/// 站点调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ApplyCookies(usize),
    ExportCookies,
    OpenListing,
    CurrentUrl,
    CaptureLogin,
    ReadRows(u32),
    PageLabel,
    HasNext,
    Jump(u32),
    Inspect(String),
    Reissue { order_id: String, company: String },
    Locate(String),
}

#[derive(Debug)]
struct State {
    pages: Vec<Vec<OrderRow>>,
    current_page: u32,
    failing_pages: HashSet<u32>,
    broken_details: HashSet<String>,
    details: HashMap<String, DetailSnapshot>,
    invoices: HashMap<String, InvoiceLink>,
    reissue_outcome: ReissueOutcome,
    accepts_cookies: bool,
    cookies_applied: bool,
    logged_in: bool,
    /// 扫码后第几次读取地址时登录成功，None 表示永不
    login_after_polls: Option<usize>,
    polls: usize,
    qr_image: Option<Vec<u8>>,
    session_cookies: Vec<StoredCookie>,
    calls: Vec<Call>,
}

/// 脚本化的发票站点
#[derive(Debug)]
pub struct FakePortal {
    state: Mutex<State>,
}

impl Default for FakePortal {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePortal {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                pages: Vec::new(),
                current_page: 1,
                failing_pages: HashSet::new(),
                broken_details: HashSet::new(),
                details: HashMap::new(),
                invoices: HashMap::new(),
                reissue_outcome: ReissueOutcome::Submitted,
                accepts_cookies: false,
                cookies_applied: false,
                logged_in: true,
                login_after_polls: None,
                polls: 0,
                qr_image: Some(b"\x89PNG fake qr".to_vec()),
                session_cookies: vec![cookie("thor", "fresh")],
                calls: Vec::new(),
            }),
        }
    }

    fn with(self, f: impl FnOnce(&mut State)) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            f(&mut state);
        }
        self
    }

    /// 追加一页订单
    pub fn with_page(self, rows: Vec<OrderRow>) -> Self {
        self.with(|s| s.pages.push(rows))
    }

    pub fn with_failing_page(self, page_no: u32) -> Self {
        self.with(|s| {
            s.failing_pages.insert(page_no);
        })
    }

    pub fn with_detail(self, order_id: &str, snapshot: DetailSnapshot) -> Self {
        self.with(|s| {
            s.details.insert(detail_url(order_id), snapshot);
        })
    }

    /// 打开详情页时浏览器报错（例如导航超时）
    pub fn with_broken_detail(self, order_id: &str) -> Self {
        self.with(|s| {
            s.broken_details.insert(detail_url(order_id));
        })
    }

    pub fn with_invoice(self, order_id: &str, payee_title: &str) -> Self {
        self.with(|s| {
            s.invoices.insert(
                detail_url(order_id),
                InvoiceLink {
                    payee_title: payee_title.to_string(),
                    href: pdf_url(order_id),
                },
            );
        })
    }

    pub fn with_reissue_outcome(self, outcome: ReissueOutcome) -> Self {
        self.with(|s| s.reissue_outcome = outcome)
    }

    /// 未登录；已保存的 cookie 也无效
    pub fn logged_out(self) -> Self {
        self.with(|s| s.logged_in = false)
    }

    /// 未登录，但已保存的 cookie 有效
    pub fn logged_out_accepting_cookies(self) -> Self {
        self.with(|s| {
            s.logged_in = false;
            s.accepts_cookies = true;
        })
    }

    pub fn login_after_polls(self, polls: usize) -> Self {
        self.with(|s| s.login_after_polls = Some(polls))
    }

    pub fn without_qr(self) -> Self {
        self.with(|s| s.qr_image = None)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// 是否有针对该订单的站点调用
    pub fn touched_order(&self, order_id: &str) -> bool {
        let detail = detail_url(order_id);
        self.calls().iter().any(|call| match call {
            Call::Inspect(url) | Call::Locate(url) => *url == detail,
            Call::Reissue { order_id: id, .. } => id == order_id,
            _ => false,
        })
    }

    pub fn read_pages(&self) -> Vec<u32> {
        self.calls()
            .iter()
            .filter_map(|call| match call {
                Call::ReadRows(page) => Some(*page),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl InvoicePortal for FakePortal {
    async fn apply_cookies(&self, cookies: &[StoredCookie]) -> AppResult<()> {
        let mut state = self.record(Call::ApplyCookies(cookies.len()));
        state.cookies_applied = true;
        Ok(())
    }

    async fn export_cookies(&self) -> AppResult<Vec<StoredCookie>> {
        let state = self.record(Call::ExportCookies);
        Ok(state.session_cookies.clone())
    }

    async fn open_listing(&self) -> AppResult<String> {
        let mut state = self.record(Call::OpenListing);
        if state.cookies_applied && state.accepts_cookies {
            state.logged_in = true;
        }
        Ok(if state.logged_in {
            LISTING_URL.to_string()
        } else {
            format!("{}?ReturnUrl=https%3A%2F%2Fmyivc.jd.com", LOGIN_URL)
        })
    }

    async fn current_url(&self) -> AppResult<String> {
        let mut state = self.record(Call::CurrentUrl);
        state.polls += 1;
        if let Some(after) = state.login_after_polls {
            if state.polls >= after {
                state.logged_in = true;
            }
        }
        Ok(if state.logged_in {
            LISTING_URL.to_string()
        } else {
            LOGIN_URL.to_string()
        })
    }

    async fn capture_login_challenge(&self) -> AppResult<Option<Vec<u8>>> {
        let state = self.record(Call::CaptureLogin);
        Ok(state.qr_image.clone())
    }

    async fn read_rows(&self) -> AppResult<Vec<OrderRow>> {
        let page = self.state.lock().unwrap().current_page;
        let state = self.record(Call::ReadRows(page));
        if state.failing_pages.contains(&page) {
            return Err(InvoiceError::timeout("订单列表", Duration::from_secs(30)));
        }
        Ok(state
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    async fn current_page_label(&self) -> AppResult<Option<String>> {
        let state = self.record(Call::PageLabel);
        Ok(Some(state.current_page.to_string()))
    }

    async fn has_next_page(&self) -> AppResult<bool> {
        let state = self.record(Call::HasNext);
        Ok((state.current_page as usize) < state.pages.len())
    }

    async fn jump_to_page(&self, page_no: u32) -> AppResult<()> {
        let mut state = self.record(Call::Jump(page_no));
        if page_no == 0 || page_no as usize > state.pages.len() {
            return Err(InvoiceError::timeout(
                format!("第 {} 页", page_no),
                Duration::from_secs(30),
            ));
        }
        state.current_page = page_no;
        Ok(())
    }

    async fn inspect_detail(&self, detail_url: &str) -> AppResult<DetailSnapshot> {
        let state = self.record(Call::Inspect(detail_url.to_string()));
        if state.broken_details.contains(detail_url) {
            return Err(InvoiceError::Browser(CdpError::Timeout));
        }
        state
            .details
            .get(detail_url)
            .cloned()
            .ok_or_else(|| InvoiceError::detail_unavailable(detail_url, "页面无法加载"))
    }

    async fn request_reissue(
        &self,
        row: &OrderRow,
        company: &CompanyProfile,
    ) -> AppResult<ReissueOutcome> {
        let state = self.record(Call::Reissue {
            order_id: row.order_id.clone(),
            company: company.name.clone(),
        });
        Ok(state.reissue_outcome.clone())
    }

    async fn locate_invoice(&self, detail_url: &str) -> AppResult<InvoiceLink> {
        let state = self.record(Call::Locate(detail_url.to_string()));
        state.invoices.get(detail_url).cloned().ok_or_else(|| {
            InvoiceError::download_unavailable(detail_url, "找不到下载链接")
        })
    }
}

/// 把固定内容写入目标文件
#[derive(Debug, Default)]
pub struct FakeTransfer {
    fetched: Mutex<Vec<String>>,
    failing: bool,
}

impl FakeTransfer {
    pub fn failing() -> Self {
        Self {
            fetched: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvoiceTransfer for FakeTransfer {
    async fn fetch_to(&self, href: &str, dest: &Path) -> AppResult<u64> {
        self.fetched.lock().unwrap().push(href.to_string());
        if self.failing {
            tokio::fs::write(dest, b"%PDF-1.4 trunc").await?;
            return Err(InvoiceError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )));
        }
        tokio::fs::write(dest, PDF_BYTES).await?;
        Ok(PDF_BYTES.len() as u64)
    }
}

/// 用临时目录和假传输组装订单流程
pub fn order_flow(
    root: &Path,
    company: Option<CompanyProfile>,
    transfer: Arc<FakeTransfer>,
) -> OrderFlow {
    let store = InvoiceStore::new(root);
    let downloader = DownloadOrchestrator::new(store.clone(), transfer);
    OrderFlow::new(
        store,
        ReissueResolver::new(company),
        downloader,
        Pacer::disabled(),
    )
}
