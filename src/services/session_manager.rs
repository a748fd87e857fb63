//! 登录态管理 - 业务能力层
//!
//! 先用已保存的 cookie 恢复登录，失败时走扫码登录，成功后重新保存 cookie

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{AppResult, InvoiceError};
use crate::portal::InvoicePortal;
use crate::services::CookieStore;

/// 已登录的会话
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    /// 是否由已保存的 cookie 直接恢复
    pub restored_from_cache: bool,
}

/// 登录态管理
pub struct SessionManager {
    listing_url: String,
    cookie_store: CookieStore,
    qr_image_path: PathBuf,
    poll_interval: Duration,
    login_timeout: Duration,
    open_viewer: bool,
}

impl SessionManager {
    pub fn new(config: &Config) -> Self {
        Self {
            listing_url: config.listing_url.clone(),
            cookie_store: CookieStore::new(&config.cookie_path),
            qr_image_path: PathBuf::from(&config.qr_image_path),
            poll_interval: config.login_poll_interval(),
            login_timeout: config.login_timeout(),
            open_viewer: true,
        }
    }

    /// 自定义轮询间隔与等待上限
    pub fn with_timing(mut self, poll_interval: Duration, login_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.login_timeout = login_timeout;
        self
    }

    /// 是否用系统默认程序打开二维码
    pub fn with_viewer(mut self, open_viewer: bool) -> Self {
        self.open_viewer = open_viewer;
        self
    }

    /// 建立登录态
    pub async fn establish(&self, portal: &dyn InvoicePortal) -> AppResult<Session> {
        let mut restored = false;
        if let Some(cookies) = self.cookie_store.load().await {
            match portal.apply_cookies(&cookies).await {
                Ok(()) => restored = true,
                Err(e) => warn!("加载 Cookie 时出错: {}", e),
            }
        }

        let landed = portal
            .open_listing()
            .await
            .map_err(|e| InvoiceError::AuthenticationFailure(format!("无法打开发票列表页: {}", e)))?;

        if is_listing_url(&landed, &self.listing_url) {
            info!(" ✅ 登录成功（使用已保存的 Cookie）");
            self.persist_cookies(portal).await;
            return Ok(Session {
                authenticated: true,
                restored_from_cache: restored,
            });
        }

        warn!(" ❌ 未登录, 需要登录");
        debug!("被重定向到: {}", landed);
        self.present_login_challenge(portal).await;
        self.wait_for_login(portal).await?;

        info!(" ✅ 登录成功");
        self.persist_cookies(portal).await;
        Ok(Session {
            authenticated: true,
            restored_from_cache: false,
        })
    }

    /// 截获二维码并打开
    async fn present_login_challenge(&self, portal: &dyn InvoicePortal) {
        match portal.capture_login_challenge().await {
            Ok(Some(image)) => {
                if let Err(e) = tokio::fs::write(&self.qr_image_path, &image).await {
                    error!("保存二维码失败 {}: {}", self.qr_image_path.display(), e);
                    return;
                }
                info!(" 📱 请使用京东 App 扫描二维码: {}", self.qr_image_path.display());
                if self.open_viewer {
                    open_image(&self.qr_image_path);
                }
            }
            Ok(None) => warn!("未截获登录二维码，请在浏览器中手动登录"),
            Err(e) => warn!("获取登录二维码失败: {}，请在浏览器中手动登录", e),
        }
    }

    /// 轮询当前地址直到回到列表页
    async fn wait_for_login(&self, portal: &dyn InvoicePortal) -> AppResult<()> {
        let deadline = Instant::now() + self.login_timeout;
        loop {
            match portal.current_url().await {
                Ok(url) if is_listing_url(&url, &self.listing_url) => return Ok(()),
                Ok(url) => debug!("等待登录，当前地址: {}", url),
                Err(e) => debug!("读取当前地址失败: {}", e),
            }
            if Instant::now() >= deadline {
                return Err(InvoiceError::AuthenticationTimeout(self.login_timeout));
            }
            sleep(self.poll_interval).await;
        }
    }

    /// 每次登录成功后都覆盖保存
    async fn persist_cookies(&self, portal: &dyn InvoicePortal) {
        match portal.export_cookies().await {
            Ok(cookies) => {
                if let Err(e) = self.cookie_store.save(&cookies).await {
                    error!("保存 Cookie 时出错: {}", e);
                }
            }
            Err(e) => error!("读取 Cookie 时出错: {}", e),
        }
    }
}

/// 比较协议、主机和路径，忽略查询参数与锚点
pub fn is_listing_url(current: &str, listing: &str) -> bool {
    match (Url::parse(current), Url::parse(listing)) {
        (Ok(a), Ok(b)) => {
            a.scheme() == b.scheme()
                && a.host_str() == b.host_str()
                && a.port_or_known_default() == b.port_or_known_default()
                && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
        }
        _ => current == listing,
    }
}

/// 用系统默认程序打开图片
fn open_image(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        let mut c = tokio::process::Command::new("open");
        c.arg(path);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    } else if std::env::var("XDG_CURRENT_DESKTOP").as_deref() == Ok("GNOME") {
        let mut c = tokio::process::Command::new("gnome-open");
        c.arg(path);
        c
    } else {
        let mut c = tokio::process::Command::new("xdg-open");
        c.arg(path);
        c
    };

    if let Err(e) = command.spawn() {
        warn!("无法打开二维码图片 {}: {}，请手动打开", path.display(), e);
    }
}
