use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::InvoiceError;
use crate::models::{CompanyProfile, PageLimit};

/// 默认发票列表页
pub const DEFAULT_LISTING_URL: &str = "https://myivc.jd.com/fpzz/index.action";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 发票列表页地址
    pub listing_url: String,
    /// 最大页码（0 表示不限）
    pub max_page_no: u32,
    /// 起始页码
    pub page_num: u32,
    /// 换开目标抬头（单位名称）
    pub company_name: Option<String>,
    /// 换开目标税号
    pub company_tax_no: Option<String>,
    /// 发票保存目录
    pub output_dir: String,
    /// Cookie 保存路径
    pub cookie_path: String,
    /// 登录二维码保存路径
    pub qr_image_path: String,
    // --- 浏览器 ---
    /// 设置后连接到已运行的浏览器，否则启动新浏览器
    pub browser_debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    // --- 等待上限 ---
    pub login_timeout_secs: u64,
    pub login_poll_interval_ms: u64,
    pub popup_timeout_secs: u64,
    pub detail_timeout_ms: u64,
    pub listing_timeout_secs: u64,
    // --- 操作间隔 ---
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            max_page_no: 0,
            page_num: 1,
            company_name: None,
            company_tax_no: None,
            output_dir: "file".to_string(),
            cookie_path: "cookies.json".to_string(),
            qr_image_path: "login.png".to_string(),
            browser_debug_port: None,
            chrome_executable: None,
            headless: true,
            viewport_width: 1440,
            viewport_height: 800,
            login_timeout_secs: 300,
            login_poll_interval_ms: 2000,
            popup_timeout_secs: 10,
            detail_timeout_ms: 5000,
            listing_timeout_secs: 30,
            pacing_min_ms: 500,
            pacing_max_ms: 1500,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> Result<Self> {
        let path = std::env::var("INVOICE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let base = if Path::new(&path).exists() {
            info!("📄 读取配置文件: {}", path);
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取，缺省字段使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 仅从环境变量加载（覆盖默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Self {
        Self {
            listing_url: env_string("LISTING_URL").unwrap_or(self.listing_url),
            max_page_no: env_parse("MAX_PAGE_NO").unwrap_or(self.max_page_no),
            page_num: env_parse("PAGE_NUM").unwrap_or(self.page_num),
            company_name: env_string("COMPANY_NAME").or(self.company_name),
            company_tax_no: env_string("COMPANY_TAX_NO").or(self.company_tax_no),
            output_dir: env_string("OUTPUT_DIR").unwrap_or(self.output_dir),
            cookie_path: env_string("COOKIE_PATH").unwrap_or(self.cookie_path),
            qr_image_path: env_string("QR_IMAGE_PATH").unwrap_or(self.qr_image_path),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            chrome_executable: env_string("CHROME_EXECUTABLE").or(self.chrome_executable),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            login_timeout_secs: env_parse("LOGIN_TIMEOUT_SECS").unwrap_or(self.login_timeout_secs),
            login_poll_interval_ms: self.login_poll_interval_ms,
            popup_timeout_secs: env_parse("POPUP_TIMEOUT_SECS").unwrap_or(self.popup_timeout_secs),
            detail_timeout_ms: env_parse("DETAIL_TIMEOUT_MS").unwrap_or(self.detail_timeout_ms),
            listing_timeout_secs: self.listing_timeout_secs,
            pacing_min_ms: env_parse("PACING_MIN_MS").unwrap_or(self.pacing_min_ms),
            pacing_max_ms: env_parse("PACING_MAX_MS").unwrap_or(self.pacing_max_ms),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.page_num == 0 {
            return Err(InvoiceError::Config("起始页码 page_num 必须从 1 开始".into()).into());
        }
        if self.pacing_min_ms > self.pacing_max_ms {
            return Err(InvoiceError::Config(format!(
                "操作间隔配置错误: pacing_min_ms ({}) > pacing_max_ms ({})",
                self.pacing_min_ms, self.pacing_max_ms
            ))
            .into());
        }
        for warning in self.warnings() {
            warn!("⚠️ {}", warning);
        }
        Ok(())
    }

    /// 不影响运行、但容易配错的项
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.company_name.is_some() != self.company_tax_no.is_some() {
            warnings.push("company_name 与 company_tax_no 需同时配置，换开功能已禁用".to_string());
        }
        if self.max_page_no == 1 {
            warnings.push(
                "max_page_no = 1 表示只处理 1 页；如需不限页数请设为 0".to_string(),
            );
        }
        warnings
    }

    /// 换开目标，两项都配置时才启用
    pub fn company(&self) -> Option<CompanyProfile> {
        let name = self.company_name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let tax_no = self.company_tax_no.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(CompanyProfile::new(name, tax_no))
    }

    pub fn page_limit(&self) -> PageLimit {
        PageLimit::from_max_page_no(self.max_page_no)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn login_poll_interval(&self) -> Duration {
        Duration::from_millis(self.login_poll_interval_ms)
    }

    pub fn popup_timeout(&self) -> Duration {
        Duration::from_secs(self.popup_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_timeout_ms)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
