//! Cookie 文件读写 - 业务能力层

use std::path::PathBuf;

use tokio::fs;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::StoredCookie;

/// 登录态持久化
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 读取已保存的 cookie；文件不存在或无法解析时返回 None
    pub async fn load(&self) -> Option<Vec<StoredCookie>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("读取 Cookie 文件失败 {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<StoredCookie>>(&content) {
            Ok(cookies) if !cookies.is_empty() => {
                info!("🍪 已读取 {} 个 Cookie", cookies.len());
                Some(cookies)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Cookie 文件格式错误 {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// 覆盖写入
    pub async fn save(&self, cookies: &[StoredCookie]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(cookies)?;
        fs::write(&self.path, json).await?;
        info!("✅ Cookie 已成功保存 ({} 个)", cookies.len());
        Ok(())
    }
}
