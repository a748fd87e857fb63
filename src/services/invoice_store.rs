//! 发票文件目录 - 业务能力层
//!
//! 本地是否存在 `{抬头}-{订单号}.pdf` 是订单完成的唯一标记

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::AppResult;

const PDF_EXT: &str = ".pdf";
const STAGING_EXT: &str = ".part";

/// 发票文件目录
#[derive(Debug, Clone)]
pub struct InvoiceStore {
    root: PathBuf,
}

impl InvoiceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 确保目录存在，返回绝对路径
    pub async fn ensure_dir(&self) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.root).await?;
        Ok(fs::canonicalize(&self.root).await?)
    }

    /// 目录中是否已有该订单的发票
    pub async fn contains(&self, order_id: &str) -> AppResult<bool> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if matches_order(&name, order_id) {
                debug!("订单 {} 已有发票文件: {}", order_id, name);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 发票最终路径
    pub fn path_for(&self, payee_title: &str, order_id: &str) -> PathBuf {
        self.root.join(invoice_file_name(payee_title, order_id))
    }

    /// 下载过程中使用的临时路径，完成后再改名
    pub fn staging_path(target: &Path) -> PathBuf {
        let mut name = target.as_os_str().to_owned();
        name.push(STAGING_EXT);
        PathBuf::from(name)
    }

    /// 临时文件改名为最终文件
    pub async fn commit(staging: &Path, target: &Path) -> AppResult<()> {
        fs::rename(staging, target).await?;
        Ok(())
    }

    /// 删除未完成的临时文件（不存在时忽略）
    pub async fn discard(staging: &Path) {
        if let Err(e) = fs::remove_file(staging).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("删除临时文件失败 {}: {}", staging.display(), e);
            }
        }
    }
}

/// `{抬头}-{订单号}.pdf`，抬头中不能出现在文件名里的字符替换为 `_`
pub fn invoice_file_name(payee_title: &str, order_id: &str) -> String {
    let title: String = payee_title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}-{}{}", title, order_id, PDF_EXT)
}

/// 文件名以 .pdf 结尾，且包含完整的订单号（前后不是数字）
pub fn matches_order(file_name: &str, order_id: &str) -> bool {
    if order_id.is_empty() || !file_name.ends_with(PDF_EXT) {
        return false;
    }
    let bytes = file_name.as_bytes();
    file_name.match_indices(order_id).any(|(start, m)| {
        let end = start + m.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_digit();
        let after_ok = end >= bytes.len() || !bytes[end].is_ascii_digit();
        before_ok && after_ok
    })
}
