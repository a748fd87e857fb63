/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;
use crate::models::{OrderRow, PageLimit};
use crate::orchestrator::RunStats;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 京东发票下载");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📄 起始页码: {}", config.page_num);
    match config.page_limit() {
        PageLimit::Unbounded => info!("📄 最大页码: 不限"),
        PageLimit::UpTo(max) => info!("📄 最大页码: {}", max),
    }
    match config.company() {
        Some(company) => info!("🏢 换开抬头: {} ({})", company.name, company.tax_no),
        None => info!("🏢 换开抬头: 未配置"),
    }
    info!("{}", "=".repeat(60));
}

/// 以表格形式输出本页订单
///
/// # 参数
/// - `rows`: 本页读取到的订单行
pub fn log_rows_table(rows: &[OrderRow]) {
    if rows.is_empty() {
        return;
    }
    info!("{}", "─".repeat(60));
    info!("{:<4} {:<16} {:<10} {}", "#", "订单号", "状态", "操作");
    for (index, row) in rows.iter().enumerate() {
        info!(
            "{:<4} {:<16} {:<10} {}",
            index + 1,
            row.order_id,
            truncate_text(&row.status_text, 8),
            row.action_label.as_deref().unwrap_or("-")
        );
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "📄 已处理页码: {:?}（读取失败 {} 页）",
        stats.visited_pages, stats.failed_pages
    );
    info!("📦 订单总数: {}", stats.orders_seen());
    info!("⬇️ 本次下载: {}", stats.downloaded);
    info!("✅ 已存在: {}", stats.already_present);
    info!(
        "🔁 换开已提交: {}，未换开: {}",
        stats.reissue_submitted, stats.reissue_skipped
    );
    info!(
        "⭕️ 待申请: {}，❌ 无法开票: {}",
        stats.request_pending, stats.not_issuable
    );
    if stats.unknown_status > 0 || stats.no_link > 0 {
        info!(
            "⚠️ 未知状态: {}，无下载链接: {}",
            stats.unknown_status, stats.no_link
        );
    }
    if !stats.failed_orders.is_empty() {
        info!("❌ 需手动处理的订单: {}", stats.failed_orders.join(", "));
    }
    info!("{}", "=".repeat(60));
    info!("\n发票已保存至: {}", config.output_path().display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
