//! # JD Invoice Fetcher
//!
//! 一个用于批量下载京东订单发票的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动或连接 Chrome
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 主页面的 eval() 能力
//! - `PageGuard` - 辅助页面用完即关
//!
//! ### ② 站点层（Portal）
//! - `portal/` - `InvoicePortal` trait，描述"站点上能做什么"
//! - `ChromePortal` - 基于 chromiumoxide 的实现
//! - `site` - 选择器与页面脚本
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个订单
//! - `classify` - 订单状态判断
//! - `ReissueResolver` - 是否需要换开、提交换开
//! - `DownloadOrchestrator` - 下载发票并落盘
//! - `SessionManager` - Cookie 恢复 / 扫码登录
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个订单"的完整处理流程
//! - `OrderCtx` - 上下文封装（页码 + 序号 + 订单号）
//! - `OrderFlow` - 流程编排（已存在 → 判断 → 换开 / 下载）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/app` - 应用入口，管理资源和登录
//! - `orchestrator/listing_walker` - 逐页遍历列表
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod portal;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppResult, InvoiceError};
pub use models::{Disposition, OrderRow, PageCursor, PageLimit};
pub use orchestrator::{App, ListingWalker, RunStats};
pub use portal::{ChromePortal, InvoicePortal};
pub use workflow::{OrderCtx, OrderFlow, OrderOutcome};
