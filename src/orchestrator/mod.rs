//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责资源管理和分页调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、登录、运行）
//! - 持有浏览器资源（经由 `ChromePortal`）
//! - 组装 services 与 `OrderFlow`
//! - 输出全局统计信息
//!
//! ### `listing_walker` - 列表分页处理器
//! - 逐页读取订单行
//! - 对每个订单调用 `OrderFlow`
//! - 按页码上限 / 是否有下一页决定停止
//! - 汇总 `RunStats`
//!
//! ## 层次关系
//!
//! ```text
//! app (登录 + 组装)
//!     ↓
//! listing_walker (处理 Vec<OrderRow>，逐页)
//!     ↓
//! workflow::OrderFlow (处理单个订单)
//!     ↓
//! services (能力层：classify / reissue / download / session)
//!     ↓
//! portal + infrastructure (站点操作：ChromePortal / JsExecutor)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管资源，listing_walker 管分页
//! 2. **资源隔离**：只有编排层持有 Browser
//! 3. **向下依赖**：编排层 → workflow → services → portal
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod listing_walker;

// 重新导出主要类型
pub use app::App;
pub use listing_walker::{ListingWalker, RunStats};
