//! 订单处理上下文
//!
//! 封装"我正在处理第几页的哪个订单"这一信息

use std::fmt::Display;

/// 订单处理上下文
#[derive(Debug, Clone)]
pub struct OrderCtx {
    /// 页码
    pub page_no: u32,

    /// 订单在本页中的序号（从1开始，仅用于日志显示）
    pub row_index: usize,

    /// 订单号
    pub order_id: String,
}

impl OrderCtx {
    pub fn new(page_no: u32, row_index: usize, order_id: impl Into<String>) -> Self {
        Self {
            page_no,
            row_index,
            order_id: order_id.into(),
        }
    }
}

impl Display for OrderCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[第{}页 #{} 订单 {}]",
            self.page_no, self.row_index, self.order_id
        )
    }
}
