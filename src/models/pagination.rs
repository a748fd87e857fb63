//! 分页游标

/// 页码上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Unbounded,
    UpTo(u32),
}

impl PageLimit {
    /// 0 表示不限
    pub fn from_max_page_no(max_page_no: u32) -> Self {
        match max_page_no {
            0 => PageLimit::Unbounded,
            n => PageLimit::UpTo(n),
        }
    }

    pub fn exceeded_by(&self, page_no: u32) -> bool {
        match self {
            PageLimit::Unbounded => false,
            PageLimit::UpTo(max) => page_no > *max,
        }
    }
}

/// 当前页码，只增不减
#[derive(Debug, Clone)]
pub struct PageCursor {
    current: u32,
    limit: PageLimit,
}

impl PageCursor {
    pub fn new(start: u32, limit: PageLimit) -> Self {
        Self {
            current: start.max(1),
            limit,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn limit(&self) -> PageLimit {
        self.limit
    }

    /// 前进一页；超过上限时返回 None
    pub fn advance(&mut self) -> Option<u32> {
        self.current += 1;
        if self.limit.exceeded_by(self.current) {
            None
        } else {
            Some(self.current)
        }
    }
}
