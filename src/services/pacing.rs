//! 操作间隔 - 业务能力层
//!
//! 在点击、跳转等远程操作之间随机等待，避免请求过快触发风控

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// 随机间隔
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    /// 在 `[min, max)` 内随机等待
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// 不等待（测试用）
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// 抽取一次等待时长
    pub fn next_delay(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min_ms..max_ms))
    }

    pub async fn rest(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_millis(500, 1500)
    }
}
