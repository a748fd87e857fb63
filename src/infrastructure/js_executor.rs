//! JS 执行器 - 基础设施层
//!
//! 包装一个 Page，只暴露"执行 JS"和"等待元素"的能力

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::AppResult;
use crate::portal::site::exists_script;

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// JS 执行器
///
/// 不认识订单 / 发票，不处理业务流程
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 元素是否存在
    pub async fn exists(&self, selector: &str) -> AppResult<bool> {
        self.eval_as(exists_script(selector)).await
    }

    /// 等待元素出现，超时返回 false
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> AppResult<bool> {
        self.poll_until(selector, timeout, true).await
    }

    /// 等待元素消失，超时返回 false
    pub async fn wait_until_gone(&self, selector: &str, timeout: Duration) -> AppResult<bool> {
        self.poll_until(selector, timeout, false).await
    }

    async fn poll_until(&self, selector: &str, timeout: Duration, present: bool) -> AppResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.exists(selector).await? == present {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                debug!("等待 {} (present={}) 超时 {:?}", selector, present, timeout);
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}
