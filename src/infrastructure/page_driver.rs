//! 页面驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"点、填、读、截图"这些能力，
//! 不认识订单，也不关心流程。

use std::time::Duration;

use anyhow::Result;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::{Element, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{AppError, BrowserError};

/// 轮询元素的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 页面驱动
pub struct PageDriver {
    page: Page,
    slow_mo: Duration,
    element_timeout: Duration,
}

impl PageDriver {
    pub fn new(page: Page, slow_mo_ms: u64, element_timeout_ms: u64) -> Self {
        Self {
            page,
            slow_mo: Duration::from_millis(slow_mo_ms),
            element_timeout: Duration::from_millis(element_timeout_ms),
        }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 每次交互后的固定等待
    pub async fn pause(&self) {
        if !self.slow_mo.is_zero() {
            sleep(self.slow_mo).await;
        }
    }

    /// 元素当前是否存在
    pub async fn exists(&self, selector: &str) -> Result<bool> {
        let js = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.eval_as(js).await
    }

    /// 等待元素出现，超时返回 `ElementTimeout`
    pub async fn wait_for(&self, selector: &str) -> Result<Element> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(AppError::element_timeout(
                    selector,
                    self.element_timeout.as_millis() as u64,
                )
                .into());
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 点击元素
    pub async fn click(&self, selector: &str) -> Result<()> {
        debug!("点击: {}", selector);
        self.wait_for(selector).await?.click().await?;
        self.pause().await;
        Ok(())
    }

    /// 点击文本为 `text` 的按钮
    pub async fn click_button_with_text(&self, text: &str) -> Result<()> {
        debug!("点击按钮: {}", text);
        let js = format!(
            r#"
            (() => {{
                const wanted = {};
                const button = Array.from(document.querySelectorAll('button'))
                    .find(b => b.textContent.trim() === wanted);
                if (!button) {{
                    return false;
                }}
                button.click();
                return true;
            }})()
            "#,
            serde_json::to_string(text)?
        );

        let deadline = Instant::now() + self.element_timeout;
        loop {
            if self.eval_as::<bool>(js.as_str()).await? {
                self.pause().await;
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::element_timeout(
                    format!("button:text('{}')", text),
                    self.element_timeout.as_millis() as u64,
                )
                .into());
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 选择下拉框选项
    pub async fn select_option(&self, selector: &str, value: &str) -> Result<()> {
        debug!("选择: {} = {}", selector, value);
        self.set_value(selector, value, "HTMLSelectElement", "change")
            .await
    }

    /// 填写输入框
    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        debug!("填写: {} = {}", selector, value);
        self.set_value(selector, value, "HTMLInputElement", "input")
            .await
    }

    /// 通过原生 setter 写值并派发事件，保证页面框架能感知到变更
    async fn set_value(
        &self,
        selector: &str,
        value: &str,
        prototype: &str,
        event: &str,
    ) -> Result<()> {
        self.wait_for(selector).await?;

        let js = set_value_script(selector, value, prototype, event)?;
        if !self.eval_as::<bool>(js).await? {
            return Err(AppError::element_timeout(
                selector,
                self.element_timeout.as_millis() as u64,
            )
            .into());
        }
        self.pause().await;
        Ok(())
    }

    /// 读取元素的文本，元素不存在时返回 None
    pub async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        let js = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                return el ? el.textContent.trim() : null;
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        self.eval_as(js).await
    }

    /// 读取元素的 innerHTML
    pub async fn inner_html(&self, selector: &str) -> Result<String> {
        let element = self.wait_for(selector).await?;
        match element.inner_html().await? {
            Some(html) if !html.trim().is_empty() => Ok(html),
            _ => Err(AppError::Browser(BrowserError::EmptyElement {
                selector: selector.to_string(),
            })
            .into()),
        }
    }

    /// 对单个元素截图（PNG）
    pub async fn screenshot_element(&self, selector: &str) -> Result<Vec<u8>> {
        let element = self.wait_for(selector).await?;
        let bytes = element.screenshot(CaptureScreenshotFormat::Png).await?;
        Ok(bytes)
    }
}

/// 生成写值脚本：先派发 `event`，再补一个 `change`（`event` 本身就是 `change` 时不重复）
fn set_value_script(selector: &str, value: &str, prototype: &str, event: &str) -> Result<String> {
    let extra_change = if event == "change" {
        ""
    } else {
        "el.dispatchEvent(new Event('change', { bubbles: true }));"
    };

    Ok(format!(
        r#"
        (() => {{
            const el = document.querySelector({selector});
            if (!el) {{
                return false;
            }}
            const setter = Object.getOwnPropertyDescriptor({prototype}.prototype, 'value').set;
            setter.call(el, {value});
            el.dispatchEvent(new Event({event}, {{ bubbles: true }}));
            {extra_change}
            return true;
        }})()
        "#,
        selector = serde_json::to_string(selector)?,
        prototype = prototype,
        value = serde_json::to_string(value)?,
        event = serde_json::to_string(event)?,
        extra_change = extra_change,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_fires_single_change_event() {
        let js = set_value_script("#head", "3", "HTMLSelectElement", "change").unwrap();
        assert_eq!(js.matches("dispatchEvent").count(), 1);
        assert!(js.contains(r#"new Event("change""#));
    }

    #[test]
    fn test_input_fires_input_then_change() {
        let js = set_value_script("#address", "Street \"9\"", "HTMLInputElement", "input").unwrap();
        assert_eq!(js.matches("dispatchEvent").count(), 2);
        assert!(js.contains(r#"new Event("input""#));
        assert!(js.contains("new Event('change'"));
        // 值经过 JSON 转义
        assert!(js.contains(r#""Street \"9\"""#));
    }
}
