//! 基于 chromiumoxide 的下单站点实现

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::debug;

use crate::infrastructure::PageDriver;
use crate::models::Order;
use crate::services::site::{OrderSite, SubmitOutcome};

/// 页面上用到的选择器
pub mod selectors {
    pub const MODAL_OK_TEXT: &str = "OK";
    pub const HEAD: &str = "#head";
    pub const LEGS: &str = "input[type='number']";
    pub const ADDRESS: &str = "#address";
    pub const ORDER: &str = "#order";
    pub const ORDER_ANOTHER: &str = "#order-another";
    pub const RECEIPT: &str = "#receipt";
    pub const ROBOT_PREVIEW: &str = "#robot-preview-image";
    pub const ERROR_ALERT: &str = ".alert-danger";
}

/// 点击"下单"后等待页面响应的时间
const SUBMIT_SETTLE: Duration = Duration::from_millis(500);

/// 等待文档内图片全部加载
const WAIT_IMAGES_JS: &str = r#"
    (async () => {
        await Promise.all(Array.from(document.images).map(img =>
            img.complete ? Promise.resolve() : new Promise(resolve => {
                img.onload = resolve;
                img.onerror = resolve;
            })
        ));
        return true;
    })()
"#;

/// 真实浏览器中的下单站点
///
/// - `driver`: 下单页面
/// - `render_page`: 专门用来渲染 PDF 的空白标签页，避免破坏下单页面的状态
pub struct ChromeSite {
    driver: PageDriver,
    render_page: Page,
}

impl ChromeSite {
    pub fn new(driver: PageDriver, render_page: Page) -> Self {
        Self {
            driver,
            render_page,
        }
    }

    /// 关闭渲染标签页（下单页面保持原样）
    pub async fn close(&self) -> Result<()> {
        self.render_page.clone().close().await?;
        Ok(())
    }
}

#[async_trait]
impl OrderSite for ChromeSite {
    async fn dismiss_modal(&self) -> Result<()> {
        self.driver
            .click_button_with_text(selectors::MODAL_OK_TEXT)
            .await
    }

    async fn fill_form(&self, order: &Order) -> Result<()> {
        self.driver
            .select_option(selectors::HEAD, &order.head.to_string())
            .await?;
        self.driver.click(&order.body_selector()).await?;
        self.driver
            .fill(selectors::LEGS, &order.legs.to_string())
            .await?;
        self.driver.fill(selectors::ADDRESS, &order.address).await?;
        Ok(())
    }

    async fn submit_order(&self) -> Result<SubmitOutcome> {
        // 上一次点击其实已经成功，只是当时回执还没渲染出来
        if self.driver.exists(selectors::RECEIPT).await? {
            return Ok(SubmitOutcome::Accepted);
        }

        self.driver.click(selectors::ORDER).await?;
        sleep(SUBMIT_SETTLE).await;

        if self.driver.exists(selectors::RECEIPT).await? {
            return Ok(SubmitOutcome::Accepted);
        }

        let reason = self
            .driver
            .text_of(selectors::ERROR_ALERT)
            .await?
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "未出现回执".to_string());
        debug!("下单被拒绝: {}", reason);
        Ok(SubmitOutcome::Rejected { reason })
    }

    async fn receipt_html(&self) -> Result<String> {
        self.driver.inner_html(selectors::RECEIPT).await
    }

    async fn robot_screenshot(&self) -> Result<Vec<u8>> {
        self.driver
            .screenshot_element(selectors::ROBOT_PREVIEW)
            .await
    }

    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>> {
        self.render_page.set_content(html).await?;
        self.render_page.evaluate(WAIT_IMAGES_JS).await?;

        let params = PrintToPdfParams {
            print_background: Some(true),
            ..Default::default()
        };
        let pdf = self.render_page.pdf(params).await?;
        Ok(pdf)
    }

    async fn order_another(&self) -> Result<()> {
        self.driver.click(selectors::ORDER_ANOTHER).await
    }
}
