//! 订单处理流程 - 流程层
//!
//! 核心职责：定义"一个订单"的完整处理流程
//!
//! 流程顺序：
//! 1. 关闭弹窗 → 填写表单
//! 2. 提交（有上限的重试）
//! 3. 回执 PDF → 机器人截图 → 截图合成进 PDF
//! 4. 再下一单

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, SubmitError};
use crate::models::Order;
use crate::services::{ArtifactStore, OrderSite, ReceiptService, SubmitOutcome};
use crate::utils::truncate_text;
use crate::workflow::order_ctx::OrderCtx;

/// 单个订单的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderOutcome {
    pub order_number: String,
    /// 实际提交次数
    pub attempts: u32,
    pub receipt_path: PathBuf,
    pub robot_path: PathBuf,
}

/// 订单处理流程
///
/// - 编排完整的单个订单处理流程
/// - 不持有任何页面资源，只依赖 `OrderSite`
pub struct OrderFlow {
    receipts: ReceiptService,
    max_attempts: u32,
    retry_delay: Duration,
    verbose_logging: bool,
}

impl OrderFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            receipts: ReceiptService::new(ArtifactStore::from_config(config)),
            max_attempts: config.submit_max_attempts.max(1),
            retry_delay: Duration::from_millis(config.submit_retry_delay_ms),
            verbose_logging: config.verbose_logging,
        }
    }

    pub fn with_parts(receipts: ReceiptService, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            receipts,
            max_attempts: max_attempts.max(1),
            retry_delay,
            verbose_logging: false,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        self.receipts.store()
    }

    pub async fn run<S: OrderSite + ?Sized>(
        &self,
        site: &S,
        order: &Order,
        ctx: &OrderCtx,
    ) -> Result<OrderOutcome> {
        self.log_order(ctx, order);

        site.dismiss_modal().await?;
        site.fill_form(order).await?;

        let attempts = self.submit_with_retry(site, ctx).await?;
        info!("{} ✓ 下单成功 (提交 {} 次)", ctx, attempts);

        let receipt = self.receipts.store_receipt_as_pdf(site, order).await?;
        let screenshot = self.receipts.screenshot_robot(site, order).await?;
        self.receipts
            .embed_screenshot_to_receipt(site, &receipt, &screenshot)
            .await?;
        info!("{} 📄 回执已保存: {}", ctx, receipt.pdf_path.display());

        site.order_another().await?;

        Ok(OrderOutcome {
            order_number: order.order_number.clone(),
            attempts,
            receipt_path: receipt.pdf_path,
            robot_path: screenshot.path,
        })
    }

    /// 点击"下单"直到出现回执，最多 `max_attempts` 次
    ///
    /// # 返回
    /// 返回成功时用掉的提交次数；次数用尽返回 `RetriesExhausted`
    pub async fn submit_with_retry<S: OrderSite + ?Sized>(
        &self,
        site: &S,
        ctx: &OrderCtx,
    ) -> Result<u32> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match site.submit_order().await? {
                SubmitOutcome::Accepted => return Ok(attempt),
                SubmitOutcome::Rejected { reason } => {
                    warn!(
                        "{} ⚠️ 第 {}/{} 次提交失败: {}",
                        ctx, attempt, self.max_attempts, reason
                    );
                    last_error = reason;
                }
            }

            if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                sleep(self.retry_delay).await;
            }
        }

        Err(AppError::from(SubmitError::RetriesExhausted {
            order_number: ctx.order_number.clone(),
            attempts: self.max_attempts,
            last_error,
        })
        .into())
    }

    // ========== 日志辅助方法 ==========

    fn log_order(&self, ctx: &OrderCtx, order: &Order) {
        info!("\n{} {}", ctx, "─".repeat(30));
        if self.verbose_logging {
            debug!(
                "{} 头 {} | 身体 {} | 腿 {} | 地址 {}",
                ctx,
                order.head,
                order.body,
                order.legs,
                truncate_text(&order.address, 40)
            );
        }
    }
}
