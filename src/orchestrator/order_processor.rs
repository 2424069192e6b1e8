//! 订单批处理 - 编排层
//!
//! ## 职责
//!
//! 按文件顺序逐个处理订单，全部完成后打包回执目录。
//!
//! ## 核心功能
//!
//! 1. **准备目录**：创建回执 / 截图目录
//! 2. **遍历订单**：循环处理 `Vec<Order>`，任何一单出错立即中止
//! 3. **运行日志**：每完成一单追加一行
//! 4. **打包归档**：生成 zip 并核对每个订单的产物都在包里

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::models::Order;
use crate::services::{archive_folder_with_zip, verify_artifacts, OrderSite, RunLog};
use crate::workflow::{OrderCtx, OrderFlow, OrderOutcome};

/// 一次运行的统计
#[derive(Debug, Default)]
pub struct RunStats {
    pub total: usize,
    pub processed: usize,
    /// 所有订单累计提交次数
    pub attempts: u32,
    pub archive_path: PathBuf,
    pub archive_entries: Vec<String>,
    pub outcomes: Vec<OrderOutcome>,
}

/// 处理全部订单并打包
///
/// # 参数
/// - `site`: 下单站点
/// - `orders`: 订单（按文件顺序）
/// - `flow`: 单个订单的处理流程
/// - `run_log`: 运行日志（可选）
/// - `archive_path`: 压缩包路径
/// - `overwrite`: 压缩包已存在时是否覆盖
pub async fn process_orders<S: OrderSite + ?Sized>(
    site: &S,
    orders: &[Order],
    flow: &OrderFlow,
    run_log: Option<&RunLog>,
    archive_path: &Path,
    overwrite: bool,
) -> Result<RunStats> {
    flow.store().prepare().await?;

    let total = orders.len();
    let mut stats = RunStats {
        total,
        archive_path: archive_path.to_path_buf(),
        ..Default::default()
    };

    for (index, order) in orders.iter().enumerate() {
        let ctx = OrderCtx::new(order.order_number.clone(), index + 1, total);
        let outcome = flow.run(site, order, &ctx).await?;

        if let Some(log) = run_log {
            log.record(&outcome)?;
        }

        stats.processed += 1;
        stats.attempts += outcome.attempts;
        stats.outcomes.push(outcome);
    }

    stats.archive_entries = archive_receipts(flow.store().receipts_dir(), archive_path, overwrite)?;

    verify_artifacts(
        &stats.archive_entries,
        stats.outcomes.iter().map(|o| o.order_number.as_str()),
    )?;
    info!("✓ 压缩包核对通过: {} 个订单", stats.processed);

    Ok(stats)
}

/// 把回执目录（含截图子目录）打包
pub fn archive_receipts(receipts_dir: &Path, archive_path: &Path, overwrite: bool) -> Result<Vec<String>> {
    info!("\n📦 正在打包回执: {}", receipts_dir.display());
    archive_folder_with_zip(receipts_dir, archive_path, true, overwrite)
}
