use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::{AppError, OrderDataError};
use crate::models::order::{validate_order_number, Order, REQUIRED_COLUMNS};

/// 从 CSV 文件读取全部订单（保持文件顺序）
pub fn read_orders(csv_path: &Path) -> Result<Vec<Order>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("无法读取订单文件: {}", csv_path.display()))?;

    let orders = parse_orders(file)
        .with_context(|| format!("无法解析订单文件: {}", csv_path.display()))?;

    tracing::info!(
        "成功加载 {} 个订单: {}",
        orders.len(),
        csv_path.file_name().unwrap_or_default().to_string_lossy()
    );

    Ok(orders)
}

/// 解析订单 CSV
///
/// 表头必须包含全部必需列（多余列忽略，列顺序不限）。
/// 订单号在文件内必须唯一。
pub fn parse_orders<R: Read>(reader: R) -> Result<Vec<Order>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(AppError::from(OrderDataError::MissingColumn {
                column: column.to_string(),
            })
            .into());
        }
    }

    let mut orders = Vec::new();
    let mut seen = HashSet::new();
    for (index, record) in csv_reader.deserialize::<Order>().enumerate() {
        let row = index + 1;
        let order = record.with_context(|| format!("第 {} 行数据格式错误", row))?;
        validate_order_number(row, &order.order_number)?;
        if !seen.insert(order.order_number.clone()) {
            return Err(AppError::from(OrderDataError::DuplicateOrderNumber {
                row,
                value: order.order_number,
            })
            .into());
        }
        orders.push(order);
    }

    Ok(orders)
}
