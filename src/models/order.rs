//! 订单数据模型

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{AppResult, OrderDataError};

/// 订单 CSV 中必须出现的列
pub const REQUIRED_COLUMNS: [&str; 5] = ["Order number", "Head", "Body", "Legs", "Address"];

/// 一行订单：一台机器人的配置
///
/// 从下载的 CSV 中读取一次，之后只读。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Order {
    #[serde(rename = "Order number")]
    pub order_number: String,
    #[serde(rename = "Head")]
    pub head: u32,
    #[serde(rename = "Body")]
    pub body: u32,
    #[serde(rename = "Legs")]
    pub legs: u32,
    #[serde(rename = "Address")]
    pub address: String,
}

impl Order {
    /// 回执 PDF 文件名
    pub fn receipt_file_name(&self) -> String {
        format!("receipt_{}.pdf", self.order_number)
    }

    /// 机器人截图文件名
    pub fn robot_file_name(&self) -> String {
        format!("robot_{}.png", self.order_number)
    }

    /// 身体部件对应的单选框
    pub fn body_selector(&self) -> String {
        format!("#id-body-{}", self.body)
    }
}

fn order_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid order number pattern"))
}

/// 订单号会直接拼进文件名，只允许字母、数字、下划线和连字符
///
/// `row` 为数据行号（从 1 开始），只用于报错。
pub fn validate_order_number(row: usize, value: &str) -> AppResult<()> {
    if order_number_pattern().is_match(value) {
        Ok(())
    } else {
        Err(OrderDataError::InvalidOrderNumber {
            row,
            value: value.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Order {
        Order {
            order_number: "12".to_string(),
            head: 1,
            body: 2,
            legs: 3,
            address: "Address 123".to_string(),
        }
    }

    #[test]
    fn test_file_names_follow_order_number() {
        let order = sample();
        assert_eq!(order.receipt_file_name(), "receipt_12.pdf");
        assert_eq!(order.robot_file_name(), "robot_12.png");
        assert_eq!(order.body_selector(), "#id-body-2");
    }

    #[test]
    fn test_validate_order_number() {
        assert!(validate_order_number(1, "42").is_ok());
        assert!(validate_order_number(1, "A-7_b").is_ok());
        assert!(validate_order_number(2, "").is_err());
        assert!(validate_order_number(3, "../etc").is_err());
        assert!(validate_order_number(4, "1 2").is_err());
    }
}
