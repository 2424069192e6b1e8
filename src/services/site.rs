//! 下单站点能力 - 业务能力层
//!
//! 把"在页面上能做的事"抽象成 trait，流程层只依赖这个 trait，
//! 真实实现是 [`ChromeSite`](crate::services::ChromeSite)。

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Order;

/// 单次点击"下单"之后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 页面出现回执
    Accepted,
    /// 页面报错或没有出现回执
    Rejected { reason: String },
}

/// 下单站点
#[async_trait]
pub trait OrderSite: Send + Sync {
    /// 关闭进入页面时弹出的权利声明弹窗
    async fn dismiss_modal(&self) -> Result<()>;

    /// 按订单填写表单（不提交）
    async fn fill_form(&self, order: &Order) -> Result<()>;

    /// 点击一次"下单"并报告结果
    async fn submit_order(&self) -> Result<SubmitOutcome>;

    /// 回执区域的 HTML
    async fn receipt_html(&self) -> Result<String>;

    /// 机器人预览图截图（PNG）
    async fn robot_screenshot(&self) -> Result<Vec<u8>>;

    /// 把一份完整的 HTML 文档渲染成 PDF
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>>;

    /// 点击"再下一单"，回到空表单
    async fn order_another(&self) -> Result<()>;
}
