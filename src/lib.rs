//! # Robot Order
//!
//! 自动化批量下单：下载订单 CSV，逐个在网页表单中下单，
//! 保存回执 PDF 与机器人截图，合成后打包成 zip。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 唯一的 page owner，提供点击、填写、读取、截图
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个订单
//! - `OrderSite` / `ChromeSite` - 下单站点能力
//! - `ReceiptService` - 回执 PDF、截图、合成
//! - `archive_service` - 打包与核对
//! - `RunLog` - 写运行日志
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个订单"的完整处理流程
//! - `OrderCtx` - 上下文封装（订单号 + 位置）
//! - `OrderFlow` - 流程编排（弹窗 → 填表 → 提交 → 回执 → 下一单）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 资源管理与运行生命周期
//! - `orchestrator/order_processor` - 逐个处理订单并打包

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::PageDriver;
pub use models::Order;
pub use orchestrator::{process_orders, App, RunStats};
pub use services::{ChromeSite, OrderSite, SubmitOutcome};
pub use workflow::{OrderCtx, OrderFlow, OrderOutcome};
