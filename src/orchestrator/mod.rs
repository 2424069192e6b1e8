//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理浏览器资源和运行生命周期
//! - 下载并读取订单
//! - 输出全局统计信息
//!
//! ### `order_processor` - 订单批处理
//! - 按文件顺序逐个处理 `Vec<Order>`
//! - 打包回执目录并核对产物
//!
//! ## 层次关系
//!
//! ```text
//! app (资源 + 生命周期)
//!     ↓
//! order_processor (处理 Vec<Order>)
//!     ↓
//! workflow::OrderFlow (处理单个 Order)
//!     ↓
//! services (能力层：site / receipt / archive / run_log)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```

pub mod app;
pub mod order_processor;

pub use app::App;
pub use order_processor::{process_orders, RunStats};
