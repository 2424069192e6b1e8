//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 管理整次运行的资源和生命周期：
//!
//! 1. **获取订单**：下载并解析订单 CSV（在打开浏览器之前，数据有问题直接中止）
//! 2. **应用初始化**：运行日志、打开浏览器、创建 `ChromeSite`
//! 3. **处理订单**：委托 `order_processor` 逐个处理并打包
//! 4. **资源清理**：关闭渲染标签页，以及本程序启动的浏览器
//! 5. **全局统计**：输出最终结果

use std::path::Path;

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::clients::OrdersClient;
use crate::config::{BrowserMode, Config};
use crate::infrastructure::PageDriver;
use crate::models::{read_orders, Order};
use crate::orchestrator::order_processor::{self, RunStats};
use crate::services::{ChromeSite, RunLog};
use crate::utils::logging;
use crate::workflow::OrderFlow;

/// 应用主结构
pub struct App {
    config: Config,
    orders: Vec<Order>,
    browser: Browser,
    site: ChromeSite,
}

impl App {
    /// 初始化应用：读取订单，再打开浏览器并进入下单页面
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.log_file_path())?;
        logging::log_startup(&config.target_url, config.submit_max_attempts);

        let orders = get_orders(&config).await?;
        if orders.is_empty() {
            warn!("⚠️ 订单文件中没有数据行");
        }
        logging::log_orders_loaded(orders.len(), &config.orders_file);

        let (browser, page) = open_robot_order_website(&config).await?;

        // 单独的空白标签页，用于渲染 PDF
        let render_page = browser.new_page("about:blank").await?;

        let driver = PageDriver::new(page, config.slow_mo_ms, config.element_timeout_ms);
        let site = ChromeSite::new(driver, render_page);

        Ok(Self {
            config,
            orders,
            browser,
            site,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<RunStats> {
        let result = self.process().await;

        if let Err(e) = self.site.close().await {
            warn!("关闭渲染标签页失败: {}", e);
        }

        // 只关闭自己启动的浏览器，连接模式下保留用户的浏览器
        if self.config.browser_mode == BrowserMode::Launch {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
        }

        let stats = result?;
        logging::print_final_stats(
            stats.processed,
            stats.total,
            stats.attempts,
            &stats.archive_path,
            stats.archive_entries.len(),
        );
        info!("\n日志已保存至: {}", self.config.log_file_path().display());
        Ok(stats)
    }

    async fn process(&self) -> Result<RunStats> {
        let flow = OrderFlow::new(&self.config);
        let run_log = RunLog::new(self.config.log_file_path());

        order_processor::process_orders(
            &self.site,
            &self.orders,
            &flow,
            Some(&run_log),
            &self.config.archive_path(),
            self.config.overwrite,
        )
        .await
    }
}

/// 打开（或连接）浏览器并进入下单页面
pub async fn open_robot_order_website(config: &Config) -> Result<(Browser, chromiumoxide::Page)> {
    info!("🌐 正在打开下单页面: {}", config.target_url);
    browser::open_browser(config).await
}

/// 下载订单文件并读取为订单列表
pub async fn get_orders(config: &Config) -> Result<Vec<Order>> {
    let dest = Path::new(&config.orders_file);
    let client = OrdersClient::new(config)?;
    client.download(dest, config.overwrite).await?;
    read_orders(dest)
}
