//! 浏览器接入
//!
//! - `connection`: 连接到已开启调试端口的浏览器
//! - `headless`: 启动新的（默认无头）浏览器

pub mod connection;
pub mod headless;

pub use connection::connect_to_browser_and_page;
pub use headless::launch_browser;

use anyhow::Result;
use chromiumoxide::{Browser, Page};

use crate::config::{BrowserMode, Config};

/// 按配置启动或连接浏览器，并打开下单页面
pub async fn open_browser(config: &Config) -> Result<(Browser, Page)> {
    match config.browser_mode {
        BrowserMode::Launch => {
            launch_browser(
                &config.target_url,
                config.headless,
                config.chrome_executable.as_deref(),
            )
            .await
        }
        BrowserMode::Connect => {
            connect_to_browser_and_page(
                config.browser_debug_port,
                Some(&config.target_url),
                Some("RobotSpareBin"),
            )
            .await
        }
    }
}
