use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, BrowserError};

/// 启动浏览器并导航到指定 URL
///
/// # 参数
/// - `url`: 下单页面
/// - `headless`: 是否无头运行
/// - `executable`: 自定义浏览器路径，`None` 时由 chromiumoxide 自动查找
pub async fn launch_browser(
    url: &str,
    headless: bool,
    executable: Option<&str>,
) -> Result<(Browser, Page)> {
    info!("🚀 启动浏览器 (无头: {})...", headless);
    debug!("目标 URL: {}", url);

    let mut builder = BrowserConfig::builder();
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = executable {
        debug!("使用自定义浏览器: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }

    let config = builder
        .args(vec![
            "--disable-gpu",           // 无头模式下禁用 GPU
            "--no-sandbox",            // 容器内运行时没有沙盒权限
            "--disable-dev-shm-usage", // 防止共享内存不足
        ])
        .window_size(1280, 1024)
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            AppError::Browser(BrowserError::LaunchFailed { message: e })
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(BrowserError::LaunchFailed {
            message: e.to_string(),
        })
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page(url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    info!("✅ 浏览器已导航到: {}", url);

    Ok((browser, page))
}
