/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；未设置时默认 `info`，`verbose` 为真时为 `debug`。
/// 重复调用不会 panic（测试中可能多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径（父目录不存在时自动创建）
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    if let Some(parent) = log_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_header = format!(
        "{}\n机器人订单运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(target_url: &str, max_attempts: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 机器人批量下单");
    info!("🌐 目标页面: {}", target_url);
    info!("🔁 单个订单最多提交 {} 次", max_attempts);
    info!("{}", "=".repeat(60));
}

/// 记录订单加载信息
pub fn log_orders_loaded(total: usize, orders_file: &str) {
    info!("✓ 从 {} 读取到 {} 个订单", orders_file, total);
    info!("📋 将按文件顺序逐个处理\n");
}

/// 打印最终统计信息
///
/// # 参数
/// - `processed`: 完成的订单数量
/// - `total`: 订单总数
/// - `attempts`: 累计提交次数
/// - `archive`: 压缩包路径
/// - `entries`: 压缩包内文件数量
pub fn print_final_stats(
    processed: usize,
    total: usize,
    attempts: u32,
    archive: &Path,
    entries: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 完成订单: {}/{}", processed, total);
    info!("🔁 累计提交次数: {}", attempts);
    info!("📦 压缩包: {} ({} 个文件)", archive.display(), entries);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短地址", 10), "短地址");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_init_log_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run_log.txt");
        init_log_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("机器人订单运行日志"));
    }
}
