//! 程序配置
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::{AppError, ConfigError};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "robot_order.toml";

/// 浏览器接入方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserMode {
    /// 启动新的浏览器进程
    Launch,
    /// 连接到已开启调试端口的浏览器
    Connect,
}

impl std::str::FromStr for BrowserMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "launch" => Ok(BrowserMode::Launch),
            "connect" => Ok(BrowserMode::Connect),
            other => Err(AppError::Config(ConfigError::InvalidValue {
                field: "browser_mode".to_string(),
                value: other.to_string(),
            })),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 下单页面 URL
    pub target_url: String,
    /// 订单 CSV 下载地址
    pub orders_url: String,
    /// 订单 CSV 保存路径
    pub orders_file: String,
    /// 输出根目录
    pub output_dir: String,
    /// 是否覆盖已存在的文件
    pub overwrite: bool,
    /// 浏览器接入方式
    pub browser_mode: BrowserMode,
    /// 浏览器调试端口（connect 模式）
    pub browser_debug_port: u16,
    /// 是否无头运行（launch 模式）
    pub headless: bool,
    /// 自定义浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 每次页面交互后的等待时间
    pub slow_mo_ms: u64,
    /// 等待元素出现的超时时间
    pub element_timeout_ms: u64,
    /// 提交订单最多尝试次数
    pub submit_max_attempts: u32,
    /// 两次提交之间的间隔
    pub submit_retry_delay_ms: u64,
    /// HTTP 请求超时
    pub http_timeout_secs: u64,
    /// 运行日志文件，未设置时为 `<output_dir>/run_log.txt`
    pub output_log_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://robotsparebinindustries.com/#/robot-order".to_string(),
            orders_url: "https://robotsparebinindustries.com/orders.csv".to_string(),
            orders_file: "orders.csv".to_string(),
            output_dir: "output".to_string(),
            overwrite: true,
            browser_mode: BrowserMode::Launch,
            browser_debug_port: 9222,
            headless: true,
            chrome_executable: None,
            slow_mo_ms: 100,
            element_timeout_ms: 5000,
            submit_max_attempts: 10,
            submit_retry_delay_ms: 500,
            http_timeout_secs: 30,
            output_log_file: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 配置文件（可选）+ 环境变量
    ///
    /// 文件路径取自 `ROBOT_ORDER_CONFIG`，未设置时使用当前目录下的
    /// `robot_order.toml`（不存在则直接使用默认值）。
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("ROBOT_ORDER_CONFIG").ok();
        let path = PathBuf::from(explicit.as_deref().unwrap_or(DEFAULT_CONFIG_FILE));

        let base = if path.exists() {
            Self::from_file(&path)?
        } else if explicit.is_some() {
            anyhow::bail!("配置文件不存在: {}", path.display());
        } else {
            Self::default()
        };

        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            target_url: std::env::var("TARGET_URL").unwrap_or(self.target_url),
            orders_url: std::env::var("ORDERS_URL").unwrap_or(self.orders_url),
            orders_file: std::env::var("ORDERS_FILE").unwrap_or(self.orders_file),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(self.output_dir),
            overwrite: env_parse("OVERWRITE").unwrap_or(self.overwrite),
            browser_mode: env_parse("BROWSER_MODE").unwrap_or(self.browser_mode),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(self.browser_debug_port),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(self.chrome_executable),
            slow_mo_ms: env_parse("SLOW_MO_MS").unwrap_or(self.slow_mo_ms),
            element_timeout_ms: env_parse("ELEMENT_TIMEOUT_MS").unwrap_or(self.element_timeout_ms),
            submit_max_attempts: env_parse("SUBMIT_MAX_ATTEMPTS").unwrap_or(self.submit_max_attempts),
            submit_retry_delay_ms: env_parse("SUBMIT_RETRY_DELAY_MS").unwrap_or(self.submit_retry_delay_ms),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS").unwrap_or(self.http_timeout_secs),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").ok().or(self.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    /// 检查配置取值
    pub fn validate(&self) -> Result<(), AppError> {
        if self.submit_max_attempts == 0 {
            return Err(AppError::Config(ConfigError::InvalidValue {
                field: "submit_max_attempts".to_string(),
                value: "0".to_string(),
            }));
        }
        for (field, value) in [("target_url", &self.target_url), ("orders_url", &self.orders_url)] {
            if value.trim().is_empty() {
                return Err(AppError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                }));
            }
        }
        Ok(())
    }

    /// 回执 PDF 目录
    pub fn receipts_dir(&self) -> PathBuf {
        Path::new(&self.output_dir).join("receipts")
    }

    /// 机器人截图目录
    pub fn robots_dir(&self) -> PathBuf {
        self.receipts_dir().join("robots")
    }

    /// 最终压缩包路径
    pub fn archive_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join("receipts.zip")
    }

    /// 运行日志路径
    pub fn log_file_path(&self) -> PathBuf {
        match &self.output_log_file {
            Some(path) => PathBuf::from(path),
            None => Path::new(&self.output_dir).join("run_log.txt"),
        }
    }
}

/// 读取并解析环境变量，缺失或无法解析时返回 None
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 环境变量是进程级的，读写它的测试要串行
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(config.receipts_dir(), Path::new("output").join("receipts"));
        assert_eq!(
            config.robots_dir(),
            Path::new("output").join("receipts").join("robots")
        );
        assert_eq!(config.archive_path(), Path::new("output").join("receipts.zip"));
        assert_eq!(config.log_file_path(), Path::new("output").join("run_log.txt"));
        assert!(config.overwrite);
        assert_eq!(config.slow_mo_ms, 100);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml_str(
            r#"
            output_dir = "build/out"
            browser_mode = "connect"
            submit_max_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, "build/out");
        assert_eq!(config.browser_mode, BrowserMode::Connect);
        assert_eq!(config.submit_max_attempts, 3);
        // 未写的字段保持默认值
        assert_eq!(config.orders_file, "orders.csv");
        assert!(config.headless);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = Config {
            submit_max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_browser_mode_from_str() {
        assert_eq!("Launch".parse::<BrowserMode>().unwrap(), BrowserMode::Launch);
        assert_eq!(" connect ".parse::<BrowserMode>().unwrap(), BrowserMode::Connect);
        assert!("remote".parse::<BrowserMode>().is_err());
    }

    #[test]
    fn test_log_file_follows_output_dir() {
        let config = Config {
            output_dir: "build".to_string(),
            ..Default::default()
        };
        assert_eq!(config.log_file_path(), Path::new("build").join("run_log.txt"));

        let config = Config {
            output_dir: "build".to_string(),
            output_log_file: Some("logs/run.txt".to_string()),
            ..Default::default()
        };
        assert_eq!(config.log_file_path(), Path::new("logs/run.txt"));
    }

    #[test]
    fn test_env_overrides_and_unparsable_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("SUBMIT_MAX_ATTEMPTS", "abc");
        std::env::set_var("OVERWRITE", "false");
        std::env::set_var("OUTPUT_DIR", "build");

        let config = Config::from_env();

        std::env::remove_var("SUBMIT_MAX_ATTEMPTS");
        std::env::remove_var("OVERWRITE");
        std::env::remove_var("OUTPUT_DIR");

        // 无法解析的值回落到默认值
        assert_eq!(config.submit_max_attempts, 10);
        assert!(!config.overwrite);
        assert_eq!(config.output_dir, "build");
        assert_eq!(config.log_file_path(), Path::new("build").join("run_log.txt"));
    }
}
