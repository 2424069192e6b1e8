//! 错误类型
//!
//! 大部分函数直接返回 `anyhow::Result`，出错即中止整个运行。
//! 这里只定义程序自己需要主动报告的那几类错误。

use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 订单文件下载错误
    #[error("下载错误: {0}")]
    Download(#[from] DownloadError),
    /// 订单数据错误
    #[error("订单数据错误: {0}")]
    OrderData(#[from] OrderDataError),
    /// 订单提交错误
    #[error("提交错误: {0}")]
    Submit(#[from] SubmitError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {message}")]
    LaunchFailed { message: String },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {message}")]
    ConnectionFailed { port: u16, message: String },
    /// 等待元素超时
    #[error("等待元素 {selector} 超时 ({timeout_ms}ms)")]
    ElementTimeout { selector: String, timeout_ms: u64 },
    /// 元素没有可读取的内容
    #[error("元素 {selector} 内容为空")]
    EmptyElement { selector: String },
}

/// 订单文件下载错误
#[derive(Debug, Error)]
pub enum DownloadError {
    /// 服务器返回非 2xx 状态码
    #[error("下载 {url} 失败: HTTP {status}")]
    BadStatus { url: String, status: u16 },
    /// 目标文件已存在且不允许覆盖
    #[error("文件已存在且未开启覆盖: {}", .path.display())]
    AlreadyExists { path: PathBuf },
}

/// 订单数据错误
#[derive(Debug, Error)]
pub enum OrderDataError {
    /// CSV 缺少必需列
    #[error("CSV 缺少列: {column}")]
    MissingColumn { column: String },
    /// 订单号为空或包含不能用于文件名的字符
    #[error("第 {row} 行订单号无效: '{value}'")]
    InvalidOrderNumber { row: usize, value: String },
    /// 订单号与前面的行重复（回执文件名会冲突）
    #[error("第 {row} 行订单号重复: '{value}'")]
    DuplicateOrderNumber { row: usize, value: String },
}

/// 订单提交错误
#[derive(Debug, Error)]
pub enum SubmitError {
    /// 重试次数用尽仍未成功
    #[error("订单 {order_number} 提交 {attempts} 次均失败，最后一次原因: {last_error}")]
    RetriesExhausted {
        order_number: String,
        attempts: u32,
        last_error: String,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 写入文件失败
    #[error("写入文件失败 ({}): {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 文件已存在且不允许覆盖
    #[error("文件已存在且未开启覆盖: {}", .path.display())]
    AlreadyExists { path: PathBuf },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置项取值无效
    #[error("配置项 {field} 取值无效: '{value}'")]
    InvalidValue { field: String, value: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建元素等待超时错误
    pub fn element_timeout(selector: impl Into<String>, timeout_ms: u64) -> Self {
        AppError::Browser(BrowserError::ElementTimeout {
            selector: selector.into(),
            timeout_ms,
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件已存在错误
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        AppError::File(FileError::AlreadyExists { path: path.into() })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_message() {
        let err: AppError = SubmitError::RetriesExhausted {
            order_number: "7".to_string(),
            attempts: 3,
            last_error: "External Server Error".to_string(),
        }
        .into();

        let msg = err.to_string();
        assert!(msg.contains("订单 7"));
        assert!(msg.contains("3 次"));
        assert!(msg.contains("External Server Error"));
    }

    #[test]
    fn test_downcast_from_anyhow() {
        let err: anyhow::Error = AppError::element_timeout("#receipt", 500).into();
        match err.downcast_ref::<AppError>() {
            Some(AppError::Browser(BrowserError::ElementTimeout { selector, .. })) => {
                assert_eq!(selector, "#receipt");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
