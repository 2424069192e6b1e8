/// 订单文件下载客户端
///
/// 只负责一次 GET：把订单 CSV 下载到本地
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, DownloadError};

pub struct OrdersClient {
    http: reqwest::Client,
    orders_url: String,
}

impl OrdersClient {
    /// 创建新的下载客户端
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            orders_url: config.orders_url.clone(),
        })
    }

    /// 下载订单文件
    ///
    /// # 参数
    /// - `dest`: 保存路径
    /// - `overwrite`: 目标已存在时是否覆盖；为 false 时返回 `AlreadyExists`
    ///
    /// # 返回
    /// 返回写入的字节数
    pub async fn download(&self, dest: &Path, overwrite: bool) -> Result<usize> {
        if !overwrite && dest.exists() {
            return Err(AppError::from(DownloadError::AlreadyExists {
                path: dest.to_path_buf(),
            })
            .into());
        }

        info!("⬇️ 正在下载订单文件: {}", self.orders_url);

        let response = self
            .http
            .get(&self.orders_url)
            .send()
            .await
            .with_context(|| format!("请求失败: {}", self.orders_url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::from(DownloadError::BadStatus {
                url: self.orders_url.clone(),
                status: status.as_u16(),
            })
            .into());
        }

        let bytes = response.bytes().await?;
        debug!("下载完成: {} 字节", bytes.len());

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| AppError::write_failed(dest, e))?;

        info!("✓ 订单文件已保存: {}", dest.display());
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 本地一次性 HTTP 服务：对第一个请求回复 `response`
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/orders.csv", addr)
    }

    #[tokio::test]
    async fn test_download_refuses_existing_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("orders.csv");
        std::fs::write(&dest, "old").unwrap();

        let config = Config {
            orders_url: "http://127.0.0.1:9/orders.csv".to_string(),
            ..Default::default()
        };
        let client = OrdersClient::new(&config).unwrap();

        let err = client.download(&dest, false).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Download(DownloadError::AlreadyExists { .. }))
        ));
        // 原文件保持不变
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_download_non_success_status_is_error() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("orders.csv");

        let config = Config {
            orders_url: url,
            ..Default::default()
        };
        let client = OrdersClient::new(&config).unwrap();

        let err = client.download(&dest, true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Download(DownloadError::BadStatus { status: 404, .. }))
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_download_writes_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 36\r\nConnection: close\r\n\r\nOrder number,Head,Body,Legs,Address\n",
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("orders.csv");

        let config = Config {
            orders_url: url,
            ..Default::default()
        };
        let client = OrdersClient::new(&config).unwrap();

        let written = client.download(&dest, true).await.unwrap();
        assert_eq!(written, 36);
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "Order number,Head,Body,Legs,Address\n"
        );
    }
}
