//! 产物存储 - 业务能力层
//!
//! 只负责"回执 / 截图写到哪里、能不能覆盖"，不关心内容怎么来的。

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;
use tracing::debug;

use crate::config::Config;
use crate::error::AppError;
use crate::models::Order;

pub struct ArtifactStore {
    receipts_dir: PathBuf,
    robots_dir: PathBuf,
    overwrite: bool,
}

impl ArtifactStore {
    pub fn new(receipts_dir: impl Into<PathBuf>, robots_dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            receipts_dir: receipts_dir.into(),
            robots_dir: robots_dir.into(),
            overwrite,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.receipts_dir(), config.robots_dir(), config.overwrite)
    }

    pub fn receipts_dir(&self) -> &Path {
        &self.receipts_dir
    }

    /// 创建输出目录（已存在时什么也不做）
    pub async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.robots_dir).await?;
        fs::create_dir_all(&self.receipts_dir).await?;
        Ok(())
    }

    pub fn receipt_path(&self, order: &Order) -> PathBuf {
        self.receipts_dir.join(order.receipt_file_name())
    }

    pub fn robot_path(&self, order: &Order) -> PathBuf {
        self.robots_dir.join(order.robot_file_name())
    }

    /// 写入新产物
    ///
    /// 未开启覆盖时，目标已存在返回 `AlreadyExists`。
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if !self.overwrite && fs::try_exists(path).await? {
            return Err(AppError::already_exists(path).into());
        }
        self.replace(path, bytes).await
    }

    /// 原地替换本次运行已经写过的产物
    pub async fn replace(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes)
            .await
            .map_err(|e| AppError::write_failed(path, e))?;
        debug!("已写入 {} ({} 字节)", path.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn order(number: &str) -> Order {
        Order {
            order_number: number.to_string(),
            head: 1,
            body: 1,
            legs: 1,
            address: "Street 1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_paths_follow_order_number() {
        let store = ArtifactStore::new("out/receipts", "out/receipts/robots", true);
        let o = order("17");
        assert_eq!(store.receipt_path(&o), Path::new("out/receipts/receipt_17.pdf"));
        assert_eq!(store.robot_path(&o), Path::new("out/receipts/robots/robot_17.png"));
    }

    #[tokio::test]
    async fn test_write_respects_overwrite_flag() {
        let dir = tempfile::tempdir().unwrap();
        let receipts = dir.path().join("receipts");
        let robots = receipts.join("robots");

        let strict = ArtifactStore::new(&receipts, &robots, false);
        assert_ok!(strict.prepare().await);
        // 重复 prepare 不报错
        assert_ok!(strict.prepare().await);

        let path = strict.receipt_path(&order("1"));
        assert_ok!(strict.write(&path, b"first").await);
        assert_err!(strict.write(&path, b"second").await);
        assert_ok!(strict.replace(&path, b"third").await);
        assert_eq!(std::fs::read(&path).unwrap(), b"third");

        let lenient = ArtifactStore::new(&receipts, &robots, true);
        assert_ok!(lenient.write(&path, b"fourth").await);
        assert_eq!(std::fs::read(&path).unwrap(), b"fourth");
    }

    #[tokio::test]
    async fn test_write_propagates_existence_check_error() {
        let dir = tempfile::tempdir().unwrap();
        // 回执目录其实是个普通文件，存在性检查本身会失败
        let not_a_dir = dir.path().join("receipts");
        std::fs::write(&not_a_dir, b"file").unwrap();

        let strict = ArtifactStore::new(&not_a_dir, not_a_dir.join("robots"), false);
        let path = strict.receipt_path(&order("1"));

        let err = strict.write(&path, b"pdf").await.unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
        assert!(err.downcast_ref::<AppError>().is_none());
    }
}
