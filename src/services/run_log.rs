//! 运行日志写入服务 - 业务能力层
//!
//! 只负责往运行日志文件追加一行，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::workflow::OrderOutcome;

/// 运行日志写入服务
pub struct RunLog {
    log_file_path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    /// 记录一个已完成的订单
    pub fn record(&self, outcome: &OrderOutcome) -> Result<()> {
        debug!("写入运行日志: 订单 {}", outcome.order_number);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)?;

        let line = format!(
            "{} | 订单 {} | 提交 {} 次 | 回执: {} | 截图: {}\n",
            chrono::Local::now().format("%H:%M:%S"),
            outcome.order_number,
            outcome.attempts,
            outcome.receipt_path.display(),
            outcome.robot_path.display()
        );

        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_log.txt");
        let log = RunLog::new(path.clone());

        for number in ["1", "2"] {
            log.record(&OrderOutcome {
                order_number: number.to_string(),
                attempts: 2,
                receipt_path: PathBuf::from(format!("receipt_{}.pdf", number)),
                robot_path: PathBuf::from(format!("robots/robot_{}.png", number)),
            })
            .unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("订单 1 | 提交 2 次"));
        assert!(lines[1].contains("receipt_2.pdf"));
    }
}
