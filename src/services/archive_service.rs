//! 归档服务 - 业务能力层
//!
//! 把回执目录打成 zip，并核对每个订单的产物都在包里。

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::ZipArchive;

use crate::error::AppError;

/// 将目录打包为 zip
///
/// # 参数
/// - `folder`: 要打包的目录
/// - `archive_path`: 压缩包路径（位于 `folder` 内时会被跳过）
/// - `recursive`: 是否包含子目录
/// - `overwrite`: 压缩包已存在时是否覆盖
///
/// # 返回
/// 返回包内的条目名（相对 `folder`，以 `/` 分隔，已排序）
pub fn archive_folder_with_zip(
    folder: &Path,
    archive_path: &Path,
    recursive: bool,
    overwrite: bool,
) -> Result<Vec<String>> {
    if !overwrite && archive_path.exists() {
        return Err(AppError::already_exists(archive_path).into());
    }

    let mut files = Vec::new();
    collect_files(folder, folder, recursive, archive_path, &mut files)?;
    files.sort();

    if let Some(parent) = archive_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(archive_path)
        .map_err(|e| AppError::write_failed(archive_path, e))?;
    let mut zip_writer = zip::ZipWriter::new(file);
    let options: FileOptions<()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut entries = Vec::with_capacity(files.len());
    for (entry_name, path) in files {
        let data = fs::read(&path).with_context(|| format!("无法读取文件: {}", path.display()))?;
        zip_writer
            .start_file(entry_name.as_str(), options)
            .with_context(|| format!("无法写入压缩包条目: {}", entry_name))?;
        zip_writer.write_all(&data)?;
        debug!("已打包: {}", entry_name);
        entries.push(entry_name);
    }

    zip_writer.finish().context("无法完成压缩包")?;

    info!(
        "📦 已生成压缩包 {} ({} 个文件)",
        archive_path.display(),
        entries.len()
    );
    Ok(entries)
}

fn collect_files(
    root: &Path,
    dir: &Path,
    recursive: bool,
    skip: &Path,
    out: &mut Vec<(String, std::path::PathBuf)>,
) -> Result<()> {
    let read_dir =
        fs::read_dir(dir).with_context(|| format!("无法读取文件夹: {}", dir.display()))?;

    for entry in read_dir {
        let path = entry?.path();
        if path == skip {
            continue;
        }
        if path.is_dir() {
            if recursive {
                collect_files(root, &path, recursive, skip, out)?;
            }
            continue;
        }

        let relative = path.strip_prefix(root)?;
        let entry_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        out.push((entry_name, path));
    }
    Ok(())
}

/// 读取压缩包内的条目名
pub fn list_archive_entries(archive_path: &Path) -> Result<Vec<String>> {
    let file = File::open(archive_path)
        .with_context(|| format!("无法打开压缩包: {}", archive_path.display()))?;
    let archive = ZipArchive::new(file).context("无法解析压缩包")?;

    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    Ok(names)
}

fn artifact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:robots/robot_(?P<robot>[A-Za-z0-9_-]+)\.png|receipt_(?P<receipt>[A-Za-z0-9_-]+)\.pdf)$")
            .expect("valid artifact pattern")
    })
}

/// 压缩包内按订单号归类的产物
#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub receipts: BTreeSet<String>,
    pub robots: BTreeSet<String>,
}

impl ArchiveReport {
    pub fn from_entries<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut report = Self::default();
        for entry in entries {
            if let Some(caps) = artifact_pattern().captures(entry.as_ref()) {
                if let Some(n) = caps.name("receipt") {
                    report.receipts.insert(n.as_str().to_string());
                }
                if let Some(n) = caps.name("robot") {
                    report.robots.insert(n.as_str().to_string());
                }
            }
        }
        report
    }

    /// 缺少回执或截图的条目名
    pub fn missing_for<'a>(&self, order_numbers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing = Vec::new();
        for number in order_numbers {
            if !self.receipts.contains(number) {
                missing.push(format!("receipt_{}.pdf", number));
            }
            if !self.robots.contains(number) {
                missing.push(format!("robots/robot_{}.png", number));
            }
        }
        missing
    }
}

/// 核对每个订单都有回执和截图
pub fn verify_artifacts<'a>(
    entries: &[String],
    order_numbers: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let missing = ArchiveReport::from_entries(entries).missing_for(order_numbers);
    if missing.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("压缩包缺少 {} 个文件: {}", missing.len(), missing.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(folder: &Path) {
        fs::create_dir_all(folder.join("robots")).unwrap();
        fs::write(folder.join("receipt_1.pdf"), b"%PDF-1").unwrap();
        fs::write(folder.join("receipt_2.pdf"), b"%PDF-2").unwrap();
        fs::write(folder.join("robots").join("robot_1.png"), b"png1").unwrap();
        fs::write(folder.join("robots").join("robot_2.png"), b"png2").unwrap();
    }

    #[test]
    fn test_archive_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("receipts");
        seed(&folder);
        let archive = dir.path().join("receipts.zip");

        let entries = archive_folder_with_zip(&folder, &archive, true, true).unwrap();
        assert_eq!(
            entries,
            vec![
                "receipt_1.pdf",
                "receipt_2.pdf",
                "robots/robot_1.png",
                "robots/robot_2.png"
            ]
        );
        assert_eq!(list_archive_entries(&archive).unwrap(), entries);
    }

    #[test]
    fn test_archive_non_recursive_skips_subfolders() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("receipts");
        seed(&folder);
        let archive = dir.path().join("receipts.zip");

        let entries = archive_folder_with_zip(&folder, &archive, false, true).unwrap();
        assert_eq!(entries, vec!["receipt_1.pdf", "receipt_2.pdf"]);
    }

    #[test]
    fn test_archive_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("receipts");
        seed(&folder);
        let archive = dir.path().join("receipts.zip");

        archive_folder_with_zip(&folder, &archive, true, true).unwrap();
        // 覆盖模式下重复打包不报错
        archive_folder_with_zip(&folder, &archive, true, true).unwrap();
        assert!(archive_folder_with_zip(&folder, &archive, true, false).is_err());
    }

    #[test]
    fn test_archive_inside_folder_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("receipts");
        seed(&folder);
        let archive = folder.join("receipts.zip");

        archive_folder_with_zip(&folder, &archive, true, true).unwrap();
        let entries = archive_folder_with_zip(&folder, &archive, true, true).unwrap();
        assert!(!entries.iter().any(|e| e.ends_with(".zip")));
    }

    #[test]
    fn test_verify_artifacts() {
        let entries = vec![
            "receipt_1.pdf".to_string(),
            "robots/robot_1.png".to_string(),
            "receipt_2.pdf".to_string(),
        ];

        assert!(verify_artifacts(&entries, ["1"]).is_ok());

        let report = ArchiveReport::from_entries(&entries);
        assert_eq!(report.missing_for(["1", "2"]), vec!["robots/robot_2.png"]);
        assert!(verify_artifacts(&entries, ["1", "2"]).is_err());
    }
}
