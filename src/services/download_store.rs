//! 下载目录 - 业务能力层
//!
//! 负责确认浏览器下载的压缩包，并把它重命名为原文件名

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::utils::wait::poll_until;

/// 浏览器下载过程中使用的临时文件后缀
const PARTIAL_SUFFIXES: &[&str] = &[".crdownload", ".part", ".tmp"];

/// 下载前目录中已有的文件
#[derive(Debug, Clone, Default)]
pub struct DownloadSnapshot {
    names: HashSet<OsString>,
}

/// 下载目录
///
/// 一个批次共用一个实例，记录本批次已经产生的结果文件名
#[derive(Debug, Clone)]
pub struct DownloadStore {
    dir: PathBuf,
    claimed: HashSet<OsString>,
}

impl DownloadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            claimed: HashSet::new(),
        }
    }

    /// 确保下载目录存在
    pub fn prepare(&self) -> AppResult<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::file_write_failed(&self.dir, e))?;
        debug!("下载目录: {}", self.dir.display());
        Ok(())
    }

    /// 记录当前目录内容，用于区分新下载的文件
    pub fn snapshot(&self) -> AppResult<DownloadSnapshot> {
        let names = self
            .entries()?
            .into_iter()
            .filter_map(|(path, _)| path.file_name().map(|n| n.to_os_string()))
            .collect();
        Ok(DownloadSnapshot { names })
    }

    /// 等待指定名称的压缩包下载完成
    ///
    /// 浏览器遇到同名文件时会生成 `name (1).zip` 这样的名字，也视为该压缩包。
    ///
    /// # 返回
    /// 返回快照之后新出现的、最新的那个文件；超时返回 `AppError::Timeout`
    pub async fn wait_for_archive(
        &self,
        archive_name: &str,
        before: &DownloadSnapshot,
        timeout: Duration,
    ) -> AppResult<PathBuf> {
        let what = format!("等待下载文件: {}", archive_name);
        let path = poll_until(&what, timeout, move || async move {
            let found = self
                .completed_files()?
                .into_iter()
                .filter(|(path, _)| {
                    path.file_name()
                        .map(|n| !before.names.contains(n) && is_archive_variant(path, archive_name))
                        .unwrap_or(false)
                })
                .max_by_key(|(_, modified)| *modified)
                .map(|(path, _)| path);
            Ok(found)
        })
        .await?;

        info!("✓ 已下载: {}", path.display());
        Ok(path)
    }

    /// 等待快照之后最新完成的下载文件，不检查文件名
    pub async fn latest_download(
        &self,
        before: &DownloadSnapshot,
        timeout: Duration,
    ) -> AppResult<PathBuf> {
        let path = poll_until("等待最新下载文件", timeout, move || async move {
            Ok(self
                .completed_files()?
                .into_iter()
                .filter(|(path, _)| {
                    path.file_name()
                        .map(|n| !before.names.contains(n))
                        .unwrap_or(false)
                })
                .max_by_key(|(_, modified)| *modified)
                .map(|(path, _)| path))
        })
        .await?;

        info!("✓ 已下载: {}", path.display());
        Ok(path)
    }

    /// 把下载文件重命名为 `<原文件名><下载文件扩展名>`
    ///
    /// 之前运行留下的同名文件会被覆盖；本批次已经产生过的名字不会，
    /// 改用 `<原文件名> (N)<扩展名>`
    pub fn rename_to_source(&mut self, downloaded: &Path, source: &Path) -> AppResult<PathBuf> {
        let name = self.unclaimed_name(renamed_file_name(downloaded, source), downloaded);
        let target = self.dir.join(&name);
        self.claimed.insert(name);
        if target == downloaded {
            return Ok(target);
        }
        if target.exists() {
            debug!("覆盖已有文件: {}", target.display());
            std::fs::remove_file(&target).map_err(|e| AppError::file_write_failed(&target, e))?;
        }
        std::fs::rename(downloaded, &target)
            .map_err(|e| AppError::file_write_failed(downloaded, e))?;
        info!(
            "✓ 已重命名: {} → {}",
            downloaded.display(),
            target.display()
        );
        Ok(target)
    }

    /// 本批次内不重复的文件名
    fn unclaimed_name(&self, name: OsString, downloaded: &Path) -> OsString {
        if !self.claimed.contains(&name) {
            return name;
        }

        let base = Path::new(&name);
        let stem = base.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
        let ext = base.extension().map(|e| e.to_os_string());

        let mut n = 1;
        loop {
            let candidate = numbered_file_name(&stem, n, ext.as_deref());
            let path = self.dir.join(&candidate);
            if !self.claimed.contains(&candidate) && (path == downloaded || !path.exists()) {
                warn!(
                    "⚠️ 本批次已有结果文件 {}，改名为 {}",
                    name.to_string_lossy(),
                    candidate.to_string_lossy()
                );
                return candidate;
            }
            n += 1;
        }
    }

    fn entries(&self) -> AppResult<Vec<(PathBuf, SystemTime)>> {
        let read_dir =
            std::fs::read_dir(&self.dir).map_err(|e| AppError::file_read_failed(&self.dir, e))?;

        let mut entries = Vec::new();
        for entry in read_dir.filter_map(|e| e.ok()) {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((entry.path(), modified));
        }
        Ok(entries)
    }

    fn completed_files(&self) -> AppResult<Vec<(PathBuf, SystemTime)>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(path, _)| !is_partial(path))
            .collect())
    }
}

/// 重命名后的文件名：原文件的主名 + 下载文件的扩展名
pub fn renamed_file_name(downloaded: &Path, source: &Path) -> OsString {
    let mut name = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    if let Some(ext) = downloaded.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

/// 浏览器风格的带序号文件名：`stem (N).ext`
fn numbered_file_name(stem: &OsStr, n: usize, ext: Option<&OsStr>) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!(" ({})", n));
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

fn is_partial(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// `path` 是否为 `archive_name` 或浏览器生成的 `stem (N).ext` 形式
fn is_archive_variant(path: &Path, archive_name: &str) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    if name == archive_name {
        return true;
    }

    let archive = Path::new(archive_name);
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let ext = archive
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    name.strip_prefix(&*stem)
        .and_then(|rest| rest.strip_suffix(ext.as_str()))
        .map(|middle| {
            let middle = middle.trim_start();
            middle.len() > 2
                && middle.starts_with('(')
                && middle.ends_with(')')
                && middle[1..middle.len() - 1].chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false)
}
