//! 文件处理上下文
//!
//! 封装"我正在处理第几个文件、是哪个文件"这一信息

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// 文件处理上下文
#[derive(Debug, Clone)]
pub struct UploadCtx {
    /// 待上传文件
    pub path: PathBuf,

    /// 文件序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本次运行的文件总数
    pub total: usize,
}

impl UploadCtx {
    pub fn new(path: PathBuf, index: usize, total: usize) -> Self {
        Self { path, index, total }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 日志中显示的文件名
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl Display for UploadCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文件 {}/{} {}]", self.index, self.total, self.file_name())
    }
}
