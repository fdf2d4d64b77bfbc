use std::path::{Path, PathBuf};

/// 输入来源
///
/// 由命令行参数构造一次，之后不再修改。
/// 解析时要求 `file` 与 `dir` 恰好设置其一。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSpec {
    /// 单个 PDF 文件
    pub file: Option<PathBuf>,
    /// 包含 PDF 的目录
    pub dir: Option<PathBuf>,
}

impl SourceSpec {
    pub fn new(file: Option<PathBuf>, dir: Option<PathBuf>) -> Self {
        Self { file, dir }
    }

    pub fn from_file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            dir: None,
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            file: None,
            dir: Some(dir.into()),
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}
