//! 输入来源解析 - 业务能力层
//!
//! 只负责检查输入并列出待上传的 PDF，不接触浏览器

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::models::SourceSpec;

/// 文件名是否以 `.pdf` 结尾（不区分大小写）
pub fn has_pdf_suffix(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().ends_with(".pdf"))
        .unwrap_or(false)
}

/// 输入来源解析器
///
/// 职责：
/// - 检查 `SourceSpec` 是否可用
/// - 列出待上传的文件路径
/// - 除日志外没有副作用，所有失败都通过返回值表达
#[derive(Debug, Clone)]
pub struct SourceResolver {
    spec: SourceSpec,
}

impl SourceResolver {
    pub fn new(spec: SourceSpec) -> Self {
        Self { spec }
    }

    /// 检查输入来源
    ///
    /// # 返回
    /// 文件与目录恰好指定其一、且能找到至少一个 PDF 时返回 true
    pub fn validate(&self) -> bool {
        match (self.spec.file(), self.spec.dir()) {
            (Some(_), Some(_)) => {
                error!("同时指定了文件和目录，请只选择一个来源");
                false
            }
            (None, None) => {
                error!("未提供输入来源，请指定文件或目录");
                false
            }
            (Some(file), None) => check_file(file),
            (None, Some(dir)) => match scan_dir(dir) {
                Some(files) if !files.is_empty() => {
                    info!("在目录 {} 中找到 {} 个 PDF 文件", dir.display(), files.len());
                    true
                }
                Some(_) => {
                    error!("目录中没有 PDF 文件: {}", dir.display());
                    false
                }
                None => false,
            },
        }
    }

    /// 列出待上传的文件
    ///
    /// 单个文件时只返回该文件；目录时按文件系统的遍历顺序返回所有 PDF
    pub fn list_files(&self) -> Vec<PathBuf> {
        if let Some(file) = self.spec.file() {
            return vec![file.to_path_buf()];
        }
        match self.spec.dir() {
            Some(dir) => scan_dir(dir).unwrap_or_default(),
            None => {
                warn!("未指定目录");
                Vec::new()
            }
        }
    }
}

fn check_file(file: &Path) -> bool {
    if !file.is_file() {
        error!("文件不存在: {}", file.display());
        return false;
    }
    if !has_pdf_suffix(file) {
        error!("文件不是 PDF: {}", file.display());
        return false;
    }
    info!("PDF 文件存在: {}", file.display());
    true
}

/// 列出目录中的 PDF；目录不存在或无法读取时返回 None
fn scan_dir(dir: &Path) -> Option<Vec<PathBuf>> {
    if !dir.is_dir() {
        error!("目录不存在: {}", dir.display());
        return None;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("无法读取目录 {}: {}", dir.display(), e);
            return None;
        }
    };

    let files = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| has_pdf_suffix(path))
        .collect();
    Some(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// 收集日志输出
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }

    #[test]
    fn test_both_sources_rejected() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "a.pdf");
        let resolver = SourceResolver::new(SourceSpec::new(Some(file), Some(dir.path().into())));

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let valid = tracing::subscriber::with_default(subscriber, || resolver.validate());

        assert!(!valid);
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("ERROR"), "应该按错误级别记录: {}", logs);
        assert!(!logs.contains("WARN"));
    }

    #[test]
    fn test_no_source_rejected() {
        let resolver = SourceResolver::new(SourceSpec::default());
        assert!(!resolver.validate());
        assert!(resolver.list_files().is_empty());
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = TempDir::new().unwrap();
        let resolver = SourceResolver::new(SourceSpec::from_file(dir.path().join("nope.pdf")));
        assert!(!resolver.validate());
    }

    #[test]
    fn test_wrong_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "notes.txt");
        assert!(!SourceResolver::new(SourceSpec::from_file(file)).validate());
    }

    #[test]
    fn test_uppercase_suffix_accepted() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "SCAN.PDF");
        let resolver = SourceResolver::new(SourceSpec::from_file(file.clone()));
        assert!(resolver.validate());
        assert_eq!(resolver.list_files(), vec![file]);
    }

    #[test]
    fn test_single_file_lists_itself() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "a.pdf");
        let resolver = SourceResolver::new(SourceSpec::from_file(file.clone()));
        assert!(resolver.validate());
        assert_eq!(resolver.list_files(), vec![file]);
    }

    #[test]
    fn test_missing_dir_rejected() {
        let dir = TempDir::new().unwrap();
        let resolver = SourceResolver::new(SourceSpec::from_dir(dir.path().join("missing")));
        assert!(!resolver.validate());
        assert!(resolver.list_files().is_empty());
    }

    #[test]
    fn test_dir_without_pdf_rejected() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "notes.txt");
        touch(&dir, "pdf");
        let resolver = SourceResolver::new(SourceSpec::from_dir(dir.path()));
        assert!(!resolver.validate());
    }

    #[test]
    fn test_dir_lists_only_pdfs() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "x.pdf");
        touch(&dir, "y.PDF");
        touch(&dir, "z.Pdf");
        touch(&dir, "notes.txt");
        touch(&dir, "image.png");

        let resolver = SourceResolver::new(SourceSpec::from_dir(dir.path()));
        assert!(resolver.validate());

        let mut names: Vec<String> = resolver
            .list_files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["x.pdf", "y.PDF", "z.Pdf"]);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "x.pdf");
        let resolver = SourceResolver::new(SourceSpec::from_dir(dir.path()));
        let first = resolver.validate();
        assert_eq!(first, resolver.validate());
        assert_eq!(first, resolver.validate());
        assert_eq!(resolver.list_files().len(), 1);
    }
}
