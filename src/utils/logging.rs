//! 日志工具模块
//!
//! 全进程唯一的日志初始化入口，以及启动、结束时的日志输出

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{BatchReport, SourceSpec};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 日志文件句柄
///
/// 在进程退出前 drop，确保日志落盘
#[derive(Debug)]
pub struct LogGuard {
    file: Arc<File>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        let _ = (&*self.file).flush();
        let _ = self.file.sync_all();
    }
}

/// 多个 writer 共享同一个文件句柄
#[derive(Clone)]
struct SharedFile(Arc<File>);

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = SharedFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// 初始化日志：控制台 + 追加写入的日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `verbose`: 是否输出调试日志（`RUST_LOG` 优先）
pub fn init(log_file_path: &Path, verbose: bool) -> Result<LogGuard> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path.display()))?;
    let file = Arc::new(file);

    write_log_header(&file)?;

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,persian_ocr={}", default_level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
                .with_target(false)
                .with_ansi(false)
                .with_writer(SharedFile(file.clone())),
        )
        .try_init()
        .context("日志系统初始化失败")?;

    Ok(LogGuard { file })
}

/// 写入本次运行的分隔标题
fn write_log_header(file: &File) -> Result<()> {
    let log_header = format!(
        "{}\n运行日志 - {}\n{}\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    let mut writer = file;
    writer.write_all(log_header.as_bytes())?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, source: &SourceSpec) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - PDF 上传转换模式");
    info!("🌐 浏览器: {}", config.session.browser);
    info!(
        "👻 无头模式: {}",
        if config.session.headless { "ON" } else { "OFF" }
    );
    info!("⏱️ 超时时间: {} 秒", config.session.timeout_secs);
    if let Some(file) = source.file() {
        info!("📄 待上传文件: {}", file.display());
    }
    if let Some(dir) = source.dir() {
        info!("📁 待扫描目录: {}", dir.display());
    }
    info!("📥 下载目录: {}", config.downloads_dir.display());
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(report: &BatchReport, log_file_path: &Path) {
    let names = report.downloaded_names();

    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded(), report.total());
    info!("❌ 放弃: {}", report.abandoned());
    if names.is_empty() {
        warn!("⚠️ 没有文件被下载");
    } else {
        info!("以下文件已成功下载: {}", names.join(", "));
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_log_header_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.log");
        std::fs::write(&path, "旧内容\n").unwrap();

        let file = OpenOptions::new().append(true).open(&path).unwrap();
        write_log_header(&file).unwrap();

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.starts_with("旧内容\n"));
        assert!(content.contains("运行日志 - "));
    }

    #[test]
    fn test_shared_file_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.log");
        let file = Arc::new(File::create(&path).unwrap());

        let make = SharedFile(file.clone());
        make.make_writer().write_all(b"a").unwrap();
        make.make_writer().write_all(b"b").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab");
    }
}
