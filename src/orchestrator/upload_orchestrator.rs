//! 批量上传编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **输入检查**：来源不合法时直接返回空结果，不打开浏览器
//! 2. **顺序处理**：一个文件处理完才开始下一个，没有并发
//! 3. **失败隔离**：单个文件超时只放弃该文件
//! 4. **资源管理**：持有浏览器驱动，运行结束时关闭
//!
//! ## 设计特点
//!
//! - 通过组合持有 `BrowserDriver`，测试时可以替换成假驱动
//! - 向下委托 `UploadFlow` 处理单个文件

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::BrowserDriver;
use crate::models::BatchReport;
use crate::services::{DownloadStore, SourceResolver};
use crate::workflow::{UploadCtx, UploadFlow};

/// 批量上传编排器
pub struct UploadOrchestrator<D: BrowserDriver> {
    resolver: SourceResolver,
    driver: D,
    flow: UploadFlow,
    downloads_dir: PathBuf,
}

impl<D: BrowserDriver> UploadOrchestrator<D> {
    pub fn new(resolver: SourceResolver, driver: D, config: &Config) -> Self {
        Self {
            resolver,
            driver,
            flow: UploadFlow::new(config),
            downloads_dir: config.downloads_dir.clone(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// 运行并返回成功下载的文件名
    pub async fn run(&mut self) -> AppResult<Vec<String>> {
        Ok(self.run_report().await?.downloaded_names())
    }

    /// 运行并返回每个文件的处理结果
    pub async fn run_report(&mut self) -> AppResult<BatchReport> {
        if !self.resolver.validate() {
            error!("文件或目录无效，已取消上传");
            return Ok(BatchReport::default());
        }

        let files = self.resolver.list_files();
        info!("📋 共 {} 个文件待处理", files.len());

        let result = self.process_all(files).await;

        // 无论成功与否都释放浏览器
        if let Err(e) = self.driver.close().await {
            warn!("关闭浏览器失败: {}", e);
        }

        result
    }

    async fn process_all(&mut self, files: Vec<PathBuf>) -> AppResult<BatchReport> {
        self.driver.set_downloads_path(&self.downloads_dir).await?;
        let mut store = DownloadStore::new(self.driver.downloads_path());
        store.prepare()?;

        let total = files.len();
        let mut report = BatchReport::default();

        for (index, path) in files.into_iter().enumerate() {
            let ctx = UploadCtx::new(path, index + 1, total);
            log_file_start(&ctx);

            let outcome = self.flow.run(&mut self.driver, &mut store, &ctx).await?;
            report.push(outcome);
        }

        info!(
            "✓ 处理结束: 成功 {}/{}",
            report.succeeded(),
            report.total()
        );
        Ok(report)
    }
}

fn log_file_start(ctx: &UploadCtx) {
    info!("\n{} {}", ctx, "─".repeat(30));
    info!("{} 开始处理: {}", ctx, ctx.path.display());
}
